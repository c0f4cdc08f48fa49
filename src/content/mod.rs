//! Response content subsystem.
//!
//! # Data Flow
//! ```text
//! literal text / bytes ──────────────┐
//!                                    ├─→ ContentSource → materialize() → Bytes (shared, immutable)
//! file / one-shot stream (lazy) ─────┘
//! ```

pub mod source;

pub use source::{ContentSource, ContentStream, SourceState, READ_CHUNK_SIZE};
