//! Lazily materialized response content.
//!
//! # Responsibilities
//! - Hold either a literal payload or a one-shot readable stream
//! - Drain the stream into memory at most once, even under concurrent first access
//! - Hand every caller the same immutable buffer afterwards
//!
//! # State Transitions
//! ```text
//! Unmaterialized → Materializing → Materialized
//! Unmaterialized → Materializing → Failed
//! ```
//!
//! # Design Decisions
//! - `OnceLock` provides the check / lock / re-check sequence; callers arriving
//!   during a drain block until the buffer is published
//! - The stream is moved out of its slot before draining and dropped afterwards,
//!   so it can never be read twice
//! - A failed drain is terminal: the fault is logged once and no bytes are ever published

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::io::{self, Read};
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::observability::metrics;

/// Size of each read when draining a stream.
pub const READ_CHUNK_SIZE: usize = 10 * 1024;

/// A one-shot readable byte source.
pub type ContentStream = Box<dyn Read + Send>;

/// Observable lifecycle of a [`ContentSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Stream not drained yet.
    Unmaterialized,
    /// Bytes are published.
    Materialized,
    /// Draining failed; no bytes will ever be published.
    Failed,
}

/// Byte content backing a single mock response.
pub struct ContentSource {
    /// Published exactly once. An inner `None` marks a failed drain.
    realized: OnceLock<Option<Bytes>>,
    /// Stream waiting to be drained. Emptied by the first materialization.
    pending: Mutex<Option<ContentStream>>,
}

impl ContentSource {
    /// Create a source from an in-memory payload. It starts out materialized.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            realized: OnceLock::from(Some(data.into())),
            pending: Mutex::new(None),
        }
    }

    /// Create a source from literal text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into())
    }

    /// Create a source from a stream that is read on first use.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            realized: OnceLock::new(),
            pending: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Return the realized content, draining the stream on first call.
    ///
    /// Returns `None` when draining failed. The failure is logged when it
    /// happens and the stream is never read again.
    pub fn materialize(&self) -> Option<Bytes> {
        self.realized.get_or_init(|| self.drain_pending()).clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SourceState {
        match self.realized.get() {
            None => SourceState::Unmaterialized,
            Some(Some(_)) => SourceState::Materialized,
            Some(None) => SourceState::Failed,
        }
    }

    fn drain_pending(&self) -> Option<Bytes> {
        let stream = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        // Only reachable if an earlier drain panicked after taking the stream.
        let Some(mut stream) = stream else {
            tracing::error!("Response stream already consumed without producing content");
            metrics::record_materialization("failed");
            return None;
        };

        match drain(&mut stream) {
            Ok(data) => {
                tracing::debug!(bytes = data.len(), "Response stream materialized");
                metrics::record_materialization("ok");
                Some(data)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error reading response stream");
                metrics::record_materialization("failed");
                None
            }
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSource")
            .field("state", &self.state())
            .field("len", &self.realized.get().and_then(|d| d.as_ref().map(Bytes::len)))
            .finish()
    }
}

/// Read `reader` to end-of-stream in [`READ_CHUNK_SIZE`] chunks.
pub(crate) fn drain<R: Read + ?Sized>(reader: &mut R) -> io::Result<Bytes> {
    let mut output = BytesMut::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(output.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    /// Reader that counts calls to `read` and can be made slow.
    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        reads: Arc<AtomicUsize>,
        pause: Duration,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.pause);
            self.inner.read(buf)
        }
    }

    /// Reader that yields some bytes, then fails.
    struct FailingReader {
        served: bool,
        reads: Arc<AtomicUsize>,
        pause: Duration,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.pause);
            if self.served {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream reset"));
            }
            self.served = true;
            buf[..3].copy_from_slice(b"abc");
            Ok(3)
        }
    }

    #[test]
    fn test_literal_source_is_materialized_up_front() {
        let source = ContentSource::from_text("hello");
        assert_eq!(source.state(), SourceState::Materialized);
        assert_eq!(source.materialize().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(source.materialize().unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_stream_source_drains_on_first_use() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = ContentSource::from_reader(CountingReader {
            inner: Cursor::new(b"streamed".to_vec()),
            reads: reads.clone(),
            pause: Duration::ZERO,
        });

        assert_eq!(source.state(), SourceState::Unmaterialized);
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        assert_eq!(source.materialize().unwrap(), Bytes::from_static(b"streamed"));
        assert_eq!(source.state(), SourceState::Materialized);

        let after_first = reads.load(Ordering::SeqCst);
        assert_eq!(source.materialize().unwrap(), Bytes::from_static(b"streamed"));
        assert_eq!(reads.load(Ordering::SeqCst), after_first);
    }

    #[test]
    fn test_large_stream_spans_many_chunks() {
        let payload: Vec<u8> = (0..(READ_CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let source = ContentSource::from_reader(Cursor::new(payload.clone()));
        assert_eq!(source.materialize().unwrap().as_ref(), payload.as_slice());
    }

    #[test]
    fn test_concurrent_materialization_drains_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(ContentSource::from_reader(CountingReader {
            inner: Cursor::new(b"shared body".to_vec()),
            reads: reads.clone(),
            pause: Duration::from_millis(20),
        }));

        let callers = 8;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let source = source.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    source.materialize()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results {
            assert_eq!(result.as_deref(), Some(&b"shared body"[..]));
        }
        // One read returning the data, one returning EOF.
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_drain_is_terminal() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = ContentSource::from_reader(FailingReader {
            served: false,
            reads: reads.clone(),
            pause: Duration::ZERO,
        });

        assert!(source.materialize().is_none());
        assert_eq!(source.state(), SourceState::Failed);
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        assert!(source.materialize().is_none());
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_failed_drain_is_attempted_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(ContentSource::from_reader(FailingReader {
            served: false,
            reads: reads.clone(),
            pause: Duration::from_millis(20),
        }));

        let callers = 8;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let source = source.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    source.materialize()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_none());
        }
        // Waiters observe the failure instead of retrying the stream.
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(source.state(), SourceState::Failed);
    }

    #[test]
    fn test_empty_stream_materializes_empty_buffer() {
        let source = ContentSource::from_reader(io::empty());
        assert_eq!(source.materialize(), Some(Bytes::new()));
        assert_eq!(source.state(), SourceState::Materialized);
    }
}
