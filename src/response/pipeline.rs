//! Response pipeline: identity, metadata and filtered content of one mock response.
//!
//! # Responsibilities
//! - Own the response's content source (1:1, never shared or replaced)
//! - Run realized content through the filter chain on every render
//! - Expose content type and advisory delay to the HTTP layer
//!
//! # Design Decisions
//! - Filters run front-to-back: filter 0 sees the base bytes, its output feeds filter 1
//! - Filtered output is never cached; each render starts again from the base bytes
//! - Faults propagate from `render`; only `render_text` turns them into content
//! - Setters take `&mut self`: once the pipeline is shared, metadata is frozen
//! - The pipeline never sleeps; `delay` is read by the HTTP handler

use bytes::Bytes;
use std::io::{Cursor, Read};
use std::time::Duration;

use crate::content::source::drain;
use crate::content::{ContentSource, ContentStream, SourceState};
use crate::filter::SharedFilter;
use crate::response::types::ResponseError;

/// Content type used when none is configured.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// One configured mock response.
#[derive(Debug)]
pub struct ResponsePipeline {
    id: String,
    content: ContentSource,
    content_type: String,
    delay_millis: u64,
    filters: Vec<SharedFilter>,
}

impl ResponsePipeline {
    /// Create a pipeline with no filters.
    pub fn new(id: impl Into<String>, content: ContentSource) -> Result<Self, ResponseError> {
        Self::with_filters(id, content, Vec::new())
    }

    /// Create a pipeline with an ordered filter chain.
    pub fn with_filters(
        id: impl Into<String>,
        content: ContentSource,
        filters: Vec<SharedFilter>,
    ) -> Result<Self, ResponseError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ResponseError::InvalidArgument(
                "Response must have an id value".to_string(),
            ));
        }
        Ok(Self {
            id,
            content,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            delay_millis: 0,
            filters,
        })
    }

    /// Start building a pipeline with the given id.
    pub fn builder(id: impl Into<String>) -> ResponseBuilder {
        ResponseBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Artificial delay in milliseconds.
    pub fn delay_millis(&self) -> u64 {
        self.delay_millis
    }

    pub fn set_delay_millis(&mut self, delay_millis: u64) {
        self.delay_millis = delay_millis;
    }

    /// Artificial delay as a `Duration`.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }

    pub fn filters(&self) -> &[SharedFilter] {
        &self.filters
    }

    /// Lifecycle state of the underlying content.
    pub fn content_state(&self) -> SourceState {
        self.content.state()
    }

    /// Produce the response bytes, optionally passed through the filter chain.
    ///
    /// Content that failed to materialize renders as an empty body.
    pub fn render(&self, apply_filters: bool) -> Result<Bytes, ResponseError> {
        let base = self.base_bytes();
        if !apply_filters || self.filters.is_empty() {
            return Ok(base);
        }

        let initial: ContentStream = Box::new(Cursor::new(base));
        let mut stream = self
            .filters
            .iter()
            .try_fold(initial, |stream, filter| filter.filter(stream))?;

        Ok(drain(&mut stream)?)
    }

    /// Produce the response as text.
    ///
    /// Never fails: a fault is logged and its message is returned in place of
    /// the content.
    pub fn render_text(&self, apply_filters: bool) -> String {
        match self.render(apply_filters) {
            Ok(data) => String::from_utf8_lossy(&data).into_owned(),
            Err(e) => {
                tracing::error!(response_id = %self.id, error = %e, "Error getting response data");
                e.to_string()
            }
        }
    }

    fn base_bytes(&self) -> Bytes {
        self.content.materialize().unwrap_or_else(|| {
            tracing::debug!(response_id = %self.id, "Content unavailable, rendering empty body");
            Bytes::new()
        })
    }
}

/// Builder for [`ResponsePipeline`].
#[derive(Debug)]
pub struct ResponseBuilder {
    id: String,
    content: Option<ContentSource>,
    content_type: Option<String>,
    delay_millis: u64,
    filters: Vec<SharedFilter>,
}

impl ResponseBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: None,
            content_type: None,
            delay_millis: 0,
            filters: Vec::new(),
        }
    }

    pub fn content(mut self, content: ContentSource) -> Self {
        self.content = Some(content);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.content(ContentSource::from_text(text))
    }

    pub fn bytes(self, data: impl Into<Bytes>) -> Self {
        self.content(ContentSource::from_bytes(data))
    }

    pub fn reader<R>(self, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        self.content(ContentSource::from_reader(reader))
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn delay_millis(mut self, delay_millis: u64) -> Self {
        self.delay_millis = delay_millis;
        self
    }

    /// Append a filter to the end of the chain.
    pub fn filter(mut self, filter: SharedFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = SharedFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn build(self) -> Result<ResponsePipeline, ResponseError> {
        let content = self.content.ok_or_else(|| {
            ResponseError::InvalidArgument("Response must have a content value".to_string())
        })?;
        let mut pipeline = ResponsePipeline::with_filters(self.id, content, self.filters)?;
        if let Some(content_type) = self.content_type {
            pipeline.set_content_type(content_type);
        }
        pipeline.set_delay_millis(self.delay_millis);
        Ok(pipeline)
    }
}
