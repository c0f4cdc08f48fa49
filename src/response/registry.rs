//! Lookup table of configured responses.
//!
//! # Design Decisions
//! - Built once per configuration, immutable afterwards (shared without locks)
//! - File-backed content is opened at build time but read on first request

use std::collections::HashMap;
use std::fs::File;
use std::sync::Arc;

use crate::config::schema::ResponseConfig;
use crate::content::ContentSource;
use crate::filter::build_filter;
use crate::response::pipeline::ResponsePipeline;
use crate::response::types::ResponseError;

/// All responses of one configuration, keyed by id.
#[derive(Debug, Default)]
pub struct ResponseRegistry {
    responses: HashMap<String, Arc<ResponsePipeline>>,
}

impl ResponseRegistry {
    /// Build a registry from response definitions.
    pub fn from_config(configs: &[ResponseConfig]) -> Result<Self, ResponseError> {
        let mut responses = HashMap::with_capacity(configs.len());
        for config in configs {
            let pipeline = build_pipeline(config)?;
            tracing::debug!(
                response_id = %pipeline.id(),
                content_type = %pipeline.content_type(),
                delay_ms = pipeline.delay_millis(),
                filters = pipeline.filters().len(),
                "Response loaded"
            );
            if responses
                .insert(pipeline.id().to_string(), Arc::new(pipeline))
                .is_some()
            {
                return Err(ResponseError::InvalidArgument(format!(
                    "duplicate response id '{}'",
                    config.id
                )));
            }
        }
        Ok(Self { responses })
    }

    /// Register a pipeline directly, replacing any previous one with the same id.
    pub fn insert(&mut self, pipeline: ResponsePipeline) -> Option<Arc<ResponsePipeline>> {
        self.responses
            .insert(pipeline.id().to_string(), Arc::new(pipeline))
    }

    pub fn get(&self, id: &str) -> Option<Arc<ResponsePipeline>> {
        self.responses.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Response ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.responses.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

fn build_pipeline(config: &ResponseConfig) -> Result<ResponsePipeline, ResponseError> {
    let content = match (&config.content, &config.file) {
        (Some(text), None) => ContentSource::from_text(text.clone()),
        (None, Some(path)) => {
            let file = File::open(path).map_err(|source| ResponseError::BodyFile {
                response: config.id.clone(),
                path: path.clone(),
                source,
            })?;
            ContentSource::from_reader(file)
        }
        _ => {
            return Err(ResponseError::InvalidArgument(format!(
                "response '{}' must set exactly one of `content` or `file`",
                config.id
            )))
        }
    };

    ResponsePipeline::builder(config.id.clone())
        .content(content)
        .content_type(config.content_type.clone())
        .delay_millis(config.delay_ms)
        .filters(config.filters.iter().map(build_filter))
        .build()
}
