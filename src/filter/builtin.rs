//! Filters available to configured responses.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::config::schema::FilterConfig;
use crate::content::source::drain;
use crate::content::ContentStream;
use crate::filter::{FilterError, ResponseFilter, SharedFilter};

/// Build a filter from its configuration.
pub fn build_filter(config: &FilterConfig) -> SharedFilter {
    match config {
        FilterConfig::Replace { from, to } => Arc::new(ReplaceFilter::new(from.clone(), to.clone())),
        FilterConfig::Uppercase => Arc::new(UppercaseFilter),
        FilterConfig::Timestamp { token } => Arc::new(TimestampFilter::new(token.clone())),
    }
}

/// Compile a single search pattern. `None` for an empty pattern.
fn compile(pattern: &[u8]) -> Option<AhoCorasick> {
    if pattern.is_empty() {
        return None;
    }
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostFirst)
        .build([pattern])
        .map_err(|e| tracing::warn!(error = %e, "Failed to compile filter pattern"))
        .ok()
}

/// Replaces every occurrence of a byte sequence.
#[derive(Debug, Clone)]
pub struct ReplaceFilter {
    matcher: Option<AhoCorasick>,
    to: Vec<u8>,
}

impl ReplaceFilter {
    pub fn new(from: impl Into<Vec<u8>>, to: impl Into<Vec<u8>>) -> Self {
        Self {
            matcher: compile(&from.into()),
            to: to.into(),
        }
    }
}

impl ResponseFilter for ReplaceFilter {
    fn filter(&self, mut input: ContentStream) -> Result<ContentStream, FilterError> {
        let Some(matcher) = &self.matcher else {
            return Err(FilterError::new("replace filter has an empty search pattern"));
        };
        let data = drain(&mut input)?;
        Ok(Box::new(Cursor::new(matcher.replace_all_bytes(&data, &[&self.to]))))
    }
}

/// ASCII upper-cases the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseFilter;

impl ResponseFilter for UppercaseFilter {
    fn filter(&self, mut input: ContentStream) -> Result<ContentStream, FilterError> {
        let data = drain(&mut input)?;
        Ok(Box::new(Cursor::new(data.to_ascii_uppercase())))
    }
}

/// Substitutes a token with the current Unix time in milliseconds.
///
/// Output differs between renders, so it must never be cached.
#[derive(Debug, Clone)]
pub struct TimestampFilter {
    matcher: Option<AhoCorasick>,
}

impl TimestampFilter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            matcher: compile(token.into().as_bytes()),
        }
    }
}

impl ResponseFilter for TimestampFilter {
    fn filter(&self, mut input: ContentStream) -> Result<ContentStream, FilterError> {
        let Some(matcher) = &self.matcher else {
            return Err(FilterError::new("timestamp filter has an empty token"));
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();
        let data = drain(&mut input)?;
        Ok(Box::new(Cursor::new(matcher.replace_all_bytes(&data, &[now.as_bytes()]))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn run(filter: &dyn ResponseFilter, input: &str) -> Result<String, FilterError> {
        let mut out = filter.filter(Box::new(Cursor::new(input.as_bytes().to_vec())))?;
        let mut s = String::new();
        out.read_to_string(&mut s).unwrap();
        Ok(s)
    }

    #[test]
    fn test_replace_filter() {
        let filter = ReplaceFilter::new("cat", "dog");
        assert_eq!(run(&filter, "cat catalog cat").unwrap(), "dog dogalog dog");
        assert_eq!(run(&filter, "no match").unwrap(), "no match");
        assert_eq!(run(&filter, "").unwrap(), "");
    }

    #[test]
    fn test_replace_filter_matches_are_non_overlapping() {
        let filter = ReplaceFilter::new("aa", "b");
        assert_eq!(run(&filter, "aaaaa").unwrap(), "bba");

        // A replacement containing the pattern is not rescanned.
        let filter = ReplaceFilter::new("x", "xx");
        assert_eq!(run(&filter, "x-x").unwrap(), "xx-xx");

        let filter = ReplaceFilter::new("ü", "u");
        assert_eq!(run(&filter, "grün über").unwrap(), "grun uber");
    }

    #[test]
    fn test_replace_filter_rejects_empty_pattern() {
        let filter = ReplaceFilter::new("", "x");
        let err = run(&filter, "abc").unwrap_err();
        assert!(err.message().contains("empty search pattern"));
    }

    #[test]
    fn test_uppercase_filter() {
        assert_eq!(run(&UppercaseFilter, "hello, World").unwrap(), "HELLO, WORLD");
    }

    #[test]
    fn test_timestamp_filter() {
        let filter = TimestampFilter::new("${timestamp}");
        let out = run(&filter, "at=${timestamp};").unwrap();
        let millis = out.trim_start_matches("at=").trim_end_matches(';');
        assert!(!millis.is_empty());
        assert!(millis.chars().all(|c| c.is_ascii_digit()));

        let err = run(&TimestampFilter::new(""), "x").unwrap_err();
        assert!(err.message().contains("empty token"));
    }

    #[test]
    fn test_build_filter_from_config() {
        let filter = build_filter(&FilterConfig::Replace {
            from: "a".into(),
            to: "b".into(),
        });
        assert_eq!(run(filter.as_ref(), "aaa").unwrap(), "bbb");

        let filter = build_filter(&FilterConfig::Uppercase);
        assert_eq!(run(filter.as_ref(), "x").unwrap(), "X");
    }
}
