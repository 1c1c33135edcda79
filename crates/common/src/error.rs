//! Unified error type for earthguard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors caused by the caller's request rather than by us.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

/// First `max_chars` characters of an upstream body, for error messages.
///
/// Cuts on a character boundary, so multi-byte text never splits.
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_input_is_a_caller_error() {
        assert!(Error::InvalidInput("lat".into()).is_invalid_input());
        for err in [
            Error::Http("timeout".into()),
            Error::Upstream("503".into()),
            Error::Csv("bad row".into()),
            Error::Config("ttl".into()),
        ] {
            assert!(!err.is_invalid_input(), "{err}");
        }
    }

    #[test]
    fn test_excerpt_short_body_is_whole() {
        assert_eq!(body_excerpt("Bad key", 500), "Bad key");
    }

    #[test]
    fn test_excerpt_multibyte_at_cut() {
        let body = format!("{}µg/m³ tail", "x".repeat(499));
        let excerpt = body_excerpt(&body, 500);
        assert_eq!(excerpt.chars().count(), 500);
        assert!(excerpt.ends_with('µ'));

        let body = format!("{}é rest", "x".repeat(199));
        assert!(body_excerpt(&body, 200).ends_with('é'));
    }
}
