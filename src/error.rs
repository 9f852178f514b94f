//! Crate-level error type.
//!
//! Every fallible operation in the live view returns [`LiveViewError`]. The
//! connection loop never propagates these out of a running session: frame
//! errors are logged and the socket stays open, connection errors are logged
//! and retried after the reconnect delay.

use thiserror::Error;

/// Convenience alias for results using [`LiveViewError`].
pub type Result<T> = std::result::Result<T, LiveViewError>;

#[derive(Error, Debug)]
pub enum LiveViewError {
    /// The frame was not valid JSON, or a field had the wrong JSON type.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level field was absent from the message.
    #[error("message is missing required field '{0}'")]
    MissingField(&'static str),

    /// `imgs` did not have the shape the configured layout expects.
    #[error("image batch has unexpected shape: expected {expected}, {detail}")]
    Shape { expected: &'static str, detail: String },

    /// The message carried a `version` marker that disagrees with the layout.
    #[error("protocol version {found} does not match layout {layout}")]
    VersionMismatch { found: u64, layout: String },

    /// The page URL could not be turned into a WebSocket endpoint.
    #[error("invalid page URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    /// A toggle was requested for a panel that has never been created.
    #[error("no panel named '{0}'")]
    UnknownPanel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML config file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display_names_field() {
        let err = LiveViewError::MissingField("imgs");
        assert_eq!(err.to_string(), "message is missing required field 'imgs'");
    }

    #[test]
    fn test_version_mismatch_display_mentions_both_sides() {
        let err = LiveViewError::VersionMismatch {
            found: 1,
            layout: "v4".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains('1'), "version in display: {s}");
        assert!(s.contains("v4"), "layout in display: {s}");
    }

    #[test]
    fn test_json_error_converts_with_question_mark() {
        fn parse(s: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(s)?)
        }
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, LiveViewError::Json(_)));
    }

    #[test]
    fn test_live_view_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&LiveViewError::UnknownPanel("x".to_string()));
    }
}
