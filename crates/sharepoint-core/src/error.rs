//! Error taxonomy shared by every layer of the Graph client.

use bytes::Bytes;
use reqwest::StatusCode;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the SharePoint client.
///
/// The facade wraps every upstream failure into [`Error::Operation`] with a
/// human-readable context prefix. [`Error::Decode`] and
/// [`Error::Validation`] are never wrapped so callers can react to them.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or missing configuration (for example a site URL without
    /// `/sites/`).
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credential could produce a bearer token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A required upstream resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An upstream call failed.
    #[error("{message}")]
    Operation {
        message: String,
        /// HTTP status of the failing response, if the server answered.
        status: Option<StatusCode>,
    },

    /// Downloaded content is not valid text in the requested encoding.
    ///
    /// The raw content is kept so a caller can fall back to a binary
    /// rendering without downloading the file again.
    #[error("content ({} bytes) is not valid {encoding}", content.len())]
    Decode { encoding: String, content: Bytes },

    /// Caller-supplied input was rejected before any network call.
    #[error("invalid arguments: {0}")]
    Validation(String),
}

impl Error {
    /// Builds an [`Error::Operation`] from a failed upstream response.
    pub(crate) fn upstream(status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("Microsoft Graph request failed ({status})")
        } else {
            format!("Microsoft Graph request failed ({status}): {body}")
        };
        Self::Operation {
            message,
            status: Some(status),
        }
    }

    /// Wraps this error as an [`Error::Operation`] prefixed with `context`.
    ///
    /// The upstream status is preserved. Decode and validation errors pass
    /// through untouched.
    #[must_use]
    pub fn wrap(self, context: &str) -> Self {
        match self {
            Self::Decode { .. } | Self::Validation(_) => self,
            Self::Operation { message, status } => Self::Operation {
                message: format!("{context}: {message}"),
                status,
            },
            other => Self::Operation {
                message: format!("{context}: {other}"),
                status: None,
            },
        }
    }

    /// Returns the upstream HTTP status, if the error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Operation { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` for text decoding failures.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Operation {
            message: format!("request to Microsoft Graph failed: {err}"),
            status: err.status(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Operation {
            message: format!("unexpected response from Microsoft Graph: {err}"),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_includes_status_and_body() {
        let err = Error::upstream(StatusCode::CONFLICT, r#"{"error":{"code":"nameAlreadyExists"}}"#);
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("nameAlreadyExists"));
    }

    #[test]
    fn test_upstream_error_with_empty_body_omits_separator() {
        let err = Error::upstream(StatusCode::NOT_FOUND, "  ");
        assert_eq!(
            err.to_string(),
            "Microsoft Graph request failed (404 Not Found)"
        );
    }

    #[test]
    fn test_wrap_prefixes_context_and_keeps_status() {
        let err = Error::upstream(StatusCode::FORBIDDEN, "denied").wrap("Failed to list files");
        assert!(err.to_string().starts_with("Failed to list files: "));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_wrap_converts_config_error_to_operation() {
        let err = Error::Config("bad url".to_string()).wrap("Failed to get site info");
        assert!(matches!(err, Error::Operation { status: None, .. }));
        assert_eq!(
            err.to_string(),
            "Failed to get site info: configuration error: bad url"
        );
    }

    #[test]
    fn test_wrap_leaves_decode_and_validation_untouched() {
        let decode = Error::Decode {
            encoding: "utf-8".to_string(),
            content: Bytes::from_static(&[0xff]),
        }
        .wrap("Failed to read file");
        assert!(decode.is_decode());

        let validation = Error::Validation("missing".to_string()).wrap("ctx");
        assert_eq!(validation.to_string(), "invalid arguments: missing");
    }

    #[test]
    fn test_decode_error_reports_length() {
        let err = Error::Decode {
            encoding: "utf-8".to_string(),
            content: Bytes::from_static(b"\xff\xfe\x00"),
        };
        assert_eq!(err.to_string(), "content (3 bytes) is not valid utf-8");
    }
}
