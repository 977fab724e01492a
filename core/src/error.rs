//! Error types for collection and session operations.
//!
//! # Design
//! Every failure an operation can hit lands in one `ApiError`, delivered
//! through the same completion as a success. `Http` keeps the raw status and
//! body so an error hook or caller can inspect them; schema violations are
//! split out into `ValidationError` so they can be matched on precisely.

use thiserror::Error;

/// Errors returned by the `build_*` and `parse_*` methods and by every
/// asynchronous operation built from them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status in the 4xx/5xx range.
    #[error("HTTP {status} {}", reason_phrase(.status))]
    Http { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// A list response decoded to something other than an array.
    #[error(
        "the response body was expected to be a JSON array but was {found}; \
         install a decode hook on the collection to extract the list"
    )]
    ExpectedArray { found: &'static str },

    /// The payload does not fit the model's schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A PUT or DELETE target carries no primary key value.
    #[error("{model} has no primary key value to address the resource with")]
    MissingIdentity { model: &'static str },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// Status code of an HTTP error, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for malformed payloads, whether unparsable or wrongly shaped.
    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode(_) | ApiError::ExpectedArray { .. })
    }
}

/// A decoded payload violates the model's declared schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid field '{field}'")]
    UnknownField { model: &'static str, field: String },

    #[error("invalid value for {model}: {message}")]
    InvalidValue { model: &'static str, message: String },

    #[error("expected a JSON object for {model}, got {found}")]
    NotAnObject { model: &'static str, found: &'static str },
}

fn reason_phrase(status: &u16) -> &'static str {
    http::StatusCode::from_u16(*status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_reason_phrase() {
        let err = ApiError::Http {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let err = ApiError::Http {
            status: 599,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(599));
        assert!(err.to_string().starts_with("HTTP 599"));
    }

    #[test]
    fn unknown_field_message_names_the_field() {
        let err = ApiError::from(ValidationError::UnknownField {
            model: "User",
            field: "url".to_string(),
        });
        assert_eq!(err.to_string(), "invalid field 'url'");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn expected_array_counts_as_decode_error() {
        let err = ApiError::ExpectedArray { found: "an object" };
        assert!(err.is_decode());
        assert!(err.to_string().contains("decode hook"));
    }
}
