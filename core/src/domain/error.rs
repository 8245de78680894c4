//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope. Domain-rule rejections
//! (a double like, an unlike without a like) are ordinary error payloads with
//! their own codes, never process-level failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The caller does not own the resource the mutation targets.
    Unauthorized,
    /// The requested aggregate or nested entry does not exist.
    NotFound,
    /// A uniqueness invariant was violated (duplicate email, second profile).
    DuplicateKey,
    /// The caller has already liked this post.
    AlreadyLiked,
    /// The caller has not liked this post.
    NotLiked,
    /// The caller has no comment on this post.
    NoCommentByUser,
    /// The optimistic-concurrency retry budget was exhausted; safe to retry.
    Contention,
    /// The store is unreachable; safe to retry.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use devlink_core::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("no such post");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorValidationError {
    EmptyMessage,
}

impl std::fmt::Display for ErrorValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
        }
    }
}

impl std::error::Error for ErrorValidationError {}

impl Error {
    /// Create a new error, panicking if validation fails.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use devlink_core::domain::{Error, ErrorCode};
    /// use serde_json::json;
    ///
    /// let err = Error::new(ErrorCode::AlreadyLiked, "post already liked")
    ///     .with_details(json!({ "likers": ["a", "b"] }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateKey`].
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateKey, message)
    }

    /// Convenience constructor for [`ErrorCode::Contention`].
    pub fn contention(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Contention, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_messages(#[case] message: &str) {
        let err = Error::try_new(ErrorCode::NotFound, message).expect_err("blank rejected");
        assert_eq!(err, ErrorValidationError::EmptyMessage);
    }

    #[rstest]
    fn carries_code_message_and_details() {
        let err = Error::new(ErrorCode::AlreadyLiked, "post already liked")
            .with_details(json!({ "likers": ["u1"] }));

        assert_eq!(err.code(), ErrorCode::AlreadyLiked);
        assert_eq!(err.message(), "post already liked");
        assert_eq!(err.details(), Some(&json!({ "likers": ["u1"] })));
    }

    #[rstest]
    fn serde_round_trip_preserves_payload() {
        let err = Error::contention("retry budget exhausted")
            .with_details(json!({ "attempts": 5 }));

        let encoded = serde_json::to_string(&err).expect("serialise");
        let decoded: Error = serde_json::from_str(&encoded).expect("deserialise");
        assert_eq!(decoded, err);
    }

    #[rstest]
    fn codes_serialise_as_snake_case() {
        let encoded =
            serde_json::to_value(ErrorCode::NoCommentByUser).expect("serialise code");
        assert_eq!(encoded, json!("no_comment_by_user"));
    }

    #[rstest]
    fn deserialisation_rejects_blank_messages() {
        let result: Result<Error, _> =
            serde_json::from_value(json!({ "code": "not_found", "message": "  " }));
        assert!(result.is_err());
    }
}
