//! Error types for the rodcall protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes returned in error responses.
///
/// These codes are stable and used for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed JSON, missing required fields, or invalid field values.
    InvalidRequest,
    /// A call chain or session signature did not verify.
    AuthenticationFailed,
    /// The session payload verified but could not be decoded.
    InvalidSession,
    /// The root object factory could not produce a root object.
    RootUnavailable,
    /// Replaying the call chain reached an absent object.
    BrokenChain,
    /// The resolved object has no method matching the descriptor.
    NoSuchMethod,
    /// An object was produced whose type is not registered as remote-capable.
    NotRemotable,
    /// Argument count or types do not match the method descriptor.
    InvalidArguments,
    /// The invoked application method returned an error.
    MethodFailed,
    /// A cacheable method failed while building an object handle.
    CachedMethodFailed,
    /// The dispatcher is closed and accepts no new calls.
    ShuttingDown,
    /// Unexpected server-side failure.
    Internal,
}

impl ErrorCode {
    /// Returns the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::InvalidSession => "INVALID_SESSION",
            Self::RootUnavailable => "ROOT_UNAVAILABLE",
            Self::BrokenChain => "BROKEN_CHAIN",
            Self::NoSuchMethod => "NO_SUCH_METHOD",
            Self::NotRemotable => "NOT_REMOTABLE",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::MethodFailed => "METHOD_FAILED",
            Self::CachedMethodFailed => "CACHED_METHOD_FAILED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether retrying the same request could succeed.
    ///
    /// Everything except a closing dispatcher is all-or-nothing for a given
    /// handle and credential.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ShuttingDown)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code from the registry.
    pub code: ErrorCode,
    /// Human-readable, single-line error message.
    pub message: String,
    /// Optional machine-readable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Create a new RPC error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new RPC error with additional data.
    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create an INVALID_REQUEST error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Create an AUTHENTICATION_FAILED error naming what failed to verify.
    pub fn authentication_failed(what: &str) -> Self {
        Self::with_data(
            ErrorCode::AuthenticationFailed,
            format!("invalid {} signature", what),
            serde_json::json!({ "subject": what }),
        )
    }

    /// Create a NO_SUCH_METHOD error.
    pub fn no_such_method(type_name: &str, method: &str) -> Self {
        Self::with_data(
            ErrorCode::NoSuchMethod,
            format!("type '{}' has no method '{}'", type_name, method),
            serde_json::json!({ "type": type_name, "method": method }),
        )
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}
