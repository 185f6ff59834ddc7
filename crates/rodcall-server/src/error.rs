//! Dispatcher, registry and application method errors.

use rodcall_protocol::{ErrorCode, RpcError, SessionDecodeError, SigningError, TypeName};
use thiserror::Error;

/// Error returned by application methods and root factories.
#[derive(Debug, Error)]
pub enum MethodError {
    /// An argument could not be decoded into the parameter type.
    #[error("argument {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },

    /// The method ran and failed.
    #[error("{0}")]
    Failed(String),
}

impl MethodError {
    /// Create a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<serde_json::Error> for MethodError {
    fn from(e: serde_json::Error) -> Self {
        Self::Failed(format!("failed to encode result: {}", e))
    }
}

/// Errors detected while building a [`RemoteRegistry`](crate::RemoteRegistry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("type '{0}' is registered twice")]
    DuplicateType(TypeName),

    #[error("method '{method}' is declared twice on type '{type_name}'")]
    DuplicateMethod { type_name: TypeName, method: String },

    #[error("cacheable method '{method}' on type '{type_name}' takes parameters")]
    CacheableWithParams { type_name: TypeName, method: String },

    #[error("method '{method}' is declared on '{owner}' but registered on '{type_name}'")]
    OwnerMismatch {
        type_name: TypeName,
        owner: TypeName,
        method: String,
    },
}

/// Per-request dispatch failure.
///
/// Every variant fails the whole request; none of them affect other calls.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid {0} signature")]
    AuthenticationFailed(&'static str),

    #[error("session payload could not be decoded: {0}")]
    InvalidSession(#[from] SessionDecodeError),

    #[error("root object unavailable: {0}")]
    RootUnavailable(String),

    #[error("cannot call on null: chain step {step} ({method}) returned no object")]
    BrokenChain { step: usize, method: String },

    #[error("chain step {step}: {method} returned a plain value, not an object")]
    ChainValue { step: usize, method: String },

    #[error("type '{type_name}' has no method '{method}'")]
    NoSuchMethod { type_name: TypeName, method: String },

    #[error("object returned by {method} is not of a remote-capable type")]
    NotRemotable { method: String },

    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error("{method} failed: {reason}")]
    MethodFailed { method: String, reason: String },

    #[error("cached method {method} failed: {reason}")]
    CachedMethodFailed { method: String, reason: String },

    #[error("dispatcher is shutting down")]
    ShuttingDown,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SigningError> for DispatchError {
    fn from(e: SigningError) -> Self {
        Self::Internal(format!("signing failed: {}", e))
    }
}

impl DispatchError {
    /// Stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AuthenticationFailed(_) => ErrorCode::AuthenticationFailed,
            Self::InvalidSession(_) => ErrorCode::InvalidSession,
            Self::RootUnavailable(_) => ErrorCode::RootUnavailable,
            Self::BrokenChain { .. } | Self::ChainValue { .. } => ErrorCode::BrokenChain,
            Self::NoSuchMethod { .. } => ErrorCode::NoSuchMethod,
            Self::NotRemotable { .. } => ErrorCode::NotRemotable,
            Self::InvalidArguments { .. } => ErrorCode::InvalidArguments,
            Self::MethodFailed { .. } => ErrorCode::MethodFailed,
            Self::CachedMethodFailed { .. } => ErrorCode::CachedMethodFailed,
            Self::ShuttingDown => ErrorCode::ShuttingDown,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Convert to the wire error payload.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::AuthenticationFailed(what) => RpcError::authentication_failed(what),
            Self::NoSuchMethod { type_name, method } => {
                RpcError::no_such_method(type_name.as_str(), method)
            }
            Self::BrokenChain { step, method } | Self::ChainValue { step, method } => {
                RpcError::with_data(
                    self.code(),
                    self.to_string(),
                    serde_json::json!({ "step": step, "method": method }),
                )
            }
            _ => RpcError::new(self.code(), self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_chain_message() {
        let e = DispatchError::BrokenChain {
            step: 1,
            method: "App.loggedIn(): LoggedInService".to_string(),
        };
        assert_eq!(e.code(), ErrorCode::BrokenChain);
        let rpc = e.to_rpc_error();
        assert!(rpc.message.starts_with("cannot call"));
        assert_eq!(rpc.data.unwrap()["step"], 1);
    }

    #[test]
    fn test_authentication_code() {
        let e = DispatchError::AuthenticationFailed("session");
        assert_eq!(e.to_rpc_error().code, ErrorCode::AuthenticationFailed);
        assert_eq!(e.to_string(), "invalid session signature");
    }

    #[test]
    fn test_method_error_from_json() {
        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(matches!(MethodError::from(json_err), MethodError::Failed(_)));
    }
}
