//! rodcall protocol types
//!
//! Defines the JSON messages exchanged between a rodcall client and the
//! stateless dispatcher, and the HMAC signing that lets the server trust
//! call chains and session credentials it handed out earlier without
//! remembering them.

pub mod call_stack;
pub mod error;
pub mod method;
pub mod request;
pub mod response;
pub mod session;
pub mod signing;

pub use call_stack::CallStack;
pub use error::{ErrorCode, RpcError};
pub use method::{MethodDescriptor, SingleCall, TypeName};
pub use request::RCall;
pub use response::{CachedResult, RCallResult, RemoteObjectDefinition};
pub use session::{SessionData, SessionDecodeError};
pub use signing::{Secret, SigningError, SigningResult};

/// Content type of request and response bodies.
pub const CONTENT_TYPE: &str = "application/json";
