//! rodcall server
//!
//! Stateless dispatcher for the rodcall remote-object protocol. The
//! application registers its remote-capable types in a [`RemoteRegistry`]
//! and supplies a root factory; the [`Dispatcher`] replays signed call
//! chains against that root on every request and keeps no state between
//! calls.

pub mod dispatcher;
pub mod error;
pub mod http;
pub mod object;
pub mod pool;
pub mod registry;
pub mod session;

pub use dispatcher::{Dispatcher, DispatcherConfig, RootFactory};
pub use error::{DispatchError, MethodError, RegistryError};
pub use object::{AnyObject, Args, MethodFuture, Reply};
pub use registry::{RegisteredType, RemoteRegistry, RemoteType};
pub use session::SessionManager;
