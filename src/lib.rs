//! rodcall - stateless remote-object RPC
//!
//! Clients navigate server-side object graphs through handles that carry a
//! signed chain of the calls that reached them. The server keeps nothing
//! between calls: each request replays its chain from a fresh root object,
//! and session state travels with the client as a signed credential.
//!
//! Protocol types live in `rodcall-protocol`, the dispatcher in
//! `rodcall-server`; this crate adds transports, a client, configuration
//! and the demo service behind the `rodcall` binary.

pub mod client;
pub mod config;
pub mod demo;
pub mod keygen;
pub mod logging;
pub mod transport;

pub use client::{ClientError, Outcome, RemoteClient};
pub use rodcall_protocol::{
    CallStack, ErrorCode, MethodDescriptor, RCall, RCallResult, RemoteObjectDefinition, RpcError,
    Secret, SessionData, SingleCall,
};
pub use rodcall_server::{Dispatcher, DispatcherConfig, RemoteRegistry, RemoteType};
pub use transport::{HttpTransport, LocalTransport, RemoteService, TransportError};
