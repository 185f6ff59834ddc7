//! Client for remote objects.
//!
//! The client holds the only per-user state in the system: the latest
//! session credential. Every call sends it and every result replaces it.
//! Object handles are plain data; a call on a handle sends the handle's
//! signed chain back to the server.

use std::sync::Mutex;

use rodcall_protocol::{
    CallStack, MethodDescriptor, RCall, RCallResult, RemoteObjectDefinition, SessionData,
    SingleCall,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::transport::{RemoteService, TransportError};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("type '{type_name}' exposes no method '{method}' taking {arity} arguments")]
    UnknownMethod {
        type_name: String,
        method: String,
        arity: usize,
    },

    #[error("{method} returned a plain value, expected an object")]
    ExpectedObject { method: String },

    #[error("{method} returned an object, expected a plain value")]
    ExpectedValue { method: String },

    #[error("failed to encode argument: {0}")]
    Encode(serde_json::Error),

    #[error("failed to decode value of {method}: {source}")]
    Decode {
        method: String,
        source: serde_json::Error,
    },
}

/// What a call on a handle produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Object(RemoteObjectDefinition),
    Value(Value),
}

impl Outcome {
    /// The handle, if the call produced an object.
    pub fn into_object(self) -> Option<RemoteObjectDefinition> {
        match self {
            Self::Object(handle) => Some(handle),
            Self::Value(_) => None,
        }
    }

    /// The value, if the call produced a plain value.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Object(_) => None,
        }
    }
}

/// Encode call arguments.
pub fn args<T: Serialize>(values: &[T]) -> Result<Vec<Value>, ClientError> {
    values
        .iter()
        .map(|v| serde_json::to_value(v).map_err(ClientError::Encode))
        .collect()
}

/// Calls remote objects through a [`RemoteService`].
pub struct RemoteClient<T> {
    transport: T,
    session: Mutex<Option<SessionData>>,
}

impl<T: RemoteService> RemoteClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current session credential.
    pub fn session(&self) -> Option<SessionData> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the session credential, e.g. one restored from disk.
    pub fn set_session(&self, session: Option<SessionData>) {
        *self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    /// Send a raw request and adopt the returned credential.
    pub async fn send(&self, call: RCall) -> Result<RCallResult, ClientError> {
        let result = self.transport.call(call).await?;
        self.set_session(result.session().cloned());
        Ok(result)
    }

    /// Handle of the root object.
    pub async fn root(&self) -> Result<RemoteObjectDefinition, ClientError> {
        let result = self.send(RCall::root(self.session())).await?;
        expect_object(result, "root")
    }

    /// Re-fetch the handle at the end of `chain` with fresh cached values.
    pub async fn resolve(&self, chain: &CallStack) -> Result<RemoteObjectDefinition, ClientError> {
        let result = self
            .send(RCall::resolve(self.session(), chain.clone()))
            .await?;
        expect_object(result, "resolve")
    }

    /// Invoke `call` on the object behind `handle`, always on the server.
    pub async fn invoke(
        &self,
        handle: &RemoteObjectDefinition,
        call: SingleCall,
    ) -> Result<Outcome, ClientError> {
        let request = RCall::invoke(self.session(), handle.call_stack.clone(), call);
        Ok(match self.send(request).await? {
            RCallResult::Object { handle, .. } => Outcome::Object(handle),
            RCallResult::Value { value, .. } => Outcome::Value(value),
        })
    }

    /// Call `method` on `handle` by name.
    ///
    /// Cacheable methods are answered from the handle without a round trip.
    pub async fn call(
        &self,
        handle: &RemoteObjectDefinition,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Outcome, ClientError> {
        if args.is_empty() {
            if let Some(value) = handle.cached_value(method) {
                debug!(method, "answered from cached values");
                return Ok(Outcome::Value(value.clone()));
            }
        }
        let descriptor = find_method(handle, method, args.len())?.clone();
        self.invoke(handle, SingleCall::new(descriptor, args)).await
    }

    /// Call a method expected to return an object.
    pub async fn call_object(
        &self,
        handle: &RemoteObjectDefinition,
        method: &str,
        args: Vec<Value>,
    ) -> Result<RemoteObjectDefinition, ClientError> {
        match self.call(handle, method, args).await? {
            Outcome::Object(handle) => Ok(handle),
            Outcome::Value(_) => Err(ClientError::ExpectedObject {
                method: method.to_string(),
            }),
        }
    }

    /// Call a method that returns an optional object.
    pub async fn call_optional(
        &self,
        handle: &RemoteObjectDefinition,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Option<RemoteObjectDefinition>, ClientError> {
        match self.call(handle, method, args).await? {
            Outcome::Object(handle) => Ok(Some(handle)),
            Outcome::Value(Value::Null) => Ok(None),
            Outcome::Value(_) => Err(ClientError::ExpectedObject {
                method: method.to_string(),
            }),
        }
    }

    /// Call a method and decode its plain value.
    pub async fn call_value<R: DeserializeOwned>(
        &self,
        handle: &RemoteObjectDefinition,
        method: &str,
        args: Vec<Value>,
    ) -> Result<R, ClientError> {
        match self.call(handle, method, args).await? {
            Outcome::Value(value) => {
                serde_json::from_value(value).map_err(|source| ClientError::Decode {
                    method: method.to_string(),
                    source,
                })
            }
            Outcome::Object(_) => Err(ClientError::ExpectedValue {
                method: method.to_string(),
            }),
        }
    }
}

fn find_method<'h>(
    handle: &'h RemoteObjectDefinition,
    name: &str,
    arity: usize,
) -> Result<&'h MethodDescriptor, ClientError> {
    handle
        .methods
        .iter()
        .chain(handle.cached.iter().map(|c| &c.method))
        .find(|m| m.name == name && m.params.len() == arity)
        .ok_or_else(|| ClientError::UnknownMethod {
            type_name: handle.type_name.to_string(),
            method: name.to_string(),
            arity,
        })
}

fn expect_object(result: RCallResult, what: &str) -> Result<RemoteObjectDefinition, ClientError> {
    match result {
        RCallResult::Object { handle, .. } => Ok(handle),
        RCallResult::Value { .. } => Err(ClientError::ExpectedObject {
            method: what.to_string(),
        }),
    }
}
