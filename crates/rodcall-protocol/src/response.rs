//! Call result and object handle types.

use serde::{Deserialize, Serialize};

use crate::call_stack::CallStack;
use crate::method::{MethodDescriptor, TypeName};
use crate::session::SessionData;

/// Precomputed result of a cacheable method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult {
    /// The cacheable method.
    pub method: MethodDescriptor,
    /// Its value at handle construction time.
    pub value: serde_json::Value,
}

/// Client-facing description of a remote object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObjectDefinition {
    /// Remote-capable type of the object.
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Methods the client may call.
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Eagerly evaluated cacheable methods.
    #[serde(default)]
    pub cached: Vec<CachedResult>,
    /// Signed chain reaching this object.
    pub call_stack: CallStack,
}

impl RemoteObjectDefinition {
    /// Find an exposed method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Cached value of a cacheable method, by name.
    pub fn cached_value(&self, name: &str) -> Option<&serde_json::Value> {
        self.cached
            .iter()
            .find(|c| c.method.name == name)
            .map(|c| &c.value)
    }
}

/// Result of one RPC invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RCallResult {
    /// The call resolved to a remote object.
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<SessionData>,
        handle: RemoteObjectDefinition,
    },
    /// The call produced a plain value.
    Value {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<SessionData>,
        method: MethodDescriptor,
        value: serde_json::Value,
    },
}

impl RCallResult {
    /// Wrap an object handle.
    pub fn object(session: Option<SessionData>, handle: RemoteObjectDefinition) -> Self {
        Self::Object { session, handle }
    }

    /// Wrap a plain value.
    pub fn value(
        session: Option<SessionData>,
        method: MethodDescriptor,
        value: serde_json::Value,
    ) -> Self {
        Self::Value {
            session,
            method,
            value,
        }
    }

    /// Session credential to carry into the next call.
    pub fn session(&self) -> Option<&SessionData> {
        match self {
            Self::Object { session, .. } | Self::Value { session, .. } => session.as_ref(),
        }
    }

    /// The object handle, if this is an object result.
    pub fn handle(&self) -> Option<&RemoteObjectDefinition> {
        match self {
            Self::Object { handle, .. } => Some(handle),
            Self::Value { .. } => None,
        }
    }

    /// The plain value, if this is a value result.
    pub fn plain_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value { value, .. } => Some(value),
            Self::Object { .. } => None,
        }
    }
}
