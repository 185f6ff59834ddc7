//! Method descriptors and single method invocations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a type in the service schema (e.g. `App`, `string`, `list<TestValue>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identifies a callable method on a remote-capable type.
///
/// Descriptors are immutable keys: two descriptors are the same method when
/// every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Type that declares the method.
    pub owner: TypeName,
    /// Method name.
    pub name: String,
    /// Ordered parameter types.
    #[serde(default)]
    pub params: Vec<TypeName>,
    /// Declared return type.
    pub returns: TypeName,
    /// Evaluated eagerly and embedded in object handles.
    #[serde(default)]
    pub cacheable: bool,
}

impl MethodDescriptor {
    /// Create a descriptor for a non-cacheable method.
    pub fn new(
        owner: impl Into<TypeName>,
        name: impl Into<String>,
        params: Vec<TypeName>,
        returns: impl Into<TypeName>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params,
            returns: returns.into(),
            cacheable: false,
        }
    }

    /// Mark the method as cacheable.
    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Whether the method takes no arguments.
    pub fn is_zero_arg(&self) -> bool {
        self.params.is_empty()
    }

    /// Lookup key used to resolve the method on an object: name plus
    /// parameter types.
    pub fn signature_key(&self) -> (String, Vec<TypeName>) {
        (self.name.clone(), self.params.clone())
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.owner, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, "): {}", self.returns)
    }
}

/// One method invocation: the method and its ordered arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleCall {
    /// Method to invoke on the current target.
    pub method_to_call: MethodDescriptor,
    /// Ordered argument values.
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

impl SingleCall {
    /// Create a call with arguments.
    pub fn new(method_to_call: MethodDescriptor, arguments: Vec<serde_json::Value>) -> Self {
        Self {
            method_to_call,
            arguments,
        }
    }

    /// Create a call to a zero-argument method.
    pub fn no_args(method_to_call: MethodDescriptor) -> Self {
        Self::new(method_to_call, Vec::new())
    }
}
