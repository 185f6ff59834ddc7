//! Type-erased remote objects, method replies and arguments.

use std::any::{Any, TypeId};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::MethodError;

/// A server-side object of any type.
pub type AnyObject = Arc<dyn Any + Send + Sync>;

/// Deferred result of an application method.
pub type MethodFuture = BoxFuture<'static, Result<Reply, MethodError>>;

/// Concrete type of the value behind an [`AnyObject`].
pub fn concrete_type(object: &AnyObject) -> TypeId {
    (**object).type_id()
}

/// What an application method produced.
pub enum Reply {
    /// A plain value, already encoded.
    Value(serde_json::Value),
    /// An object; becomes a handle if its type is remote-capable.
    Object(AnyObject),
    /// An optional result that is absent.
    Absent,
}

impl Reply {
    /// Encode a plain value.
    pub fn value<T: Serialize + ?Sized>(value: &T) -> Result<Self, MethodError> {
        Ok(Self::Value(serde_json::to_value(value)?))
    }

    /// Wrap an object.
    pub fn object<T: Any + Send + Sync>(object: Arc<T>) -> Self {
        Self::Object(object)
    }

    /// Wrap an optional object.
    pub fn optional<T: Any + Send + Sync>(object: Option<Arc<T>>) -> Self {
        match object {
            Some(object) => Self::Object(object),
            None => Self::Absent,
        }
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// Ordered call arguments, decoded on demand.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<serde_json::Value>);

impl Args {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode argument `index` into `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, MethodError> {
        let value = self.0.get(index).ok_or_else(|| MethodError::InvalidArgument {
            index,
            reason: "missing".to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| MethodError::InvalidArgument {
            index,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Thing;

    #[test]
    fn test_concrete_type_sees_through_arc() {
        let object: AnyObject = Arc::new(Thing);
        assert_eq!(concrete_type(&object), TypeId::of::<Thing>());
        assert_ne!(concrete_type(&object), TypeId::of::<AnyObject>());
    }

    #[test]
    fn test_args_decode() {
        let args = Args::new(vec![json!("alice"), json!(3)]);
        assert_eq!(args.get::<String>(0).unwrap(), "alice");
        assert_eq!(args.get::<u32>(1).unwrap(), 3);
        assert!(matches!(
            args.get::<u32>(0),
            Err(MethodError::InvalidArgument { index: 0, .. })
        ));
        assert!(matches!(
            args.get::<u32>(2),
            Err(MethodError::InvalidArgument { index: 2, .. })
        ));
    }

    #[test]
    fn test_optional_reply() {
        assert!(matches!(Reply::optional::<Thing>(None), Reply::Absent));
        assert!(matches!(Reply::optional(Some(Arc::new(Thing))), Reply::Object(_)));
        assert!(matches!(Reply::value("x").unwrap(), Reply::Value(_)));
    }
}
