//! Remote-capable type registry.
//!
//! Each remote-capable Rust type is registered once with its schema name and
//! a dispatch table mapping method descriptors to invocation closures. The
//! finished [`RemoteRegistry`] is read-only and shared by every request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use rodcall_protocol::{MethodDescriptor, TypeName};

use crate::error::{MethodError, RegistryError};
use crate::object::{concrete_type, AnyObject, Args, MethodFuture, Reply};

/// Type-erased invocation closure.
pub type Invoker = Arc<dyn Fn(AnyObject, Args) -> MethodFuture + Send + Sync>;

/// One entry of a dispatch table.
#[derive(Clone)]
pub struct MethodEntry {
    pub descriptor: MethodDescriptor,
    invoker: Invoker,
}

impl MethodEntry {
    /// Invoke the method on `target`.
    pub fn invoke(&self, target: AnyObject, args: Args) -> MethodFuture {
        (self.invoker)(target, args)
    }
}

/// Builder for the dispatch table of one Rust type `T`.
pub struct RemoteType<T> {
    name: TypeName,
    methods: Vec<MethodEntry>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> RemoteType<T> {
    /// Start a table for `T`, exposed under `name`.
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            _type: PhantomData,
        }
    }

    /// Add a callable method.
    pub fn method<F, Fut>(self, name: &str, params: &[&str], returns: &str, f: F) -> Self
    where
        F: Fn(Arc<T>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, MethodError>> + Send + 'static,
    {
        let descriptor = MethodDescriptor::new(
            self.name.clone(),
            name,
            params.iter().map(|p| TypeName::from(*p)).collect(),
            returns,
        );
        self.with_descriptor(descriptor, f)
    }

    /// Add a zero-argument method whose result is embedded in handles.
    pub fn cached<F, Fut>(self, name: &str, returns: &str, f: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, MethodError>> + Send + 'static,
    {
        let descriptor =
            MethodDescriptor::new(self.name.clone(), name, Vec::new(), returns).cacheable();
        self.with_descriptor(descriptor, move |target, _args| f(target))
    }

    /// Add a method with a descriptor produced elsewhere (e.g. by a schema
    /// compiler). The descriptor is validated when the registry is built.
    pub fn with_descriptor<F, Fut>(mut self, descriptor: MethodDescriptor, f: F) -> Self
    where
        F: Fn(Arc<T>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, MethodError>> + Send + 'static,
    {
        let invoker: Invoker = Arc::new(move |target: AnyObject, args: Args| {
            match target.downcast::<T>() {
                Ok(target) => f(target, args).boxed(),
                Err(_) => async { Err(MethodError::failed("receiver has the wrong type")) }.boxed(),
            }
        });
        self.methods.push(MethodEntry { descriptor, invoker });
        self
    }
}

/// A registered remote-capable type and its dispatch table.
pub struct RegisteredType {
    name: TypeName,
    methods: Vec<MethodEntry>,
    index: HashMap<(String, Vec<TypeName>), usize>,
}

impl RegisteredType {
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    /// Resolve a requested method by name and parameter types.
    pub fn find(&self, requested: &MethodDescriptor) -> Option<&MethodEntry> {
        self.index
            .get(&requested.signature_key())
            .map(|&i| &self.methods[i])
    }
}

/// Read-only registry of remote-capable types.
pub struct RemoteRegistry {
    types: HashMap<TypeId, RegisteredType>,
}

impl RemoteRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registered type of an object, if it is remote-capable.
    pub fn lookup(&self, object: &AnyObject) -> Option<&RegisteredType> {
        self.types.get(&concrete_type(object))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Collects [`RemoteType`] tables and validates them.
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<(TypeId, TypeName, Vec<MethodEntry>)>,
}

impl RegistryBuilder {
    /// Register a type's dispatch table.
    pub fn register<T: Any + Send + Sync>(mut self, table: RemoteType<T>) -> Self {
        self.pending.push((TypeId::of::<T>(), table.name, table.methods));
        self
    }

    /// Validate every table and freeze the registry.
    pub fn build(self) -> Result<RemoteRegistry, RegistryError> {
        let mut types: HashMap<TypeId, RegisteredType> = HashMap::new();

        for (type_id, name, methods) in self.pending {
            if types.contains_key(&type_id) || types.values().any(|t| t.name == name) {
                return Err(RegistryError::DuplicateType(name));
            }

            let mut index = HashMap::new();
            for (i, entry) in methods.iter().enumerate() {
                let md = &entry.descriptor;
                if md.owner != name {
                    return Err(RegistryError::OwnerMismatch {
                        type_name: name,
                        owner: md.owner.clone(),
                        method: md.name.clone(),
                    });
                }
                if md.cacheable && !md.is_zero_arg() {
                    return Err(RegistryError::CacheableWithParams {
                        type_name: name,
                        method: md.name.clone(),
                    });
                }
                if index.insert(md.signature_key(), i).is_some() {
                    return Err(RegistryError::DuplicateMethod {
                        type_name: name,
                        method: md.name.clone(),
                    });
                }
            }

            types.insert(type_id, RegisteredType { name, methods, index });
        }

        Ok(RemoteRegistry { types })
    }
}
