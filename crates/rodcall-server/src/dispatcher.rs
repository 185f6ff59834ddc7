//! Stateless call dispatcher.
//!
//! A call is handled in one unit of work:
//! 1. verify and decode the session credential (expired = absent)
//! 2. ask the root factory for the root object
//! 3. verify the call chain and replay it, one awaited step at a time
//! 4. invoke `thisCall`, or build a handle for the chain's target
//! 5. sign a refreshed session credential into the result
//!
//! Nothing survives the call except what is signed into the result.

use std::any::Any;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rodcall_protocol::{
    CachedResult, CallStack, MethodDescriptor, RCall, RCallResult, RemoteObjectDefinition, Secret,
    SessionData, SingleCall,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{DispatchError, MethodError};
use crate::object::{AnyObject, Args, Reply};
use crate::pool::WorkerPool;
use crate::registry::{RegisteredType, RemoteRegistry};
use crate::session::SessionManager;

/// Default number of calls processed at once.
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 64;

/// Default session credential lifetime in seconds.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 60;

/// Produces the root object for a request from its session.
pub type RootFactory<S> =
    Arc<dyn Fn(SessionManager<S>) -> Result<AnyObject, MethodError> + Send + Sync>;

/// Dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Shared secret for call chains and session credentials.
    pub secret: Secret,
    /// Worker pool size.
    pub max_concurrent_calls: usize,
    /// Lifetime stamped on refreshed session credentials.
    pub session_ttl: Duration,
}

impl DispatcherConfig {
    /// Settings with default pool size and session lifetime.
    pub fn new(secret: Secret) -> Self {
        Self {
            secret,
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECONDS),
        }
    }
}

/// Server-side protocol engine.
///
/// `S` is the application's session type, carried in signed credentials.
pub struct Dispatcher<S> {
    core: Arc<Core<S>>,
    pool: WorkerPool,
}

/// Read-only state shared by every call.
struct Core<S> {
    secret: Secret,
    session_ttl: Duration,
    registry: Arc<RemoteRegistry>,
    root: RootFactory<S>,
}

/// A resolved object together with its dispatch table.
struct Target<'r> {
    object: AnyObject,
    ty: &'r RegisteredType,
}

enum Resolved {
    Handle(RemoteObjectDefinition),
    Value(MethodDescriptor, serde_json::Value),
}

impl<S> Dispatcher<S>
where
    S: Serialize + DeserializeOwned + Send + 'static,
{
    /// Create a dispatcher.
    ///
    /// `root` is called once per request with that request's session.
    pub fn new<R, F>(config: DispatcherConfig, registry: Arc<RemoteRegistry>, root: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(SessionManager<S>) -> Result<Arc<R>, MethodError> + Send + Sync + 'static,
    {
        let root: RootFactory<S> = Arc::new(move |session| root(session).map(|r| r as AnyObject));
        info!(
            secret = %config.secret.fingerprint(),
            workers = config.max_concurrent_calls,
            types = registry.len(),
            "dispatcher ready"
        );
        Self {
            pool: WorkerPool::new(config.max_concurrent_calls),
            core: Arc::new(Core {
                secret: config.secret,
                session_ttl: config.session_ttl,
                registry,
                root,
            }),
        }
    }

    /// Handle one call on the worker pool.
    pub async fn handle(&self, call: RCall) -> Result<RCallResult, DispatchError> {
        let core = Arc::clone(&self.core);
        self.pool.run(async move { core.process(call).await }).await
    }

    /// Stop accepting calls and wait up to `timeout` for in-flight ones.
    pub async fn close(&self, timeout: std::time::Duration) -> bool {
        info!(in_flight = self.pool.in_flight(), "closing dispatcher");
        self.pool.close(timeout).await
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl<S> Core<S>
where
    S: Serialize + DeserializeOwned + Send + 'static,
{
    #[instrument(name = "rcall", skip_all, fields(call_id = %Uuid::new_v4()))]
    async fn process(&self, call: RCall) -> Result<RCallResult, DispatchError> {
        debug!(?call, "incoming call");
        let session = self.resolve_session(call.session_data.as_ref())?;

        let root = (self.root)(session.clone())
            .map_err(|e| DispatchError::RootUnavailable(e.to_string()))?;
        let root = match self.registry.lookup(&root) {
            Some(ty) => Target { object: root, ty },
            None => {
                return Err(DispatchError::RootUnavailable(
                    "root object type is not registered".to_string(),
                ))
            }
        };

        let chain = match call.call_stack {
            Some(chain) => {
                self.verify_chain(&chain)?;
                chain
            }
            None => CallStack::root(&self.secret)?,
        };
        let target = self.replay(root, &chain).await?;

        let resolved = match call.this_call {
            None => Resolved::Handle(self.build_handle(&target, chain).await?),
            Some(this_call) => {
                let reply = self.invoke(&target, &this_call).await?;
                self.classify(reply, &chain, this_call).await?
            }
        };

        let credential = session.credential(self.session_ttl, &self.secret)?;
        let result = match resolved {
            Resolved::Handle(handle) => RCallResult::object(credential, handle),
            Resolved::Value(method, value) => RCallResult::value(credential, method, value),
        };
        debug!(?result, "call result");
        Ok(result)
    }

    fn resolve_session(
        &self,
        credential: Option<&SessionData>,
    ) -> Result<SessionManager<S>, DispatchError> {
        let Some(credential) = credential else {
            return Ok(SessionManager::empty());
        };
        if !credential.verify_signature(&self.secret)? {
            warn!("rejecting call with invalid session signature");
            return Err(DispatchError::AuthenticationFailed("session"));
        }
        if credential.is_expired(Utc::now()) {
            warn!(
                valid_until = %credential.valid_until,
                "session expired, continuing without session"
            );
            return Ok(SessionManager::empty());
        }
        let data: S = credential.decode()?;
        Ok(SessionManager::new(Some(data), Some(credential.valid_until)))
    }

    /// Every chain a client sends must verify, the empty one included. A
    /// request that carries no chain at all names the root.
    fn verify_chain(&self, chain: &CallStack) -> Result<(), DispatchError> {
        if !chain.verify_signature(&self.secret)? {
            warn!(calls = chain.len(), "rejecting call with invalid call stack signature");
            return Err(DispatchError::AuthenticationFailed("call stack"));
        }
        Ok(())
    }

    async fn replay<'r>(
        &'r self,
        root: Target<'r>,
        chain: &CallStack,
    ) -> Result<Target<'r>, DispatchError> {
        let mut current = root;
        for (step, call) in chain.calls.iter().enumerate() {
            current = match self.invoke(&current, call).await? {
                Reply::Object(object) => self.remote(object, &call.method_to_call)?,
                Reply::Absent | Reply::Value(serde_json::Value::Null) => {
                    return Err(DispatchError::BrokenChain {
                        step,
                        method: call.method_to_call.to_string(),
                    })
                }
                Reply::Value(_) => {
                    return Err(DispatchError::ChainValue {
                        step,
                        method: call.method_to_call.to_string(),
                    })
                }
            };
        }
        Ok(current)
    }

    fn remote(
        &self,
        object: AnyObject,
        produced_by: &MethodDescriptor,
    ) -> Result<Target<'_>, DispatchError> {
        match self.registry.lookup(&object) {
            Some(ty) => Ok(Target { object, ty }),
            None => Err(DispatchError::NotRemotable {
                method: produced_by.to_string(),
            }),
        }
    }

    async fn invoke(&self, target: &Target<'_>, call: &SingleCall) -> Result<Reply, DispatchError> {
        let requested = &call.method_to_call;
        let entry = target
            .ty
            .find(requested)
            .ok_or_else(|| DispatchError::NoSuchMethod {
                type_name: target.ty.name().clone(),
                method: requested.name.clone(),
            })?;
        let method = &entry.descriptor;

        if call.arguments.len() != method.params.len() {
            return Err(DispatchError::InvalidArguments {
                method: method.to_string(),
                reason: format!(
                    "expected {} arguments, got {}",
                    method.params.len(),
                    call.arguments.len()
                ),
            });
        }

        debug!(%method, "invoking");
        entry
            .invoke(Arc::clone(&target.object), Args::new(call.arguments.clone()))
            .await
            .map_err(|e| match e {
                MethodError::InvalidArgument { .. } => DispatchError::InvalidArguments {
                    method: method.to_string(),
                    reason: e.to_string(),
                },
                MethodError::Failed(reason) => DispatchError::MethodFailed {
                    method: method.to_string(),
                    reason,
                },
            })
    }

    async fn classify(
        &self,
        reply: Reply,
        chain: &CallStack,
        this_call: SingleCall,
    ) -> Result<Resolved, DispatchError> {
        match reply {
            Reply::Value(value) => Ok(Resolved::Value(this_call.method_to_call, value)),
            Reply::Absent => Ok(Resolved::Value(this_call.method_to_call, serde_json::Value::Null)),
            Reply::Object(object) => {
                let target = self.remote(object, &this_call.method_to_call)?;
                let chain = chain.extended(this_call, &self.secret)?;
                Ok(Resolved::Handle(self.build_handle(&target, chain).await?))
            }
        }
    }

    async fn build_handle(
        &self,
        target: &Target<'_>,
        chain: CallStack,
    ) -> Result<RemoteObjectDefinition, DispatchError> {
        let mut methods = Vec::new();
        let mut cached = Vec::new();

        for entry in target.ty.methods() {
            let method = &entry.descriptor;
            if !(method.cacheable && method.is_zero_arg()) {
                methods.push(method.clone());
                continue;
            }

            let reply = entry
                .invoke(Arc::clone(&target.object), Args::default())
                .await
                .map_err(|e| DispatchError::CachedMethodFailed {
                    method: method.to_string(),
                    reason: e.to_string(),
                })?;
            let value = match reply {
                Reply::Value(value) => value,
                Reply::Absent => serde_json::Value::Null,
                Reply::Object(_) => {
                    return Err(DispatchError::CachedMethodFailed {
                        method: method.to_string(),
                        reason: "cacheable methods must return plain values".to_string(),
                    })
                }
            };
            cached.push(CachedResult {
                method: method.clone(),
                value,
            });
        }

        Ok(RemoteObjectDefinition {
            type_name: target.ty.name().clone(),
            methods,
            cached,
            call_stack: chain,
        })
    }
}
