//! Per-request session access for application code.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rodcall_protocol::{Secret, SessionData, SigningResult};
use serde::Serialize;

struct SessionState<S> {
    data: Option<S>,
    expires: Option<DateTime<Utc>>,
    /// Expiry chosen by the application during this request.
    explicit_expiry: bool,
}

/// Handle to the session of the current request.
///
/// Handed to the root factory; the application keeps clones wherever it
/// needs to read or change the session. Whatever it holds when the call
/// finishes is signed into the credential returned to the client.
pub struct SessionManager<S> {
    state: Arc<Mutex<SessionState<S>>>,
}

impl<S> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> SessionManager<S> {
    /// Session manager starting from `data` (absent when none was sent or it expired).
    pub fn new(data: Option<S>, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                data,
                expires,
                explicit_expiry: false,
            })),
        }
    }

    /// Manager with no session.
    pub fn empty() -> Self {
        Self::new(None, None)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState<S>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether session data is present.
    pub fn is_present(&self) -> bool {
        self.lock().data.is_some()
    }

    /// Expiry of the current session, if any.
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.lock().expires
    }

    /// Run `f` with the current session data.
    pub fn with_data<R>(&self, f: impl FnOnce(Option<&S>) -> R) -> R {
        f(self.lock().data.as_ref())
    }

    /// Replace the session; the dispatcher stamps the default expiry.
    pub fn set(&self, data: S) {
        let mut state = self.lock();
        state.data = Some(data);
        state.explicit_expiry = false;
    }

    /// Replace the session with an explicit expiry.
    pub fn set_with_expiry(&self, data: S, expires: DateTime<Utc>) {
        let mut state = self.lock();
        state.data = Some(data);
        state.expires = Some(expires);
        state.explicit_expiry = true;
    }

    /// Drop the session; no credential is returned to the client.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.data = None;
        state.expires = None;
        state.explicit_expiry = false;
    }
}

impl<S: Clone> SessionManager<S> {
    /// Copy of the current session data.
    pub fn data(&self) -> Option<S> {
        self.lock().data.clone()
    }
}

impl<S: Serialize> SessionManager<S> {
    /// Sign the current session into a fresh credential.
    ///
    /// The expiry slides to `now + ttl` unless the application set one
    /// during this request.
    pub fn credential(&self, ttl: Duration, secret: &Secret) -> SigningResult<Option<SessionData>> {
        let state = self.lock();
        let Some(data) = state.data.as_ref() else {
            return Ok(None);
        };
        let valid_until = match (state.explicit_expiry, state.expires) {
            (true, Some(expires)) => expires,
            _ => Utc::now() + ttl,
        };
        SessionData::create_and_sign(data, valid_until, secret).map(Some)
    }
}
