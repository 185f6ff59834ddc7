//! Call request type.

use serde::{Deserialize, Serialize};

use crate::call_stack::CallStack;
use crate::method::SingleCall;
use crate::session::SessionData;

/// One RPC invocation.
///
/// Without `this_call` the request asks for the object handle at the end of
/// `call_stack`. A missing `call_stack` is the root chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RCall {
    /// Session credential from the previous result, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_data: Option<SessionData>,
    /// Signed chain reaching the current target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_stack: Option<CallStack>,
    /// Method to invoke on the current target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub this_call: Option<SingleCall>,
}

impl RCall {
    /// Request the root object handle.
    pub fn root(session_data: Option<SessionData>) -> Self {
        Self {
            session_data,
            call_stack: None,
            this_call: None,
        }
    }

    /// Request the handle at the end of `call_stack`.
    pub fn resolve(session_data: Option<SessionData>, call_stack: CallStack) -> Self {
        Self {
            session_data,
            call_stack: Some(call_stack),
            this_call: None,
        }
    }

    /// Invoke `this_call` on the object reached by `call_stack`.
    pub fn invoke(
        session_data: Option<SessionData>,
        call_stack: CallStack,
        this_call: SingleCall,
    ) -> Self {
        Self {
            session_data,
            call_stack: Some(call_stack),
            this_call: Some(this_call),
        }
    }
}
