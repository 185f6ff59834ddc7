//! Signed call chains.

use serde::{Deserialize, Serialize};

use crate::method::SingleCall;
use crate::signing::{self, Secret, SigningResult};

/// Ordered path of calls from the root object to a reachable object.
///
/// The signature covers `calls` only. An empty chain denotes the root object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStack {
    /// Calls to replay, in order, starting from the root object.
    #[serde(default)]
    pub calls: Vec<SingleCall>,
    /// Base64 HMAC over the canonical `calls` array.
    #[serde(default)]
    pub signature: String,
}

impl CallStack {
    /// Build a chain and sign it.
    pub fn create_and_sign(calls: Vec<SingleCall>, secret: &Secret) -> SigningResult<Self> {
        let signature = signing::sign(&calls, secret)?;
        Ok(Self { calls, signature })
    }

    /// Signed empty chain, reaching the root object.
    pub fn root(secret: &Secret) -> SigningResult<Self> {
        Self::create_and_sign(Vec::new(), secret)
    }

    /// Number of calls in the chain.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the chain has no calls.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Check the signature against the shared secret.
    pub fn verify_signature(&self, secret: &Secret) -> SigningResult<bool> {
        signing::verify(&self.calls, &self.signature, secret)
    }

    /// New chain with `call` appended, freshly signed.
    pub fn extended(&self, call: SingleCall, secret: &Secret) -> SigningResult<Self> {
        let mut calls = self.calls.clone();
        calls.push(call);
        Self::create_and_sign(calls, secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::MethodDescriptor;
    use serde_json::json;

    fn secret() -> Secret {
        Secret::from("chain-secret")
    }

    fn login_call(name: &str) -> SingleCall {
        SingleCall::new(
            MethodDescriptor::new(
                "App",
                "login",
                vec!["string".into(), "string".into()],
                "LoggedInService",
            ),
            vec![json!(name), json!("pw")],
        )
    }

    #[test]
    fn test_signed_chain_verifies() {
        let chain = CallStack::create_and_sign(vec![login_call("alice")], &secret()).unwrap();
        assert!(chain.verify_signature(&secret()).unwrap());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_mutated_argument_fails_verification() {
        let mut chain = CallStack::create_and_sign(vec![login_call("alice")], &secret()).unwrap();
        chain.calls[0].arguments[0] = json!("mallory");
        assert!(!chain.verify_signature(&secret()).unwrap());
    }

    #[test]
    fn test_mutated_method_fails_verification() {
        let mut chain = CallStack::create_and_sign(vec![login_call("alice")], &secret()).unwrap();
        chain.calls[0].method_to_call.name = "loginAsAdmin".to_string();
        assert!(!chain.verify_signature(&secret()).unwrap());
    }

    #[test]
    fn test_dropped_call_fails_verification() {
        let calls = vec![login_call("alice"), login_call("bob")];
        let mut chain = CallStack::create_and_sign(calls, &secret()).unwrap();
        chain.calls.pop();
        assert!(!chain.verify_signature(&secret()).unwrap());
    }

    #[test]
    fn test_extended_chain_is_resigned() {
        let root = CallStack::root(&secret()).unwrap();
        assert!(root.is_empty());

        let next = root.extended(login_call("alice"), &secret()).unwrap();
        assert_eq!(next.calls, vec![login_call("alice")]);
        assert_ne!(next.signature, root.signature);
        assert!(next.verify_signature(&secret()).unwrap());
    }

    #[test]
    fn test_signature_survives_json_round_trip() {
        let chain = CallStack::create_and_sign(vec![login_call("alice")], &secret()).unwrap();
        let text = serde_json::to_string(&chain).unwrap();
        let parsed: CallStack = serde_json::from_str(&text).unwrap();
        assert!(parsed.verify_signature(&secret()).unwrap());
    }
}
