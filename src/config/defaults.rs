//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Listen address of `rodcall serve` (default: 127.0.0.1:8640)
    pub bind: String,

    /// Calls processed at once (default: 64)
    pub max_concurrent_calls: usize,

    /// Session credential lifetime (default: 1800 = 30 minutes)
    pub session_ttl_seconds: u64,

    /// How long shutdown waits for in-flight calls (default: 10)
    pub shutdown_timeout_seconds: u64,

    /// Log filter when `RUST_LOG` is unset (default: "info")
    pub log_level: String,

    /// Endpoint used by `rodcall call` (default: http://127.0.0.1:8640/)
    pub client_url: String,

    /// Client request timeout (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8640".to_string(),
            max_concurrent_calls: 64,
            session_ttl_seconds: 1800,
            shutdown_timeout_seconds: 10,
            log_level: "info".to_string(),
            client_url: "http://127.0.0.1:8640/".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "server": {
                "bind": self.bind,
                "max_concurrent_calls": self.max_concurrent_calls,
                "session_ttl_seconds": self.session_ttl_seconds,
                "shutdown_timeout_seconds": self.shutdown_timeout_seconds,
                "log_level": self.log_level
            },
            "client": {
                "url": self.client_url,
                "request_timeout_seconds": self.request_timeout_seconds
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.max_concurrent_calls, 64);
        assert_eq!(defaults.session_ttl_seconds, 1800);
        assert_eq!(defaults.log_level, "info");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["server"]["bind"], "127.0.0.1:8640");
        assert_eq!(value["client"]["request_timeout_seconds"], 30);
        // No default secret: one must be configured or generated.
        assert!(value["server"].get("secret").is_none());
    }
}
