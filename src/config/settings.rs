//! Typed server and client settings.

use std::time::Duration;

use rodcall_protocol::Secret;
use rodcall_server::DispatcherConfig;
use serde::{Deserialize, Serialize};

use super::effective::ConfigError;

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base64 signing secret. Generated at startup when absent.
    #[serde(default)]
    pub secret: Option<String>,
    pub bind: String,
    pub max_concurrent_calls: usize,
    pub session_ttl_seconds: u64,
    pub shutdown_timeout_seconds: u64,
    pub log_level: String,
}

impl ServerConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_calls == 0 || self.max_concurrent_calls > 4096 {
            return Err(ConfigError::ValidationError(
                "server.max_concurrent_calls must be in [1, 4096]".to_string(),
            ));
        }
        if self.session_ttl_seconds == 0 || self.session_ttl_seconds > 7 * 86400 {
            return Err(ConfigError::ValidationError(
                "server.session_ttl_seconds must be in (0, 604800]".to_string(),
            ));
        }
        if self.shutdown_timeout_seconds > 600 {
            return Err(ConfigError::ValidationError(
                "server.shutdown_timeout_seconds must be at most 600".to_string(),
            ));
        }
        if let Some(secret) = &self.secret {
            Secret::from_base64(secret)
                .map_err(|e| ConfigError::ValidationError(format!("server.secret: {}", e)))?;
        }
        Ok(())
    }

    /// The configured secret, if any.
    pub fn secret(&self) -> Result<Option<Secret>, ConfigError> {
        self.secret
            .as_deref()
            .map(Secret::from_base64)
            .transpose()
            .map_err(|e| ConfigError::ValidationError(format!("server.secret: {}", e)))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    /// Dispatcher settings signed with `secret`.
    pub fn dispatcher_config(&self, secret: Secret) -> DispatcherConfig {
        DispatcherConfig {
            secret,
            max_concurrent_calls: self.max_concurrent_calls,
            session_ttl: chrono::Duration::seconds(self.session_ttl_seconds as i64),
        }
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    pub request_timeout_seconds: u64,
}

impl ClientConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "client.url must be an http(s) URL, got '{}'",
                self.url
            )));
        }
        if self.request_timeout_seconds == 0 || self.request_timeout_seconds > 3600 {
            return Err(ConfigError::ValidationError(
                "client.request_timeout_seconds must be in (0, 3600]".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerConfig {
        ServerConfig {
            secret: None,
            bind: "127.0.0.1:0".to_string(),
            max_concurrent_calls: 4,
            session_ttl_seconds: 60,
            shutdown_timeout_seconds: 5,
            log_level: "debug".to_string(),
        }
    }

    #[test]
    fn test_secret_must_be_base64() {
        let mut config = server();
        config.secret = Some("not base64!".to_string());
        assert!(config.validate().is_err());

        config.secret = Some(Secret::from("k").to_base64());
        assert!(config.validate().is_ok());
        assert_eq!(config.secret().unwrap(), Some(Secret::from("k")));
    }

    #[test]
    fn test_dispatcher_config() {
        let dispatcher = server().dispatcher_config(Secret::from("k"));
        assert_eq!(dispatcher.max_concurrent_calls, 4);
        assert_eq!(dispatcher.session_ttl, chrono::Duration::seconds(60));
    }

    #[test]
    fn test_client_url_validated() {
        let client = ClientConfig {
            url: "ftp://example".to_string(),
            request_timeout_seconds: 5,
        };
        assert!(client.validate().is_err());
    }
}
