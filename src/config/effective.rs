//! Effective configuration with provenance
//!
//! The merged configuration document plus the list of layers that
//! contributed to it. Printing goes through [`EffectiveConfig::redacted`]
//! so the signing secret never reaches logs or terminals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::settings::{ClientConfig, ServerConfig};

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged configuration.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    config: Value,
}

/// Printable form of an [`EffectiveConfig`].
#[derive(Debug, Serialize)]
pub struct RedactedConfig {
    pub created_at: DateTime<Utc>,
    pub config: Value,
    pub sources: Vec<ConfigSource>,
    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &["secret", "password", "token", "key"];

impl EffectiveConfig {
    /// Build effective config from defaults, an optional TOML file and CLI overrides.
    ///
    /// A file path that does not exist is an error; it was asked for explicitly.
    pub fn build(
        config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = config_path {
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let config = Self {
            created_at: Utc::now(),
            sources,
            config: merge_layers(layers),
        };
        // Surface bad values at load time rather than at first use.
        config.server()?;
        config.client()?;
        Ok(config)
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;
        let value: Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((value, digest))
    }

    /// Server settings.
    pub fn server(&self) -> Result<ServerConfig, ConfigError> {
        let section = self.config.get("server").cloned().unwrap_or(Value::Null);
        let server: ServerConfig = serde_json::from_value(section)
            .map_err(|e| ConfigError::ParseError(format!("[server]: {}", e)))?;
        server.validate()?;
        Ok(server)
    }

    /// Client settings.
    pub fn client(&self) -> Result<ClientConfig, ConfigError> {
        let section = self.config.get("client").cloned().unwrap_or(Value::Null);
        let client: ClientConfig = serde_json::from_value(section)
            .map_err(|e| ConfigError::ParseError(format!("[client]: {}", e)))?;
        client.validate()?;
        Ok(client)
    }

    /// Copy of the configuration with secret values replaced.
    pub fn redacted(&self) -> RedactedConfig {
        let mut config = self.config.clone();
        let mut redactions = Vec::new();
        redact_recursive(&mut config, String::new(), &mut redactions);
        RedactedConfig {
            created_at: self.created_at,
            config,
            sources: self.sources.clone(),
            redactions,
        }
    }
}

fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let current_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                let key_lower = key.to_lowercase();
                let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));

                if is_secret && !val.is_object() && !val.is_array() {
                    *val = Value::String("[REDACTED]".to_string());
                    redactions.push(current_path);
                } else {
                    redact_recursive(val, current_path, redactions);
                }
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter_mut().enumerate() {
                redact_recursive(val, format!("{}[{}]", path, i), redactions);
            }
        }
        _ => {}
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
        let server = config.server().unwrap();
        assert_eq!(server.max_concurrent_calls, 64);
        assert!(server.secret.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[server]").unwrap();
        writeln!(temp, "bind = \"0.0.0.0:9000\"").unwrap();
        writeln!(temp, "session_ttl_seconds = 120").unwrap();

        let cli = serde_json::json!({"server": {"bind": "127.0.0.1:9001"}});
        let config = EffectiveConfig::build(Some(temp.path()), Some(cli)).unwrap();

        let server = config.server().unwrap();
        assert_eq!(server.bind, "127.0.0.1:9001");
        assert_eq!(server.session_ttl_seconds, 120);
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[1].digest.as_ref().map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = EffectiveConfig::build(Some(Path::new("/nonexistent/rodcall.toml")), None);
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let cli = serde_json::json!({"server": {"max_concurrent_calls": 0}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_calls"));
    }

    #[test]
    fn test_secret_redaction() {
        let cli = serde_json::json!({"server": {"secret": "c2VjcmV0"}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        let redacted = config.redacted();
        assert_eq!(redacted.config["server"]["secret"], "[REDACTED]");
        assert_eq!(redacted.redactions, vec!["server.secret".to_string()]);
        // The live config keeps the real value.
        assert_eq!(config.config["server"]["secret"], "c2VjcmV0");
    }
}
