//! Configuration merge system
//!
//! Server and client settings are merged from three layers:
//! 1. Built-in defaults
//! 2. A TOML config file (`--config`)
//! 3. CLI flags
//!
//! The merged document is deserialized into [`ServerConfig`] and
//! [`ClientConfig`]; secrets are redacted whenever it is printed.

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, RedactedConfig};
pub use merge::{deep_merge, merge_layers};
pub use settings::{ClientConfig, ServerConfig};
