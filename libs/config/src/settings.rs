//! Tuple Space Settings
//!
//! Every field has a default so an empty file, or no file at all, is a valid
//! configuration.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix, e.g. `TUPLESPACE__ROUTER__NODE_ID`
pub const ENV_PREFIX: &str = "TUPLESPACE";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TupleSpaceConfig {
    pub router: RouterSettings,
    pub promise: PromiseSettings,
    pub logging: LoggingSettings,
    pub hydra: HydraSettings,
    pub world_access: WorldAccessSettings,
}

/// How much of each routed tuple the router logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TupleLogMode {
    #[default]
    Off,
    /// One-line summary per tuple
    Brief,
    /// Full multi-line dump per tuple
    Full,
}

/// Router identity and traffic logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterSettings {
    pub name: String,
    /// This node's ID; tuples addressed to it are not sent out again
    pub node_id: Option<String>,
    pub log_tuples: TupleLogMode,
    /// Tuple types never traffic-logged
    pub quiet_tuple_types: Vec<String>,
    /// Router and route names never traffic-logged
    pub quiet_names: Vec<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            name: "router".to_string(),
            node_id: None,
            log_tuples: TupleLogMode::Off,
            quiet_tuple_types: vec!["Tick".to_string(), "Time".to_string()],
            quiet_names: vec!["Hydra".to_string()],
        }
    }
}

impl RouterSettings {
    /// Should traffic through `name` carrying `tuple_type` be logged?
    pub fn logs_traffic(&self, name: &str, tuple_type: &str) -> bool {
        self.log_tuples != TupleLogMode::Off
            && !self.quiet_names.iter().any(|quiet| quiet == name)
            && !self.quiet_tuple_types.iter().any(|quiet| quiet == tuple_type)
    }
}

/// Blocking call timing for `Future::get`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PromiseSettings {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PromiseSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            timeout_ms: 10_000,
        }
    }
}

impl PromiseSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Background pump thread settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HydraSettings {
    pub router_name: String,
    pub node_id: String,
    pub thread_name: String,
}

impl Default for HydraSettings {
    fn default() -> Self {
        Self {
            router_name: "Hydra".to_string(),
            node_id: "hydra".to_string(),
            thread_name: "hydra".to_string(),
        }
    }
}

/// World access filter policy inputs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldAccessSettings {
    /// Source actors whose tuples are accepted from any joined client
    pub open_source_actors: Vec<String>,
    pub asset_loader_actor: String,
    /// World whose assets any authenticated client may request
    pub shared_assets_world_id: Option<String>,
}

impl Default for WorldAccessSettings {
    fn default() -> Self {
        Self {
            open_source_actors: vec![
                "TelegramLoader".to_string(),
                "WorldLoader".to_string(),
                "InviteFriendClient".to_string(),
            ],
            asset_loader_actor: "AssetLoader".to_string(),
            shared_assets_world_id: None,
        }
    }
}

impl TupleSpaceConfig {
    /// Load configuration from an optional TOML file with environment overrides
    ///
    /// Environment variables use the `TUPLESPACE` prefix and `__` as the
    /// section separator, e.g. `TUPLESPACE__PROMISE__TIMEOUT_MS=500`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading tuple space config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        let mut settings: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        settings.expand_env_vars()?;
        debug!("Tuple space config: {:?}", settings);
        Ok(settings)
    }

    /// Parse inline TOML without consulting the environment
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(input).context("Invalid tuple space TOML")?;
        settings.expand_env_vars()?;
        Ok(settings)
    }

    /// Expand `$VAR` references in node IDs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(node_id) = &self.router.node_id {
            let expanded =
                shellexpand::env(node_id).context("Failed to expand router node ID")?;
            self.router.node_id = Some(expanded.to_string());
        }

        let expanded =
            shellexpand::env(&self.hydra.node_id).context("Failed to expand hydra node ID")?;
        self.hydra.node_id = expanded.to_string();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TupleSpaceConfig::from_toml_str("").unwrap();
        assert_eq!(config, TupleSpaceConfig::default());
        assert_eq!(config.promise.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.promise.timeout(), Duration::from_secs(10));
        assert_eq!(config.router.quiet_tuple_types, vec!["Tick", "Time"]);
        assert_eq!(config.hydra.router_name, "Hydra");
        assert!(config.router.node_id.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = TupleSpaceConfig::from_toml_str(
            r#"
            [router]
            name = "client"
            node_id = "node-a"
            log_tuples = "full"

            [promise]
            timeout_ms = 250

            [world_access]
            shared_assets_world_id = "lobby"
            "#,
        )
        .unwrap();

        assert_eq!(config.router.name, "client");
        assert_eq!(config.router.node_id.as_deref(), Some("node-a"));
        assert_eq!(config.router.log_tuples, TupleLogMode::Full);
        assert_eq!(config.router.quiet_names, vec!["Hydra"]);
        assert_eq!(config.promise.timeout_ms, 250);
        assert_eq!(config.promise.poll_interval_ms, 10);
        assert_eq!(
            config.world_access.shared_assets_world_id.as_deref(),
            Some("lobby")
        );
        assert_eq!(config.world_access.asset_loader_actor, "AssetLoader");
    }

    #[test]
    fn test_logs_traffic_honours_quiet_lists() {
        let mut router = RouterSettings::default();
        assert!(!router.logs_traffic("client", "Ping"));

        router.log_tuples = TupleLogMode::Brief;
        assert!(router.logs_traffic("client", "Ping"));
        assert!(!router.logs_traffic("client", "Tick"));
        assert!(!router.logs_traffic("Hydra", "Ping"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tuplespace.toml");
        fs::write(
            &path,
            r#"
            [hydra]
            node_id = "pump-1"
            thread_name = "pump"

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();

        let config = TupleSpaceConfig::load(Some(&path)).unwrap();
        assert_eq!(config.hydra.node_id, "pump-1");
        assert_eq!(config.hydra.thread_name, "pump");
        assert_eq!(config.hydra.router_name, "Hydra");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let result = TupleSpaceConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_mode_rejected() {
        let result = TupleSpaceConfig::from_toml_str("[router]\nlog_tuples = \"loud\"\n");
        assert!(result.is_err());
    }
}
