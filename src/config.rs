//! Role engine configuration.
//!
//! Loaded from YAML, then optionally overlaid from the environment:
//!
//! ```yaml
//! probe_depth: 10
//! action_paths:
//!   - app::actions
//! patterns: [controller, listener, command, object]
//! default_queue: default
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::Capability;
use crate::error::ConfigError;
use crate::patterns::DEFAULT_ORDER;
use crate::registry::DEFAULT_PROBE_DEPTH;

/// Environment variable overriding `probe_depth`.
pub const ENV_PROBE_DEPTH: &str = "ACTIONS_PROBE_DEPTH";
/// Environment variable overriding `action_paths`, comma separated.
pub const ENV_ACTION_PATHS: &str = "ACTIONS_PATHS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Frames inspected when identifying the active role.
    pub probe_depth: usize,
    /// Module paths the registrars scan for action classes.
    pub action_paths: Vec<String>,
    /// Capabilities whose patterns are registered, in tie-break order.
    pub patterns: Vec<Capability>,
    /// Queue for jobs that declare none.
    pub default_queue: Option<String>,
    /// Connection for jobs that declare none.
    pub default_connection: Option<String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            probe_depth: DEFAULT_PROBE_DEPTH,
            action_paths: vec!["app::actions".to_string()],
            patterns: DEFAULT_ORDER.to_vec(),
            default_queue: None,
            default_connection: None,
        }
    }
}

impl ActionsConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Defaults overlaid from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`, which maps a variable name to its value.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PROBE_DEPTH) {
            self.probe_depth = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_PROBE_DEPTH.to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(ENV_ACTION_PATHS) {
            self.action_paths = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ActionsConfig::default();
        assert_eq!(config.probe_depth, 10);
        assert_eq!(config.action_paths, vec!["app::actions"]);
        assert_eq!(config.patterns, DEFAULT_ORDER.to_vec());
        assert!(config.default_queue.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ActionsConfig::from_yaml("probe_depth: 4\npatterns: [command, controller]\n").unwrap();
        assert_eq!(config.probe_depth, 4);
        assert_eq!(config.patterns, vec![Capability::Command, Capability::Controller]);
        assert_eq!(config.action_paths, vec!["app::actions"]);
    }

    #[test]
    fn test_unknown_capability_is_rejected() {
        let err = ActionsConfig::from_yaml("patterns: [teleport]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_queue: emails\ndefault_connection: redis").unwrap();

        let config = ActionsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_queue.as_deref(), Some("emails"));
        assert_eq!(config.default_connection.as_deref(), Some("redis"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ActionsConfig::from_file(dir.path().join("actions.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            (ENV_PROBE_DEPTH, "25"),
            (ENV_ACTION_PATHS, "app::actions, billing::actions,"),
        ]
        .into_iter()
        .collect();

        let mut config = ActionsConfig::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.probe_depth, 25);
        assert_eq!(config.action_paths, vec!["app::actions", "billing::actions"]);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = ActionsConfig::default();
        let err = config
            .apply_env_from(|key| (key == ENV_PROBE_DEPTH).then(|| "deep".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref value, .. } if value == "deep"));
    }
}
