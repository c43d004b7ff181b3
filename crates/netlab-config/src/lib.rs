//! Shared configuration for netlab front ends.
//!
//! TOML file plus `NETLAB_` environment overrides, and translation to
//! `netlab_core::LabConfig`. The CLI layers its `GlobalOpts` on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netlab_core::LabConfig;
use netlab_core::config::{DEFAULT_SETTLE_DELAY, DEFAULT_SWITCH_PORTS};

/// Upper bound for the settle delay; anything longer is a typo.
const MAX_SETTLE_MS: u64 = 60_000;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output and project defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Engine tuning.
    #[serde(default)]
    pub lab: LabSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Project file used when `--project` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            project: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LabSettings {
    /// Milliseconds a new cable stays down before coming up.
    #[serde(default = "default_settle_ms")]
    pub link_settle_ms: u64,

    /// Ports provisioned on a new switch.
    #[serde(default = "default_switch_ports")]
    pub switch_ports: u16,

    /// Treat cables that are still negotiating as unplugged.
    #[serde(default)]
    pub link_state_gates_routing: bool,
}

impl Default for LabSettings {
    fn default() -> Self {
        Self {
            link_settle_ms: default_settle_ms(),
            switch_ports: default_switch_ports(),
            link_state_gates_routing: false,
        }
    }
}

fn default_settle_ms() -> u64 {
    u64::try_from(DEFAULT_SETTLE_DELAY.as_millis()).unwrap_or(1500)
}
fn default_switch_ports() -> u16 {
    DEFAULT_SWITCH_PORTS
}

impl LabSettings {
    /// Validate and translate into the engine's configuration.
    pub fn to_lab_config(&self) -> Result<LabConfig, ConfigError> {
        if self.link_settle_ms > MAX_SETTLE_MS {
            return Err(ConfigError::Validation {
                field: "lab.link_settle_ms".into(),
                reason: format!("must be at most {MAX_SETTLE_MS}, got {}", self.link_settle_ms),
            });
        }
        if self.switch_ports == 0 {
            return Err(ConfigError::Validation {
                field: "lab.switch_ports".into(),
                reason: "a switch needs at least one port".into(),
            });
        }
        Ok(LabConfig {
            settle_delay: Duration::from_millis(self.link_settle_ms),
            switch_ports: self.switch_ports,
            link_state_gates_routing: self.link_state_gates_routing,
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "netlab", "netlab").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netlab");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETLAB_").split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.lab, LabSettings::default());
        assert_eq!(cfg.lab.to_lab_config().unwrap(), LabConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\noutput = \"json\"\n\n[lab]\nlink_settle_ms = 250\nlink_state_gates_routing = true\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");
        let lab = cfg.lab.to_lab_config().unwrap();
        assert_eq!(lab.settle_delay, Duration::from_millis(250));
        assert_eq!(lab.switch_ports, DEFAULT_SWITCH_PORTS);
        assert!(lab.link_state_gates_routing);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.defaults.project = Some(PathBuf::from("/tmp/office.json"));
        cfg.lab.switch_ports = 24;

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let too_slow = LabSettings {
            link_settle_ms: MAX_SETTLE_MS + 1,
            ..LabSettings::default()
        };
        assert!(matches!(
            too_slow.to_lab_config(),
            Err(ConfigError::Validation { .. })
        ));

        let portless = LabSettings {
            switch_ports: 0,
            ..LabSettings::default()
        };
        assert!(portless.to_lab_config().is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[lab]\nswitch_ports = \"many\"\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
    }
}
