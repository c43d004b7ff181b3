//! CLI configuration: a thin wrapper around `netlab_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--project, --output, --color).

use std::path::PathBuf;

use clap::ValueEnum;
use tracing::warn;

use netlab_core::LabConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netlab_config::{Config, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// The project file to operate on (flag > env > config).
pub fn resolve_project(global: &GlobalOpts, config: &Config) -> Result<PathBuf, CliError> {
    global
        .project
        .clone()
        .or_else(|| config.defaults.project.clone())
        .ok_or_else(|| CliError::NoProject {
            config_path: config_path().display().to_string(),
        })
}

pub fn resolve_output(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or_else(|_| {
            warn!(value = %config.defaults.output, "unknown defaults.output, using table");
            OutputFormat::Table
        })
    })
}

pub fn resolve_color(global: &GlobalOpts, config: &Config) -> ColorMode {
    global.color.unwrap_or_else(|| {
        ColorMode::from_str(&config.defaults.color, true).unwrap_or_else(|_| {
            warn!(value = %config.defaults.color, "unknown defaults.color, using auto");
            ColorMode::Auto
        })
    })
}

pub fn lab_config(config: &Config) -> Result<LabConfig, CliError> {
    Ok(config.lab.to_lab_config()?)
}
