//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netlab_config::ConfigError;
use netlab_core::{AddressError, CoreError, PingFailure};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const UNREACHABLE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netlab::not_found),
        help("Run: netlab {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(netlab::conflict),
        help("Run: netlab links to see existing cables, or netlab disconnect first")
    )]
    Conflict { message: String },

    // ── Reachability ─────────────────────────────────────────────────
    #[error("{source_device} cannot reach {target_device}: {failure}")]
    #[diagnostic(
        code(netlab::unreachable),
        help("Run: netlab trace {source_device} {target_device} for the route taken")
    )]
    Unreachable {
        source_device: String,
        target_device: String,
        failure: PingFailure,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netlab::validation))]
    Validation { field: String, reason: String },

    // ── Project file ─────────────────────────────────────────────────
    #[error("No project file selected")]
    #[diagnostic(
        code(netlab::no_project),
        help(
            "Pass --project <FILE>, set NETLAB_PROJECT, or set defaults.project in\n\
             {config_path}"
        )
    )]
    NoProject { config_path: String },

    #[error("Project file {path} does not exist")]
    #[diagnostic(
        code(netlab::project_missing),
        help("Create it with: netlab --project {path} project init")
    )]
    ProjectMissing { path: String },

    #[error("{path} already exists")]
    #[diagnostic(code(netlab::file_exists), help("Use --force to overwrite it."))]
    FileExists { path: String },

    #[error("Project file is invalid: {message}")]
    #[diagnostic(code(netlab::invalid_project))]
    InvalidProject { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(netlab::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netlab::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(netlab::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(netlab::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::ProjectMissing { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::FileExists { .. } => exit_code::CONFLICT,
            Self::Unreachable { .. } => exit_code::UNREACHABLE,
            Self::Validation { .. }
            | Self::NoProject { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::InterfaceNotFound { device, interface } => CliError::NotFound {
                resource_type: "interface".into(),
                identifier: interface,
                list_command: format!("iface list {device}"),
            },

            err @ CoreError::IdsExhausted { .. } => CliError::Internal(err.to_string()),

            CoreError::InvalidAddress(err) => {
                let field = match err {
                    AddressError::NonContiguousMask { .. } => "mask",
                    AddressError::Malformed { .. } => "address",
                };
                CliError::Validation {
                    field: field.into(),
                    reason: err.to_string(),
                }
            }

            CoreError::IncompleteAddress { interface } => CliError::Validation {
                field: "address".into(),
                reason: format!("{interface} needs both an address and a mask"),
            },

            err @ (CoreError::SwitchAddressing { .. }
            | CoreError::GatewayNotSupported { .. }
            | CoreError::SelfLoop { .. }) => CliError::Validation {
                field: "device".into(),
                reason: err.to_string(),
            },

            CoreError::InvalidProject { message } => CliError::InvalidProject { message },

            CoreError::Json(err) => CliError::InvalidProject {
                message: err.to_string(),
            },

            CoreError::Io(err) => CliError::Io(err),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
