// ── Core error types ──
//
// Errors raised by topology mutations and project persistence.
// Reachability queries never produce these: a failed ping is a
// classified `PingFailure` carried inside a `PingReport`.

use thiserror::Error;

use crate::address::AddressError;
use crate::model::{DeviceId, DeviceKind};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Interface {interface} not found on device {device}")]
    InterfaceNotFound { device: DeviceId, interface: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Device ids are exhausted; no id after {last} is available")]
    IdsExhausted { last: DeviceId },

    // ── Addressing errors ────────────────────────────────────────────
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    #[error("Address and mask must be configured together on {interface}")]
    IncompleteAddress { interface: String },

    #[error("Device {device} is a switch; switch ports cannot carry an IP address")]
    SwitchAddressing { device: DeviceId },

    #[error("Device {device} is a {kind}; only hosts and servers use a default gateway")]
    GatewayNotSupported { device: DeviceId, kind: DeviceKind },

    // ── Cabling errors ───────────────────────────────────────────────
    #[error("Cannot cable interface {interface} on device {device} to the same device")]
    SelfLoop { device: DeviceId, interface: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Invalid project file: {message}")]
    InvalidProject { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn invalid_project(message: impl Into<String>) -> Self {
        Self::InvalidProject {
            message: message.into(),
        }
    }
}
