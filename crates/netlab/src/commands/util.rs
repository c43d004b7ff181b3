//! Shared helpers for command handlers.

use netlab_core::{Device, DeviceId, Endpoint, Lab, Topology};

use crate::error::CliError;

/// Resolve a device identifier (numeric ID or name) via snapshot lookup.
pub fn resolve_device(lab: &Lab, identifier: &str) -> Result<Device, CliError> {
    lab.find_device(identifier).ok_or_else(|| CliError::NotFound {
        resource_type: "device".into(),
        identifier: identifier.into(),
        list_command: "devices list".into(),
    })
}

/// Parse `DEVICE:INTERFACE`. The interface is the text after the last
/// colon, so device names may themselves contain colons.
pub fn resolve_endpoint(lab: &Lab, arg: &str) -> Result<(DeviceId, String), CliError> {
    let (device, interface) = arg
        .rsplit_once(':')
        .filter(|(d, i)| !d.is_empty() && !i.is_empty())
        .ok_or_else(|| CliError::Validation {
            field: "endpoint".into(),
            reason: format!("expected DEVICE:INTERFACE, got '{arg}'"),
        })?;
    let device = resolve_device(lab, device)?;
    if device.interface(interface).is_none() {
        return Err(CliError::NotFound {
            resource_type: "interface".into(),
            identifier: format!("{}:{interface}", device.name),
            list_command: format!("iface list {}", device.id),
        });
    }
    Ok((device.id, interface.to_owned()))
}

/// `name:interface` for display, falling back to the raw endpoint.
pub fn endpoint_label(topology: &Topology, end: &Endpoint) -> String {
    topology.device(end.device).map_or_else(
        || end.to_string(),
        |d| format!("{}:{}", d.name, end.interface),
    )
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|_| CliError::NonInteractiveRequiresYes {
            action: action.into(),
        })
}

/// Show `-` for absent values in detail views.
pub fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".into())
}
