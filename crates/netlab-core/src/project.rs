// ── Project persistence ──
//
// The save/load boundary. Records are deliberately loose (strings, optional
// fields) so older files still parse; `into_topology` validates everything
// before a `Topology` is built, and rejects files that would break cable
// symmetry or carry malformed addresses.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::address;
use crate::config::DEFAULT_SWITCH_PORTS;
use crate::error::CoreError;
use crate::model::{
    Device, DeviceId, DeviceKind, Endpoint, Interface, IpConfig, LinkState, Media, Position,
};
use crate::store::Topology;

pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// Serialized form of a whole topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_id: u32,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub default_gateway: String,
    /// Address of the first interface, kept for single-address endpoints.
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub subnet_mask: String,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(default, rename = "type")]
    pub media: Media,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub subnet_mask: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<PeerRecord>,
    #[serde(default)]
    pub link_state: LinkState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    pub device_id: u32,
    pub interface: String,
}

impl ProjectFile {
    /// Snapshot a topology for saving.
    pub fn from_topology(topology: &Topology) -> Self {
        Self {
            version: FORMAT_VERSION,
            saved_at: Some(Utc::now()),
            next_id: topology.next_id().get(),
            devices: topology.devices().map(DeviceRecord::from_device).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        let project = Self::from_json(&contents)?;
        debug!(path = %path.display(), devices = project.devices.len(), "project loaded");
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), devices = self.devices.len(), "project saved");
        Ok(())
    }

    /// Validate every record and build the topology.
    pub fn into_topology(self) -> Result<Topology, CoreError> {
        if self.version > FORMAT_VERSION {
            return Err(CoreError::invalid_project(format!(
                "format version {} is newer than supported version {FORMAT_VERSION}",
                self.version
            )));
        }

        let mut seen = HashSet::new();
        for record in &self.devices {
            if !seen.insert(record.id) {
                return Err(CoreError::invalid_project(format!(
                    "duplicate device id {}",
                    record.id
                )));
            }
        }

        let devices = self
            .devices
            .into_iter()
            .map(DeviceRecord::into_device)
            .collect::<Result<Vec<_>, _>>()?;
        check_peers(&devices)?;

        let max_id = devices.iter().map(|d| d.id.get()).max().unwrap_or(0);
        let after_max = max_id.checked_add(1).ok_or_else(|| {
            CoreError::invalid_project(format!("device id {max_id} leaves no room for new devices"))
        })?;
        let next_id = self.next_id.max(after_max).max(1);
        if next_id == u32::MAX {
            return Err(CoreError::invalid_project(format!(
                "next id {next_id} leaves no room for new devices"
            )));
        }
        Ok(Topology::from_parts(devices, DeviceId::new(next_id)))
    }
}

impl DeviceRecord {
    fn from_device(device: &Device) -> Self {
        let (ip_address, subnet_mask) = match device.primary_ip() {
            Some(ip) if device.kind.is_endpoint() => (ip.address.to_string(), ip.mask.to_string()),
            _ => (String::new(), String::new()),
        };
        Self {
            id: device.id.get(),
            kind: device.kind,
            name: device.name.clone(),
            x: device.position.x,
            y: device.position.y,
            default_gateway: device
                .default_gateway
                .map(|g| g.to_string())
                .unwrap_or_default(),
            ip_address,
            subnet_mask,
            interfaces: device
                .interfaces
                .iter()
                .map(InterfaceRecord::from_interface)
                .collect(),
        }
    }

    fn into_device(self) -> Result<Device, CoreError> {
        let id = DeviceId::new(self.id);
        let context = |message: String| CoreError::invalid_project(format!("device {id}: {message}"));

        if self.kind.is_endpoint() && self.interfaces.len() > 1 {
            return Err(context(format!(
                "a {} has exactly one interface, found {}",
                self.kind,
                self.interfaces.len()
            )));
        }

        let mut interfaces = if self.interfaces.is_empty() {
            warn!(%id, kind = %self.kind, "device saved without interfaces, provisioning defaults");
            self.kind.provision(DEFAULT_SWITCH_PORTS)
        } else {
            let mut names = HashSet::new();
            let mut interfaces = Vec::with_capacity(self.interfaces.len());
            for record in self.interfaces {
                if !names.insert(record.name.clone()) {
                    return Err(context(format!("duplicate interface {}", record.name)));
                }
                interfaces.push(record.into_interface().map_err(|e| context(e.to_string()))?);
            }
            interfaces
        };

        // Older files only carry the endpoint address at device level.
        if let Some(first) = interfaces.first_mut() {
            if first.ip.is_none() && !self.ip_address.is_empty() {
                first.ip = parse_ip(&self.ip_address, &self.subnet_mask, "ipAddress/subnetMask")
                    .map_err(|e| context(e.to_string()))?;
            }
        }

        if self.kind == DeviceKind::Switch && interfaces.iter().any(|i| i.ip.is_some()) {
            return Err(context("switch ports cannot carry IP addresses".into()));
        }

        let default_gateway = if self.default_gateway.is_empty() {
            None
        } else if self.kind.is_endpoint() {
            Some(address::parse_address(&self.default_gateway).map_err(|e| context(e.to_string()))?)
        } else {
            warn!(%id, kind = %self.kind, "ignoring default gateway on non-endpoint device");
            None
        };

        let name = if self.name.is_empty() {
            format!("{}{id}", self.kind.label())
        } else {
            self.name
        };

        Ok(Device {
            id,
            kind: self.kind,
            name,
            position: Position::new(self.x, self.y),
            default_gateway,
            interfaces,
        })
    }
}

impl InterfaceRecord {
    fn from_interface(iface: &Interface) -> Self {
        let (ip_address, subnet_mask) = iface
            .ip
            .map(|ip| (ip.address.to_string(), ip.mask.to_string()))
            .unwrap_or_default();
        Self {
            name: iface.name.clone(),
            media: iface.media,
            ip_address,
            subnet_mask,
            connected_to: iface.peer.as_ref().map(|p| PeerRecord {
                device_id: p.device.get(),
                interface: p.interface.clone(),
            }),
            link_state: iface.link_state,
        }
    }

    fn into_interface(self) -> Result<Interface, CoreError> {
        let ip = parse_ip(&self.ip_address, &self.subnet_mask, &self.name)?;
        let peer = self
            .connected_to
            .map(|p| Endpoint::new(DeviceId::new(p.device_id), p.interface));
        let link_state = if peer.is_some() {
            self.link_state
        } else {
            LinkState::Down
        };
        Ok(Interface {
            name: self.name,
            media: self.media,
            ip,
            peer,
            link_state,
        })
    }
}

/// `owner` names what carries the pair: an interface, or the device-level
/// legacy fields.
fn parse_ip(address: &str, mask: &str, owner: &str) -> Result<Option<IpConfig>, CoreError> {
    match (address.is_empty(), mask.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(IpConfig::new(
            address::parse_address(address)?,
            address::parse_mask(mask)?,
        ))),
        _ => Err(CoreError::IncompleteAddress {
            interface: owner.to_owned(),
        }),
    }
}

/// Every peer must exist and point back at the interface referencing it.
fn check_peers(devices: &[Device]) -> Result<(), CoreError> {
    let find = |end: &Endpoint| {
        devices
            .iter()
            .find(|d| d.id == end.device)
            .and_then(|d| d.interface(&end.interface))
    };

    for device in devices {
        for iface in &device.interfaces {
            let Some(peer) = &iface.peer else { continue };
            let here = Endpoint::new(device.id, iface.name.clone());
            if peer.device == device.id {
                return Err(CoreError::invalid_project(format!("{here} is cabled to its own device")));
            }
            let Some(remote) = find(peer) else {
                return Err(CoreError::invalid_project(format!(
                    "{here} is cabled to missing interface {peer}"
                )));
            };
            if remote.peer.as_ref() != Some(&here) {
                return Err(CoreError::invalid_project(format!(
                    "{here} is cabled to {peer}, which does not point back"
                )));
            }
            if remote.media != iface.media {
                warn!(link = %here, peer = %peer, "saved cable joins different media");
            }
        }
    }
    Ok(())
}
