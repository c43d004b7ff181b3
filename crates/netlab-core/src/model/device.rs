// ── Device domain types ──

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use strum::{Display, EnumString};

use super::entity_id::DeviceId;
use super::interface::{Interface, IpConfig, Media};

/// Kind of simulated node. Decides interface provisioning and routing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceKind {
    /// End host: PC, laptop, or anything else with a single address.
    #[serde(alias = "pc", alias = "laptop")]
    #[strum(to_string = "host", serialize = "pc", serialize = "laptop")]
    Host,
    Server,
    Switch,
    Router,
}

impl DeviceKind {
    /// Prefix used for generated display names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Host => "PC",
            Self::Server => "Server",
            Self::Switch => "Switch",
            Self::Router => "Router",
        }
    }

    /// Whether this kind may carry a default gateway.
    pub fn is_endpoint(self) -> bool {
        matches!(self, Self::Host | Self::Server)
    }

    /// Interfaces a fresh device of this kind is created with.
    pub fn provision(self, switch_ports: u16) -> Vec<Interface> {
        match self {
            Self::Router => vec![
                Interface::new("FastEthernet0/0", Media::Ethernet),
                Interface::new("FastEthernet0/1", Media::Ethernet),
                Interface::new("Serial0/0/0", Media::Serial),
                Interface::new("Serial0/0/1", Media::Serial),
            ],
            Self::Switch => (1..=switch_ports)
                .map(|n| Interface::new(format!("FastEthernet0/{n}"), Media::Ethernet))
                .collect(),
            Self::Host | Self::Server => vec![Interface::new("FastEthernet0", Media::Ethernet)],
        }
    }
}

/// Position on the editor canvas. Opaque to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A simulated network node and its interfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub name: String,
    pub position: Position,
    pub default_gateway: Option<Ipv4Addr>,
    pub interfaces: Vec<Interface>,
}

impl Device {
    pub fn is_router(&self) -> bool {
        self.kind == DeviceKind::Router
    }

    pub fn is_switch(&self) -> bool {
        self.kind == DeviceKind::Switch
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub(crate) fn interface_mut(&mut self, name: &str) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|i| i.name == name)
    }

    /// The single "device address" of an endpoint: the first interface's
    /// configuration.
    pub fn primary_ip(&self) -> Option<IpConfig> {
        self.interfaces.first().and_then(|i| i.ip)
    }

    /// Addresses this device answers on when reasoning about reachability.
    ///
    /// A router contributes every configured interface; any other device
    /// contributes only its primary address.
    pub fn addresses(&self) -> Vec<IpConfig> {
        if self.is_router() {
            self.interfaces.iter().filter_map(|i| i.ip).collect()
        } else {
            self.primary_ip().into_iter().collect()
        }
    }

    /// Whether some interface is configured with exactly `address`.
    pub fn owns_address(&self, address: Ipv4Addr) -> bool {
        self.interfaces
            .iter()
            .any(|i| i.ip.is_some_and(|ip| ip.address == address))
    }
}
