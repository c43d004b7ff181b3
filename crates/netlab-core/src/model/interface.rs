// ── Interface domain types ──

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use strum::{Display, EnumString};

use super::entity_id::Endpoint;
use crate::address;

/// Physical medium of an interface.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Media {
    #[default]
    Ethernet,
    Serial,
    Console,
}

/// Negotiated state of a cabled interface. Meaningless without a peer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkState {
    #[default]
    Down,
    Up,
}

/// An address together with the mask of the interface that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpConfig {
    pub address: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl IpConfig {
    pub fn new(address: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self { address, mask }
    }

    /// Whether `other` lies in this interface's subnet, judged by this mask.
    pub fn contains(&self, other: Ipv4Addr) -> bool {
        address::same_subnet(self.address, other, self.mask)
    }

    pub fn network(&self) -> Ipv4Addr {
        address::network_address(self.address, self.mask)
    }

    pub fn prefix_length(&self) -> u32 {
        address::prefix_length(self.mask)
    }
}

impl std::fmt::Display for IpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length())
    }
}

/// A named connection point on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub media: Media,
    pub ip: Option<IpConfig>,
    pub peer: Option<Endpoint>,
    pub link_state: LinkState,
}

impl Interface {
    pub fn new(name: impl Into<String>, media: Media) -> Self {
        Self {
            name: name.into(),
            media,
            ip: None,
            peer: None,
            link_state: LinkState::Down,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    pub fn is_up(&self) -> bool {
        self.peer.is_some() && self.link_state == LinkState::Up
    }
}
