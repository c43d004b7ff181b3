// ── Core identity types ──
//
// DeviceId and Endpoint identify everything a cable can touch.
// Ids are assigned monotonically by the topology and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

// ── DeviceId ────────────────────────────────────────────────────────

/// Identifier of a device within one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id after this one, or `None` once the id space is exhausted.
    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// ── Endpoint ────────────────────────────────────────────────────────

/// One end of a cable: a device plus the name of one of its interfaces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub device: DeviceId,
    pub interface: String,
}

impl Endpoint {
    pub fn new(device: DeviceId, interface: impl Into<String>) -> Self {
        Self {
            device,
            interface: interface.into(),
        }
    }
}

impl<S: Into<String>> From<(DeviceId, S)> for Endpoint {
    fn from((device, interface): (DeviceId, S)) -> Self {
        Self::new(device, interface)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.interface)
    }
}

// ── LinkKey ─────────────────────────────────────────────────────────

/// Direction-independent identity of a cable.
///
/// The two endpoints are stored in sorted order so that connecting A to B
/// and B to A produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    a: Endpoint,
    b: Endpoint,
}

impl LinkKey {
    pub fn new(x: Endpoint, y: Endpoint) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn first(&self) -> &Endpoint {
        &self.a
    }

    pub fn second(&self) -> &Endpoint {
        &self.b
    }

    pub fn touches(&self, device: DeviceId) -> bool {
        self.a.device == device || self.b.device == device
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}
