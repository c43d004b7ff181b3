// ── Topology store ──
//
// Owns every device and keeps cable references symmetric: each mutation
// that touches a peer updates both ends before returning.

use std::net::Ipv4Addr;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::address;
use crate::error::CoreError;
use crate::model::{
    Device, DeviceId, DeviceKind, Endpoint, Interface, IpConfig, LinkKey, LinkState, Media,
    Position,
};
use crate::reachability::AdjacencyGraph;

/// A cable between two interfaces, as seen from outside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub key: LinkKey,
    pub media: (Media, Media),
    pub state: LinkState,
}

impl Link {
    /// Cables joining different media are tolerated but flagged.
    pub fn media_mismatch(&self) -> bool {
        self.media.0 != self.media.1
    }
}

/// The device collection plus the derived physical adjacency view.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    devices: IndexMap<DeviceId, Device>,
    next_id: DeviceId,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    pub fn new() -> Self {
        Self {
            devices: IndexMap::new(),
            next_id: DeviceId::new(1),
        }
    }

    /// Rebuild a topology from already-validated parts.
    pub(crate) fn from_parts(devices: Vec<Device>, next_id: DeviceId) -> Self {
        Self {
            devices: devices.into_iter().map(|d| (d.id, d)).collect(),
            next_id,
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn next_id(&self) -> DeviceId {
        self.next_id
    }

    /// Resolve a device by numeric id first, then by exact name, then by
    /// case-insensitive name.
    pub fn find_device(&self, identifier: &str) -> Option<&Device> {
        if let Ok(id) = identifier.parse::<DeviceId>() {
            if let Some(device) = self.devices.get(&id) {
                return Some(device);
            }
        }
        self.devices
            .values()
            .find(|d| d.name == identifier)
            .or_else(|| {
                self.devices
                    .values()
                    .find(|d| d.name.eq_ignore_ascii_case(identifier))
            })
    }

    /// The router owning an interface configured with `address`.
    pub fn router_owning(&self, address: Ipv4Addr) -> Option<&Device> {
        self.devices
            .values()
            .find(|d| d.is_router() && d.owns_address(address))
    }

    fn device_or_err(&self, id: DeviceId) -> Result<&Device, CoreError> {
        self.devices.get(&id).ok_or_else(|| CoreError::DeviceNotFound {
            identifier: id.to_string(),
        })
    }

    fn device_mut_or_err(&mut self, id: DeviceId) -> Result<&mut Device, CoreError> {
        self.devices
            .get_mut(&id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: id.to_string(),
            })
    }

    fn interface_or_err(&self, id: DeviceId, name: &str) -> Result<&Interface, CoreError> {
        self.device_or_err(id)?
            .interface(name)
            .ok_or_else(|| CoreError::InterfaceNotFound {
                device: id,
                interface: name.to_owned(),
            })
    }

    fn interface_mut_or_err(
        &mut self,
        id: DeviceId,
        name: &str,
    ) -> Result<&mut Interface, CoreError> {
        self.device_mut_or_err(id)?
            .interface_mut(name)
            .ok_or_else(|| CoreError::InterfaceNotFound {
                device: id,
                interface: name.to_owned(),
            })
    }

    // ── Device lifecycle ─────────────────────────────────────────────

    /// Create a device with the interfaces its kind is provisioned with.
    ///
    /// Without an explicit name, one is generated from the kind label and
    /// one past the highest numeric suffix already used by that kind, so a
    /// removed device's name is never handed out again.
    pub fn add_device(
        &mut self,
        kind: DeviceKind,
        name: Option<String>,
        position: Position,
        switch_ports: u16,
    ) -> Result<&Device, CoreError> {
        let id = self.next_id;
        let next = id.next().ok_or(CoreError::IdsExhausted { last: id })?;
        self.next_id = next;

        let name = name.unwrap_or_else(|| self.generated_name(kind));

        info!(%id, %kind, name = %name, "device created");
        let device = Device {
            id,
            kind,
            name,
            position,
            default_gateway: None,
            interfaces: kind.provision(switch_ports),
        };
        Ok(self.devices.entry(id).or_insert(device))
    }

    fn generated_name(&self, kind: DeviceKind) -> String {
        let label = kind.label();
        let ordinal = self
            .devices
            .values()
            .filter(|d| d.kind == kind)
            .filter_map(|d| d.name.strip_prefix(label)?.parse::<u64>().ok())
            .max()
            .map_or(0, |highest| highest.saturating_add(1));
        format!("{label}{ordinal}")
    }

    /// Sever every cable on the device, then discard it.
    ///
    /// Returns the removed device together with the keys of the cables that
    /// were cut so pending link negotiation can be cancelled.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<(Device, Vec<LinkKey>), CoreError> {
        let peers: Vec<(String, Endpoint)> = self
            .device_or_err(id)?
            .interfaces
            .iter()
            .filter_map(|i| i.peer.clone().map(|p| (i.name.clone(), p)))
            .collect();

        let mut severed = Vec::with_capacity(peers.len());
        for (local, peer) in peers {
            if self.disconnect(id, &local, peer.device, &peer.interface)? {
                severed.push(LinkKey::new(Endpoint::new(id, local), peer));
            }
        }

        let device = self
            .devices
            .shift_remove(&id)
            .ok_or_else(|| CoreError::Internal(format!("device {id} vanished during removal")))?;
        info!(%id, cables = severed.len(), "device removed");
        Ok((device, severed))
    }

    pub fn rename_device(&mut self, id: DeviceId, name: impl Into<String>) -> Result<(), CoreError> {
        self.device_mut_or_err(id)?.name = name.into();
        Ok(())
    }

    pub fn move_device(&mut self, id: DeviceId, position: Position) -> Result<(), CoreError> {
        self.device_mut_or_err(id)?.position = position;
        Ok(())
    }

    // ── Addressing ───────────────────────────────────────────────────

    /// Configure or clear an interface address.
    ///
    /// Both strings empty clears the configuration. Otherwise both must be
    /// valid dotted-decimal, the mask contiguous, and the device not a
    /// switch.
    pub fn set_interface_address(
        &mut self,
        id: DeviceId,
        interface: &str,
        address: &str,
        mask: &str,
    ) -> Result<Option<IpConfig>, CoreError> {
        let ip = match (address.is_empty(), mask.is_empty()) {
            (true, true) => None,
            (false, false) => Some(IpConfig::new(
                address::parse_address(address)?,
                address::parse_mask(mask)?,
            )),
            _ => {
                return Err(CoreError::IncompleteAddress {
                    interface: interface.to_owned(),
                });
            }
        };

        if ip.is_some() && self.device_or_err(id)?.is_switch() {
            return Err(CoreError::SwitchAddressing { device: id });
        }

        self.interface_mut_or_err(id, interface)?.ip = ip;
        debug!(%id, interface, ip = ?ip, "interface address updated");
        Ok(ip)
    }

    pub fn set_default_gateway(&mut self, id: DeviceId, gateway: &str) -> Result<(), CoreError> {
        let device = self.device_mut_or_err(id)?;
        if !device.kind.is_endpoint() {
            return Err(CoreError::GatewayNotSupported {
                device: id,
                kind: device.kind,
            });
        }
        if gateway.is_empty() {
            device.default_gateway = None;
        } else {
            device.default_gateway = Some(address::parse_address(gateway)?);
        }
        debug!(%id, gateway = ?device.default_gateway, "default gateway updated");
        Ok(())
    }

    pub fn clear_default_gateway(&mut self, id: DeviceId) -> Result<(), CoreError> {
        self.device_mut_or_err(id)?.default_gateway = None;
        Ok(())
    }

    // ── Cabling ──────────────────────────────────────────────────────

    /// Cable two interfaces together, both ends starting `Down`.
    ///
    /// Returns `Ok(false)` without mutating when either interface already
    /// has a peer.
    pub fn connect(
        &mut self,
        a: DeviceId,
        iface_a: &str,
        b: DeviceId,
        iface_b: &str,
    ) -> Result<bool, CoreError> {
        if a == b {
            return Err(CoreError::SelfLoop {
                device: a,
                interface: iface_a.to_owned(),
            });
        }

        let left = self.interface_or_err(a, iface_a)?;
        let right = self.interface_or_err(b, iface_b)?;
        if left.is_connected() || right.is_connected() {
            debug!(%a, iface_a, %b, iface_b, "connect refused: interface already cabled");
            return Ok(false);
        }
        if left.media != right.media {
            warn!(
                %a, iface_a, %b, iface_b,
                left = %left.media, right = %right.media,
                "cabling interfaces of different media"
            );
        }

        let left = self.interface_mut_or_err(a, iface_a)?;
        left.peer = Some(Endpoint::new(b, iface_b));
        left.link_state = LinkState::Down;
        let right = self.interface_mut_or_err(b, iface_b)?;
        right.peer = Some(Endpoint::new(a, iface_a));
        right.link_state = LinkState::Down;

        info!(%a, iface_a, %b, iface_b, "cable connected");
        Ok(true)
    }

    /// Remove the cable between two interfaces.
    ///
    /// Returns `Ok(false)` when the two interfaces are not cabled to each
    /// other.
    pub fn disconnect(
        &mut self,
        a: DeviceId,
        iface_a: &str,
        b: DeviceId,
        iface_b: &str,
    ) -> Result<bool, CoreError> {
        let expected_left = Endpoint::new(b, iface_b);
        let expected_right = Endpoint::new(a, iface_a);
        let paired = self.interface_or_err(a, iface_a)?.peer.as_ref() == Some(&expected_left)
            && self.interface_or_err(b, iface_b)?.peer.as_ref() == Some(&expected_right);
        if !paired {
            return Ok(false);
        }

        for (id, name) in [(a, iface_a), (b, iface_b)] {
            let iface = self.interface_mut_or_err(id, name)?;
            iface.peer = None;
            iface.link_state = LinkState::Down;
        }
        info!(%a, iface_a, %b, iface_b, "cable disconnected");
        Ok(true)
    }

    /// Set the state of both ends of a cable.
    ///
    /// Returns `false` and changes nothing if the cable no longer exists.
    pub fn set_link_state(&mut self, key: &LinkKey, state: LinkState) -> bool {
        if !self.link_exists(key) {
            return false;
        }
        for end in [key.first(), key.second()] {
            if let Some(iface) = self
                .devices
                .get_mut(&end.device)
                .and_then(|d| d.interface_mut(&end.interface))
            {
                iface.link_state = state;
            }
        }
        true
    }

    pub fn link_exists(&self, key: &LinkKey) -> bool {
        let peer_of = |end: &Endpoint| {
            self.device(end.device)
                .and_then(|d| d.interface(&end.interface))
                .and_then(|i| i.peer.clone())
        };
        peer_of(key.first()).as_ref() == Some(key.second())
            && peer_of(key.second()).as_ref() == Some(key.first())
    }

    /// Every cable exactly once, in device insertion order.
    pub fn links(&self) -> Vec<Link> {
        let mut links = Vec::new();
        for device in self.devices.values() {
            for iface in &device.interfaces {
                let Some(peer) = &iface.peer else { continue };
                let local = Endpoint::new(device.id, iface.name.clone());
                if local > *peer {
                    continue;
                }
                let peer_media = self
                    .device(peer.device)
                    .and_then(|d| d.interface(&peer.interface))
                    .map_or(iface.media, |p| p.media);
                links.push(Link {
                    key: LinkKey::new(local, peer.clone()),
                    media: (iface.media, peer_media),
                    state: iface.link_state,
                });
            }
        }
        links
    }

    /// Project every cabled interface pair onto a device-level edge.
    ///
    /// With `up_only`, cables still negotiating are left out.
    pub fn adjacency(&self, up_only: bool) -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::new();
        for device in self.devices.values() {
            graph.add_node(device.id);
            for iface in &device.interfaces {
                let Some(peer) = &iface.peer else { continue };
                if up_only && iface.link_state != LinkState::Up {
                    continue;
                }
                graph.add_edge(device.id, peer.device);
            }
        }
        graph
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn topo_with(kinds: &[DeviceKind]) -> (Topology, Vec<DeviceId>) {
        let mut topo = Topology::new();
        let ids = kinds
            .iter()
            .map(|k| topo.add_device(*k, None, Position::default(), 4).unwrap().id)
            .collect();
        (topo, ids)
    }

    fn peer(topo: &Topology, id: DeviceId, iface: &str) -> Option<Endpoint> {
        topo.device(id).unwrap().interface(iface).unwrap().peer.clone()
    }

    #[test]
    fn ids_are_monotonic_and_names_generated() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Host, DeviceKind::Router]);
        assert_eq!(ids, vec![DeviceId::new(1), DeviceId::new(2), DeviceId::new(3)]);
        assert_eq!(topo.device(ids[1]).unwrap().name, "PC1");
        assert_eq!(topo.device(ids[2]).unwrap().name, "Router0");

        topo.remove_device(ids[2]).unwrap();
        let next = topo.add_device(DeviceKind::Switch, None, Position::default(), 4).unwrap().id;
        assert_eq!(next, DeviceId::new(4));
    }

    #[test]
    fn generated_names_are_not_reused_after_removal() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Host]);
        topo.remove_device(ids[0]).unwrap();

        let id = topo.add_device(DeviceKind::Host, None, Position::default(), 4).unwrap().id;
        assert_eq!(topo.device(id).unwrap().name, "PC2");
        assert_eq!(topo.find_device("PC1").unwrap().id, ids[1]);

        topo.rename_device(id, "Desk").unwrap();
        let next = topo.add_device(DeviceKind::Host, None, Position::default(), 4).unwrap().id;
        assert_eq!(topo.device(next).unwrap().name, "PC2");
    }

    #[test]
    fn add_device_fails_once_ids_run_out() {
        let mut topo = Topology::from_parts(Vec::new(), DeviceId::new(u32::MAX));
        let err = topo
            .add_device(DeviceKind::Router, None, Position::default(), 4)
            .unwrap_err();
        assert!(matches!(err, CoreError::IdsExhausted { .. }));
        assert!(topo.is_empty());
        assert_eq!(topo.next_id(), DeviceId::new(u32::MAX));
    }

    #[test]
    fn connect_is_symmetric() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Router]);
        assert!(topo.connect(ids[0], "FastEthernet0", ids[1], "FastEthernet0/0").unwrap());

        assert_eq!(
            peer(&topo, ids[0], "FastEthernet0"),
            Some(Endpoint::new(ids[1], "FastEthernet0/0"))
        );
        assert_eq!(
            peer(&topo, ids[1], "FastEthernet0/0"),
            Some(Endpoint::new(ids[0], "FastEthernet0"))
        );
        let link = &topo.links()[0];
        assert_eq!(link.state, LinkState::Down);
    }

    #[test]
    fn connect_refuses_busy_interface_without_mutation() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Host, DeviceKind::Switch]);
        assert!(topo.connect(ids[0], "FastEthernet0", ids[2], "FastEthernet0/1").unwrap());
        let before = topo.clone();

        assert!(!topo.connect(ids[1], "FastEthernet0", ids[2], "FastEthernet0/1").unwrap());
        assert!(!topo.connect(ids[0], "FastEthernet0", ids[2], "FastEthernet0/2").unwrap());
        assert_eq!(topo, before);
    }

    #[test]
    fn connect_rejects_unknown_endpoints_and_self_loops() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Router]);
        assert!(matches!(
            topo.connect(ids[0], "FastEthernet0/0", DeviceId::new(99), "FastEthernet0"),
            Err(CoreError::DeviceNotFound { .. })
        ));
        assert!(matches!(
            topo.connect(ids[0], "Gig0/0", ids[0], "FastEthernet0/1"),
            Err(CoreError::SelfLoop { .. })
        ));
    }

    #[test]
    fn media_mismatch_is_tolerated_and_flagged() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Router, DeviceKind::Router]);
        assert!(topo.connect(ids[0], "Serial0/0/0", ids[1], "FastEthernet0/0").unwrap());
        assert!(topo.links()[0].media_mismatch());
    }

    #[test]
    fn disconnect_requires_matching_pair() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Switch]);
        topo.connect(ids[0], "FastEthernet0", ids[1], "FastEthernet0/1").unwrap();

        assert!(!topo.disconnect(ids[0], "FastEthernet0", ids[1], "FastEthernet0/2").unwrap());
        assert!(topo.disconnect(ids[1], "FastEthernet0/1", ids[0], "FastEthernet0").unwrap());
        assert_eq!(peer(&topo, ids[0], "FastEthernet0"), None);
        assert_eq!(peer(&topo, ids[1], "FastEthernet0/1"), None);
        assert!(topo.links().is_empty());
    }

    #[test]
    fn remove_device_severs_every_cable() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Switch, DeviceKind::Host]);
        topo.connect(ids[0], "FastEthernet0", ids[1], "FastEthernet0/1").unwrap();
        topo.connect(ids[2], "FastEthernet0", ids[1], "FastEthernet0/2").unwrap();

        let (removed, severed) = topo.remove_device(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert_eq!(severed.len(), 2);
        assert!(removed.interfaces.iter().all(|i| i.peer.is_none()));
        assert_eq!(peer(&topo, ids[0], "FastEthernet0"), None);
        assert_eq!(peer(&topo, ids[2], "FastEthernet0"), None);
        assert!(topo.device(ids[1]).is_none());
    }

    #[test]
    fn switch_ports_reject_addresses() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Switch]);
        let err = topo
            .set_interface_address(ids[0], "FastEthernet0/1", "10.0.0.1", "255.255.255.0")
            .unwrap_err();
        assert!(matches!(err, CoreError::SwitchAddressing { .. }));
        // Clearing is always allowed.
        assert!(topo.set_interface_address(ids[0], "FastEthernet0/1", "", "").unwrap().is_none());
    }

    #[test]
    fn address_validation() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host]);
        assert!(matches!(
            topo.set_interface_address(ids[0], "FastEthernet0", "10.0.0.300", "255.255.255.0"),
            Err(CoreError::InvalidAddress(_))
        ));
        assert!(matches!(
            topo.set_interface_address(ids[0], "FastEthernet0", "10.0.0.3", ""),
            Err(CoreError::IncompleteAddress { .. })
        ));
        assert!(matches!(
            topo.set_interface_address(ids[0], "FastEthernet0", "10.0.0.3", "255.0.255.0"),
            Err(CoreError::InvalidAddress(_))
        ));

        let ip = topo
            .set_interface_address(ids[0], "FastEthernet0", "10.0.0.3", "255.255.255.0")
            .unwrap()
            .unwrap();
        assert_eq!(topo.device(ids[0]).unwrap().primary_ip(), Some(ip));
    }

    #[test]
    fn gateway_only_on_endpoints() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Router]);
        topo.set_default_gateway(ids[0], "10.0.0.1").unwrap();
        assert_eq!(
            topo.device(ids[0]).unwrap().default_gateway,
            Some("10.0.0.1".parse().unwrap())
        );
        assert!(matches!(
            topo.set_default_gateway(ids[1], "10.0.0.1"),
            Err(CoreError::GatewayNotSupported { .. })
        ));
        topo.clear_default_gateway(ids[0]).unwrap();
        assert_eq!(topo.device(ids[0]).unwrap().default_gateway, None);
    }

    #[test]
    fn find_device_by_id_or_name() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Router]);
        topo.rename_device(ids[1], "Core").unwrap();
        assert_eq!(topo.find_device("2").unwrap().id, ids[1]);
        assert_eq!(topo.find_device("Core").unwrap().id, ids[1]);
        assert_eq!(topo.find_device("core").unwrap().id, ids[1]);
        assert_eq!(topo.find_device("PC0").unwrap().id, ids[0]);
        assert!(topo.find_device("nope").is_none());
    }

    #[test]
    fn adjacency_collapses_parallel_cables() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Router, DeviceKind::Router]);
        topo.connect(ids[0], "FastEthernet0/0", ids[1], "FastEthernet0/0").unwrap();
        topo.connect(ids[0], "Serial0/0/0", ids[1], "Serial0/0/0").unwrap();

        let graph = topo.adjacency(false);
        assert_eq!(graph.neighbors(ids[0]), &[ids[1]]);
        assert_eq!(graph.neighbors(ids[1]), &[ids[0]]);
        assert!(topo.adjacency(true).neighbors(ids[0]).is_empty());
    }

    #[test]
    fn set_link_state_ignores_stale_keys() {
        let (mut topo, ids) = topo_with(&[DeviceKind::Host, DeviceKind::Router]);
        topo.connect(ids[0], "FastEthernet0", ids[1], "FastEthernet0/0").unwrap();
        let key = topo.links()[0].key.clone();

        assert!(topo.set_link_state(&key, LinkState::Up));
        assert_eq!(topo.links()[0].state, LinkState::Up);

        topo.disconnect(ids[0], "FastEthernet0", ids[1], "FastEthernet0/0").unwrap();
        assert!(!topo.set_link_state(&key, LinkState::Up));
        let iface = topo.device(ids[0]).unwrap().interface("FastEthernet0").unwrap();
        assert_eq!(iface.link_state, LinkState::Down);
    }
}
