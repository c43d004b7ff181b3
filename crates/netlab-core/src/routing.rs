// ── Routing engine ──
//
// Answers "can A ping B" from cabling plus static addressing, and rebuilds
// the hop-by-hop route for tracing. Both answers come from one resolver so
// they can never disagree on success.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::net::Ipv4Addr;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{Device, DeviceId, DeviceKind, IpConfig};
use crate::reachability;
use crate::store::Topology;

const PING_COUNT: u32 = 4;
const PING_BYTES: u32 = 32;
const BASE_TTL: u8 = 128;

// ── Result types ────────────────────────────────────────────────────

/// Why a ping could not be answered. Ordered by the check that produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum PingFailure {
    #[error("source or destination device does not exist")]
    DeviceNotFound,
    #[error("source and destination are the same device")]
    SelfPing,
    #[error("no physical connection between source and destination")]
    NoPhysicalPath,
    #[error("source device has no IP address configured")]
    MissingSourceAddress,
    #[error("destination device has no IP address configured")]
    MissingTargetAddress,
    #[error("default gateway is not reachable from the source subnet")]
    GatewayUnreachable,
    #[error("destination network is unreachable")]
    NetworkUnreachable,
}

/// How a successful reply travelled. Only affects the simulated timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PathKind {
    /// Source and destination share a subnet.
    Direct,
    /// Delivered by the source's default gateway alone.
    ViaGateway,
    /// Forwarded across `routers` routers.
    RouterHops { routers: usize },
}

impl PathKind {
    fn ttl(self) -> u8 {
        match self {
            Self::Direct => BASE_TTL,
            Self::ViaGateway => BASE_TTL - 1,
            Self::RouterHops { routers } => {
                BASE_TTL.saturating_sub(u8::try_from(routers).unwrap_or(u8::MAX))
            }
        }
    }

    fn rtt_ms(self) -> u32 {
        match self {
            Self::Direct => 1,
            Self::ViaGateway => 2,
            Self::RouterHops { routers } => {
                u32::try_from(routers).map_or(u32::MAX, |r| r.saturating_mul(2).saturating_add(1))
            }
        }
    }
}

/// Outcome of a ping query. Exactly one of success or a classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingReport {
    pub success: bool,
    pub failure: Option<PingFailure>,
    pub path: Option<PathKind>,
    pub reply_from: Option<Ipv4Addr>,
    pub message: String,
}

impl PingReport {
    fn failed(failure: PingFailure) -> Self {
        Self {
            success: false,
            failure: Some(failure),
            path: None,
            reply_from: None,
            message: format!("Ping failed: {failure}."),
        }
    }

    fn replied(resolution: &Resolution) -> Self {
        let ip = resolution.reply_from;
        let ttl = resolution.kind.ttl();
        let rtt = resolution.kind.rtt_ms();

        let mut message = format!("Pinging {ip} with {PING_BYTES} bytes of data:\n\n");
        for _ in 0..PING_COUNT {
            let _ = writeln!(
                message,
                "Reply from {ip}: bytes={PING_BYTES} time={rtt}ms TTL={ttl}"
            );
        }
        let _ = write!(
            message,
            "\nPing statistics for {ip}:\n    \
             Packets: Sent = {PING_COUNT}, Received = {PING_COUNT}, Lost = 0 (0% loss)"
        );

        Self {
            success: true,
            failure: None,
            path: Some(resolution.kind),
            reply_from: Some(ip),
            message,
        }
    }
}

/// A device on a traced route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
}

/// Ping outcome plus the routed and physical paths, for trace consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceReport {
    pub report: PingReport,
    pub route: Option<Vec<Hop>>,
    pub physical: Option<Vec<Hop>>,
}

/// Next hop of a routing-table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RouteVia {
    Connected { interface: String },
    Gateway { address: Ipv4Addr },
}

/// One line of a device's routing table, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub network: Ipv4Addr,
    pub prefix_length: u32,
    pub via: RouteVia,
}

#[derive(Debug, Clone)]
struct Resolution {
    route: Vec<DeviceId>,
    kind: PathKind,
    reply_from: Ipv4Addr,
}

// ── Engine ──────────────────────────────────────────────────────────

/// Read-only reachability reasoning over one topology snapshot.
pub struct RoutingEngine<'a> {
    topology: &'a Topology,
    up_links_only: bool,
}

impl<'a> RoutingEngine<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self {
            topology,
            up_links_only: false,
        }
    }

    /// Only treat cables whose both ends are `Up` as usable.
    pub fn with_link_state_gating(mut self, enabled: bool) -> Self {
        self.up_links_only = enabled;
        self
    }

    /// Decide whether `target` answers a ping from `source`.
    pub fn test_connectivity(&self, source: DeviceId, target: DeviceId) -> PingReport {
        match self.resolve(source, target) {
            Ok(resolution) => {
                debug!(%source, %target, route = ?resolution.route, "ping succeeded");
                PingReport::replied(&resolution)
            }
            Err(failure) => {
                debug!(%source, %target, ?failure, "ping failed");
                PingReport::failed(failure)
            }
        }
    }

    /// Devices traversed by a successful ping: source, routers, target.
    pub fn compute_route(&self, source: DeviceId, target: DeviceId) -> Option<Vec<DeviceId>> {
        self.resolve(source, target).ok().map(|r| r.route)
    }

    /// Shortest cabled path, ignoring addressing entirely.
    pub fn physical_trace(&self, source: DeviceId, target: DeviceId) -> Option<Vec<DeviceId>> {
        let graph = self.topology.adjacency(self.up_links_only);
        reachability::physical_path(&graph, source, target)
    }

    pub fn trace(&self, source: DeviceId, target: DeviceId) -> TraceReport {
        let report = self.test_connectivity(source, target);
        let route = self
            .compute_route(source, target)
            .map(|ids| self.hops(&ids));
        let physical = self
            .physical_trace(source, target)
            .map(|ids| self.hops(&ids));
        TraceReport {
            report,
            route,
            physical,
        }
    }

    /// IP-level decision between two devices already known to be cabled
    /// and addressed.
    pub fn check_routing_path(&self, source: &Device, target: &Device) -> Result<(), PingFailure> {
        self.route_between(source, target).map(|_| ())
    }

    /// Connected networks of every configured interface, plus the default
    /// route of an endpoint.
    pub fn routing_table(&self, id: DeviceId) -> Option<Vec<RouteEntry>> {
        let device = self.topology.device(id)?;
        let mut entries: Vec<RouteEntry> = device
            .interfaces
            .iter()
            .filter_map(|iface| {
                iface.ip.map(|ip| RouteEntry {
                    network: ip.network(),
                    prefix_length: ip.prefix_length(),
                    via: RouteVia::Connected {
                        interface: iface.name.clone(),
                    },
                })
            })
            .collect();
        if let Some(gateway) = device.default_gateway.filter(|_| device.kind.is_endpoint()) {
            entries.push(RouteEntry {
                network: Ipv4Addr::UNSPECIFIED,
                prefix_length: 0,
                via: RouteVia::Gateway { address: gateway },
            });
        }
        Some(entries)
    }

    // ── Resolution ───────────────────────────────────────────────────

    fn resolve(&self, source: DeviceId, target: DeviceId) -> Result<Resolution, PingFailure> {
        let (Some(src), Some(dst)) = (self.topology.device(source), self.topology.device(target))
        else {
            return Err(PingFailure::DeviceNotFound);
        };
        if source == target {
            return Err(PingFailure::SelfPing);
        }

        let graph = self.topology.adjacency(self.up_links_only);
        if !reachability::exists_physical_path(&graph, source, target) {
            return Err(PingFailure::NoPhysicalPath);
        }
        if !src.is_router() && src.primary_ip().is_none() {
            return Err(PingFailure::MissingSourceAddress);
        }
        if !dst.is_router() && dst.primary_ip().is_none() {
            return Err(PingFailure::MissingTargetAddress);
        }

        self.route_between(src, dst)
    }

    fn route_between(&self, src: &Device, dst: &Device) -> Result<Resolution, PingFailure> {
        let targets = dst.addresses();

        // Same subnet, judged by the source side's mask.
        for own in src.addresses() {
            if let Some(reply_from) = first_match(own, &targets) {
                return Ok(Resolution {
                    route: vec![src.id, dst.id],
                    kind: PathKind::Direct,
                    reply_from,
                });
            }
        }

        let start = if src.is_router() {
            src
        } else {
            self.gateway_router(src)?
        };

        let (chain, reply_from) = self
            .search_routers(start, &targets)
            .ok_or(PingFailure::NetworkUnreachable)?;

        let kind = if !src.is_router() && chain.len() == 1 {
            PathKind::ViaGateway
        } else {
            PathKind::RouterHops {
                routers: chain.len(),
            }
        };

        let mut route = Vec::with_capacity(chain.len() + 2);
        if !src.is_router() {
            route.push(src.id);
        }
        route.extend(chain);
        if route.last() != Some(&dst.id) {
            route.push(dst.id);
        }

        Ok(Resolution {
            route,
            kind,
            reply_from,
        })
    }

    /// The router that owns the source's default gateway address.
    fn gateway_router(&self, src: &Device) -> Result<&'a Device, PingFailure> {
        let Some(gateway) = src.default_gateway else {
            return Err(PingFailure::NetworkUnreachable);
        };
        let own = src.primary_ip().ok_or(PingFailure::MissingSourceAddress)?;
        if !own.contains(gateway) {
            return Err(PingFailure::GatewayUnreachable);
        }
        self.topology
            .router_owning(gateway)
            .ok_or(PingFailure::GatewayUnreachable)
    }

    /// Breadth-first search across valid router-to-router hops until some
    /// router shares a subnet with a target address.
    ///
    /// Returns the router chain from `start` and the matched target address.
    fn search_routers(
        &self,
        start: &Device,
        targets: &[IpConfig],
    ) -> Option<(Vec<DeviceId>, Ipv4Addr)> {
        let mut visited = HashSet::from([start.id]);
        let mut parent: HashMap<DeviceId, DeviceId> = HashMap::new();
        let mut queue = VecDeque::from([start.id]);

        while let Some(current) = queue.pop_front() {
            let Some(router) = self.topology.device(current) else {
                continue;
            };

            let matched = router
                .interfaces
                .iter()
                .filter_map(|i| i.ip)
                .find_map(|ip| first_match(ip, targets));
            if let Some(reply_from) = matched {
                return Some((chain_to(&parent, start.id, current), reply_from));
            }

            for next in self.next_hops(router) {
                if visited.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Neighbouring routers reachable over a cable whose two ends are both
    /// addressed in each other's subnet.
    fn next_hops(&self, router: &Device) -> Vec<DeviceId> {
        let mut hops = Vec::new();
        for iface in &router.interfaces {
            let (Some(local), Some(peer)) = (iface.ip, iface.peer.as_ref()) else {
                continue;
            };
            if self.up_links_only && !iface.is_up() {
                continue;
            }
            let Some(neighbor) = self.topology.device(peer.device) else {
                continue;
            };
            if !neighbor.is_router() {
                continue;
            }
            let Some(remote) = neighbor.interface(&peer.interface).and_then(|i| i.ip) else {
                continue;
            };
            if local.contains(remote.address) && remote.contains(local.address) {
                hops.push(neighbor.id);
            }
        }
        hops
    }

    fn hops(&self, ids: &[DeviceId]) -> Vec<Hop> {
        ids.iter()
            .filter_map(|id| self.topology.device(*id))
            .map(|d| Hop {
                id: d.id,
                name: d.name.clone(),
                kind: d.kind,
            })
            .collect()
    }
}

fn first_match(own: IpConfig, targets: &[IpConfig]) -> Option<Ipv4Addr> {
    targets
        .iter()
        .map(|t| t.address)
        .find(|address| own.contains(*address))
}

fn chain_to(parent: &HashMap<DeviceId, DeviceId>, start: DeviceId, end: DeviceId) -> Vec<DeviceId> {
    let mut chain = vec![end];
    let mut current = end;
    while current != start {
        let Some(&prev) = parent.get(&current) else { break };
        chain.push(prev);
        current = prev;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{LinkState, Position};
    use pretty_assertions::assert_eq;

    const MASK24: &str = "255.255.255.0";

    struct Bench {
        topo: Topology,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                topo: Topology::new(),
            }
        }

        fn add(&mut self, kind: DeviceKind, name: &str) -> DeviceId {
            self.topo
                .add_device(kind, Some(name.into()), Position::default(), 4)
                .unwrap()
                .id
        }

        fn host(&mut self, name: &str, ip: &str, gateway: Option<&str>) -> DeviceId {
            let id = self.add(DeviceKind::Host, name);
            self.topo
                .set_interface_address(id, "FastEthernet0", ip, MASK24)
                .unwrap();
            if let Some(gw) = gateway {
                self.topo.set_default_gateway(id, gw).unwrap();
            }
            id
        }

        fn addr(&mut self, id: DeviceId, iface: &str, ip: &str) {
            self.topo
                .set_interface_address(id, iface, ip, MASK24)
                .unwrap();
        }

        fn cable(&mut self, a: DeviceId, ia: &str, b: DeviceId, ib: &str) {
            assert!(self.topo.connect(a, ia, b, ib).unwrap());
        }

        fn engine(&self) -> RoutingEngine<'_> {
            RoutingEngine::new(&self.topo)
        }

        fn ping(&self, a: DeviceId, b: DeviceId) -> PingReport {
            self.engine().test_connectivity(a, b)
        }

        fn assert_consistent(&self) {
            let ids: Vec<DeviceId> = self.topo.devices().map(|d| d.id).collect();
            let engine = self.engine();
            for &a in &ids {
                for &b in &ids {
                    let report = engine.test_connectivity(a, b);
                    let route = engine.compute_route(a, b);
                    assert_eq!(
                        report.success,
                        route.is_some(),
                        "ping and route disagree for {a} -> {b}: {report:?} / {route:?}"
                    );
                }
            }
        }
    }

    /// Host1 - Router1 - Host2 across two /24s.
    fn scenario_a() -> (Bench, DeviceId, DeviceId, DeviceId) {
        let mut lab = Bench::new();
        let h1 = lab.host("Host1", "192.168.1.10", Some("192.168.1.1"));
        let h2 = lab.host("Host2", "192.168.2.10", Some("192.168.2.1"));
        let r1 = lab.add(DeviceKind::Router, "Router1");
        lab.addr(r1, "FastEthernet0/0", "192.168.1.1");
        lab.addr(r1, "FastEthernet0/1", "192.168.2.1");
        lab.cable(h1, "FastEthernet0", r1, "FastEthernet0/0");
        lab.cable(h2, "FastEthernet0", r1, "FastEthernet0/1");
        (lab, h1, h2, r1)
    }

    /// Host1 - R1 =serial= R2 - Host2, serial link addressed 10.0.0.0/24.
    fn two_router_chain(serial_addressed: bool) -> (Bench, DeviceId, DeviceId, DeviceId, DeviceId) {
        let mut lab = Bench::new();
        let h1 = lab.host("Host1", "192.168.1.10", Some("192.168.1.1"));
        let h2 = lab.host("Host2", "192.168.2.10", Some("192.168.2.1"));
        let r1 = lab.add(DeviceKind::Router, "R1");
        let r2 = lab.add(DeviceKind::Router, "R2");
        lab.addr(r1, "FastEthernet0/0", "192.168.1.1");
        lab.addr(r2, "FastEthernet0/0", "192.168.2.1");
        if serial_addressed {
            lab.addr(r1, "Serial0/0/0", "10.0.0.1");
            lab.addr(r2, "Serial0/0/0", "10.0.0.2");
        }
        lab.cable(h1, "FastEthernet0", r1, "FastEthernet0/0");
        lab.cable(h2, "FastEthernet0", r2, "FastEthernet0/0");
        lab.cable(r1, "Serial0/0/0", r2, "Serial0/0/0");
        (lab, h1, h2, r1, r2)
    }

    #[test]
    fn scenario_a_gateway_path() {
        let (lab, h1, h2, r1) = scenario_a();
        let report = lab.ping(h1, h2);
        assert!(report.success, "{report:?}");
        assert_eq!(report.failure, None);
        assert_eq!(report.path, Some(PathKind::ViaGateway));
        assert!(report.message.contains("Reply from 192.168.2.10"));
        assert!(report
            .message
            .contains("Packets: Sent = 4, Received = 4, Lost = 0 (0% loss)"));
        assert_eq!(lab.engine().compute_route(h1, h2), Some(vec![h1, r1, h2]));
        lab.assert_consistent();
    }

    #[test]
    fn scenario_b_uncabled_same_subnet() {
        let mut lab = Bench::new();
        let h1 = lab.host("Host1", "10.0.0.1", None);
        let h2 = lab.host("Host2", "10.0.0.2", None);
        let report = lab.ping(h1, h2);
        assert_eq!(report.failure, Some(PingFailure::NoPhysicalPath));
        assert!(!report.success);
        assert_eq!(lab.engine().compute_route(h1, h2), None);
    }

    #[test]
    fn scenario_c_no_gateway_is_network_unreachable() {
        let mut lab = Bench::new();
        let h1 = lab.host("Host1", "10.0.0.5", None);
        let h2 = lab.host("Host2", "192.168.1.5", None);
        let sw = lab.add(DeviceKind::Switch, "Switch0");
        lab.cable(h1, "FastEthernet0", sw, "FastEthernet0/1");
        lab.cable(h2, "FastEthernet0", sw, "FastEthernet0/2");
        assert_eq!(lab.ping(h1, h2).failure, Some(PingFailure::NetworkUnreachable));
    }

    #[test]
    fn scenario_d_unaddressed_serial_is_not_a_hop() {
        let (lab, h1, h2, r1, r2) = two_router_chain(false);
        let engine = lab.engine();
        assert_eq!(
            engine.test_connectivity(h1, h2).failure,
            Some(PingFailure::NetworkUnreachable)
        );
        assert_eq!(engine.compute_route(h1, h2), None);
        assert_eq!(engine.physical_trace(h1, h2), Some(vec![h1, r1, r2, h2]));
        lab.assert_consistent();
    }

    #[test]
    fn addressed_serial_link_routes_across_two_routers() {
        let (lab, h1, h2, r1, r2) = two_router_chain(true);
        let report = lab.ping(h1, h2);
        assert!(report.success, "{report:?}");
        assert_eq!(report.path, Some(PathKind::RouterHops { routers: 2 }));
        assert!(report.message.contains("TTL=126"));
        assert_eq!(lab.engine().compute_route(h1, h2), Some(vec![h1, r1, r2, h2]));
        assert_eq!(lab.engine().compute_route(h2, h1), Some(vec![h2, r2, r1, h1]));
        lab.assert_consistent();
    }

    #[test]
    fn mismatched_link_subnets_block_the_hop() {
        let (mut lab, h1, h2, _, r2) = two_router_chain(true);
        lab.addr(r2, "Serial0/0/0", "10.0.1.2");
        assert_eq!(lab.ping(h1, h2).failure, Some(PingFailure::NetworkUnreachable));
        lab.assert_consistent();
    }

    #[test]
    fn router_source_routes_without_gateway() {
        let (lab, h1, h2, r1, r2) = two_router_chain(true);
        let report = lab.ping(r1, h2);
        assert!(report.success, "{report:?}");
        assert_eq!(lab.engine().compute_route(r1, h2), Some(vec![r1, r2, h2]));
        // Router target answers on any of its interfaces.
        assert!(lab.ping(h1, r2).success);
        assert_eq!(lab.engine().compute_route(h1, r2), Some(vec![h1, r1, r2]));
    }

    #[test]
    fn self_ping_always_fails() {
        let (lab, h1, _, r1) = scenario_a();
        assert_eq!(lab.ping(h1, h1).failure, Some(PingFailure::SelfPing));
        assert_eq!(lab.ping(r1, r1).failure, Some(PingFailure::SelfPing));

        let mut bare = Bench::new();
        let lonely = bare.add(DeviceKind::Host, "Lonely");
        assert_eq!(bare.ping(lonely, lonely).failure, Some(PingFailure::SelfPing));
    }

    #[test]
    fn unknown_device_is_reported() {
        let (lab, h1, _, _) = scenario_a();
        let missing = DeviceId::new(999);
        assert_eq!(lab.ping(h1, missing).failure, Some(PingFailure::DeviceNotFound));
        assert_eq!(lab.ping(missing, h1).failure, Some(PingFailure::DeviceNotFound));
    }

    #[test]
    fn missing_addresses_are_classified() {
        let mut lab = Bench::new();
        let h1 = lab.add(DeviceKind::Host, "Bare");
        let h2 = lab.host("Host2", "10.0.0.2", None);
        let sw = lab.add(DeviceKind::Switch, "Switch0");
        lab.cable(h1, "FastEthernet0", sw, "FastEthernet0/1");
        lab.cable(h2, "FastEthernet0", sw, "FastEthernet0/2");

        assert_eq!(lab.ping(h1, h2).failure, Some(PingFailure::MissingSourceAddress));
        assert_eq!(lab.ping(h2, h1).failure, Some(PingFailure::MissingTargetAddress));
        assert_eq!(lab.ping(h2, sw).failure, Some(PingFailure::MissingTargetAddress));
        assert_eq!(lab.ping(sw, h2).failure, Some(PingFailure::MissingSourceAddress));
        lab.assert_consistent();
    }

    #[test]
    fn gateway_outside_subnet_is_unreachable() {
        let (mut lab, h1, h2, _) = scenario_a();
        lab.topo.set_default_gateway(h1, "192.168.9.1").unwrap();
        assert_eq!(lab.ping(h1, h2).failure, Some(PingFailure::GatewayUnreachable));
    }

    #[test]
    fn gateway_not_owned_by_a_router_is_unreachable() {
        let (mut lab, h1, h2, _) = scenario_a();
        lab.topo.set_default_gateway(h1, "192.168.1.254").unwrap();
        assert_eq!(lab.ping(h1, h2).failure, Some(PingFailure::GatewayUnreachable));
        lab.assert_consistent();
    }

    #[test]
    fn direct_match_through_switch() {
        let mut lab = Bench::new();
        let h1 = lab.host("Host1", "10.0.0.1", None);
        let h2 = lab.host("Host2", "10.0.0.2", None);
        let sw = lab.add(DeviceKind::Switch, "Switch0");
        lab.cable(h1, "FastEthernet0", sw, "FastEthernet0/1");
        lab.cable(sw, "FastEthernet0/2", h2, "FastEthernet0");

        let report = lab.ping(h1, h2);
        assert_eq!(report.path, Some(PathKind::Direct));
        assert!(report.message.contains("TTL=128"));
        assert_eq!(lab.engine().compute_route(h1, h2), Some(vec![h1, h2]));
    }

    #[test]
    fn check_routing_path_on_cabled_addressed_pairs() {
        let check = |lab: &Bench, a: DeviceId, b: DeviceId| {
            let (src, dst) = (lab.topo.device(a).unwrap(), lab.topo.device(b).unwrap());
            lab.engine().check_routing_path(src, dst)
        };

        let mut flat = Bench::new();
        let h1 = flat.host("Host1", "10.0.0.1", None);
        let h2 = flat.host("Host2", "10.0.0.2", None);
        let sw = flat.add(DeviceKind::Switch, "Switch0");
        flat.cable(h1, "FastEthernet0", sw, "FastEthernet0/1");
        flat.cable(h2, "FastEthernet0", sw, "FastEthernet0/2");
        assert_eq!(check(&flat, h1, h2), Ok(()));

        let (mut routed, h1, h2, _) = scenario_a();
        assert_eq!(check(&routed, h1, h2), Ok(()));
        routed.topo.set_default_gateway(h1, "192.168.9.1").unwrap();
        assert_eq!(check(&routed, h1, h2), Err(PingFailure::GatewayUnreachable));

        let (chain, h1, h2, _, _) = two_router_chain(false);
        assert_eq!(check(&chain, h1, h2), Err(PingFailure::NetworkUnreachable));
    }

    #[test]
    fn link_state_gating_is_opt_in() {
        let (mut lab, h1, h2, _) = scenario_a();
        assert!(lab.ping(h1, h2).success);
        assert_eq!(
            lab.engine()
                .with_link_state_gating(true)
                .test_connectivity(h1, h2)
                .failure,
            Some(PingFailure::NoPhysicalPath)
        );

        for link in lab.topo.links() {
            lab.topo.set_link_state(&link.key, LinkState::Up);
        }
        assert!(lab
            .engine()
            .with_link_state_gating(true)
            .test_connectivity(h1, h2)
            .success);
    }

    #[test]
    fn trace_names_each_hop() {
        let (lab, h1, h2, _) = scenario_a();
        let trace = lab.engine().trace(h1, h2);
        let names: Vec<&str> = trace
            .route
            .as_deref()
            .unwrap()
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["Host1", "Router1", "Host2"]);
        assert_eq!(trace.physical.unwrap().len(), 3);
    }

    #[test]
    fn routing_table_lists_connected_and_default_routes() {
        let (lab, h1, _, r1) = scenario_a();
        let engine = lab.engine();

        let table = engine.routing_table(r1).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].network, "192.168.1.0".parse::<Ipv4Addr>().unwrap());
        assert_eq!(table[0].prefix_length, 24);
        assert_eq!(
            table[1].via,
            RouteVia::Connected {
                interface: "FastEthernet0/1".into()
            }
        );

        let host_table = engine.routing_table(h1).unwrap();
        assert_eq!(
            host_table.last().unwrap().via,
            RouteVia::Gateway {
                address: "192.168.1.1".parse().unwrap()
            }
        );
        assert!(engine.routing_table(DeviceId::new(77)).is_none());
    }

    #[test]
    fn consistency_survives_mutations() {
        let (mut lab, h1, h2, _, r2) = two_router_chain(true);
        lab.assert_consistent();
        lab.topo.disconnect(h2, "FastEthernet0", r2, "FastEthernet0/0").unwrap();
        lab.assert_consistent();
        lab.topo.remove_device(r2).unwrap();
        lab.assert_consistent();
        lab.topo.clear_default_gateway(h1).unwrap();
        lab.assert_consistent();
    }
}
