// ── Lab facade ──
//
// The entry point for display layers and the CLI. Owns the topology behind
// a watch channel so every mutation publishes a fresh snapshot, and drives
// link negotiation for cables as they are connected and removed.

use std::path::Path;
use std::sync::{Arc, Weak};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::config::LabConfig;
use crate::error::CoreError;
use crate::link::{Claim, LinkEvent, LinkNegotiator};
use crate::model::{Device, DeviceId, DeviceKind, IpConfig, LinkKey, LinkState, Position};
use crate::project::ProjectFile;
use crate::reachability;
use crate::routing::{PingReport, RouteEntry, RoutingEngine, TraceReport};
use crate::store::{Link, Topology};

/// A live network topology plus its link negotiation.
///
/// Cheaply cloneable via `Arc<LabInner>`. Queries run against an immutable
/// snapshot, so a long reachability check never blocks an edit.
#[derive(Clone)]
pub struct Lab {
    inner: Arc<LabInner>,
}

struct LabInner {
    config: LabConfig,
    topology: watch::Sender<Arc<Topology>>,
    negotiator: LinkNegotiator,
}

impl LabInner {
    /// Apply `f` to the topology, publishing a snapshot when it succeeds.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Topology) -> Result<R, CoreError>,
    ) -> Result<R, CoreError> {
        let mut outcome = None;
        self.topology.send_if_modified(|topology| {
            let result = f(Arc::make_mut(topology));
            let changed = result.is_ok();
            outcome = Some(result);
            changed
        });
        outcome.unwrap_or_else(|| Err(CoreError::Internal("topology mutation did not run".into())))
    }

    /// Flip a settled link `Up`, unless it was severed or replugged since
    /// its timer was scheduled. Checked under the topology lock.
    fn bring_up(&self, claim: &Claim) -> bool {
        self.topology.send_if_modified(|topology| {
            claim.is_current()
                && Arc::make_mut(topology).set_link_state(claim.key(), LinkState::Up)
        })
    }

    fn negotiate(self: &Arc<Self>, key: LinkKey) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.negotiator
            .begin(key, move |claim| weak.upgrade().is_some_and(|inner| inner.bring_up(claim)));
    }
}

impl Lab {
    pub fn new(config: LabConfig) -> Self {
        Self::with_topology(config, Topology::new())
    }

    /// Wrap an existing topology. Cables saved while still negotiating
    /// start negotiating again.
    pub fn with_topology(config: LabConfig, topology: Topology) -> Self {
        let pending: Vec<LinkKey> = topology
            .links()
            .into_iter()
            .filter(|l| l.state == LinkState::Down)
            .map(|l| l.key)
            .collect();

        let (topology, _) = watch::channel(Arc::new(topology));
        let inner = Arc::new(LabInner {
            negotiator: LinkNegotiator::new(config.settle_delay),
            config,
            topology,
        });
        for key in pending {
            inner.negotiate(key);
        }
        Self { inner }
    }

    /// Load a project file from disk.
    pub fn open(config: LabConfig, path: &Path) -> Result<Self, CoreError> {
        let topology = ProjectFile::load(path)?.into_topology()?;
        info!(path = %path.display(), devices = topology.len(), "project opened");
        Ok(Self::with_topology(config, topology))
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        ProjectFile::from_topology(&self.snapshot()).save(path)
    }

    pub fn config(&self) -> &LabConfig {
        &self.inner.config
    }

    // ── Observation ──────────────────────────────────────────────────

    /// The current topology. Cheap: shares the published snapshot.
    pub fn snapshot(&self) -> Arc<Topology> {
        Arc::clone(&self.inner.topology.borrow())
    }

    /// Receive a new snapshot after every successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Topology>> {
        self.inner.topology.subscribe()
    }

    pub fn subscribe_links(&self) -> broadcast::Receiver<LinkEvent> {
        self.inner.negotiator.subscribe()
    }

    pub fn pending_links(&self) -> usize {
        self.inner.negotiator.pending_count()
    }

    /// Resolve once every cable has finished negotiating.
    pub async fn settled(&self) {
        self.inner.negotiator.settled().await;
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn device(&self, id: DeviceId) -> Option<Device> {
        self.snapshot().device(id).cloned()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.snapshot().devices().cloned().collect()
    }

    pub fn find_device(&self, identifier: &str) -> Option<Device> {
        self.snapshot().find_device(identifier).cloned()
    }

    /// Like [`find_device`](Self::find_device), but an unknown identifier
    /// is an error.
    pub fn resolve(&self, identifier: &str) -> Result<DeviceId, CoreError> {
        self.snapshot()
            .find_device(identifier)
            .map(|d| d.id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: identifier.to_owned(),
            })
    }

    pub fn links(&self) -> Vec<Link> {
        self.snapshot().links()
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn add_device(
        &self,
        kind: DeviceKind,
        name: Option<String>,
        position: Position,
    ) -> Result<Device, CoreError> {
        let ports = self.inner.config.switch_ports;
        self.inner
            .mutate(|t| t.add_device(kind, name, position, ports).cloned())
    }

    /// Remove a device, severing its cables first.
    pub fn remove_device(&self, id: DeviceId) -> Result<Device, CoreError> {
        let (device, severed) = self.inner.mutate(|t| t.remove_device(id))?;
        for key in &severed {
            self.inner.negotiator.sever(key);
        }
        Ok(device)
    }

    pub fn rename_device(&self, id: DeviceId, name: impl Into<String>) -> Result<(), CoreError> {
        let name = name.into();
        self.inner.mutate(|t| t.rename_device(id, name))
    }

    pub fn move_device(&self, id: DeviceId, position: Position) -> Result<(), CoreError> {
        self.inner.mutate(|t| t.move_device(id, position))
    }

    pub fn set_interface_address(
        &self,
        id: DeviceId,
        interface: &str,
        address: &str,
        mask: &str,
    ) -> Result<Option<IpConfig>, CoreError> {
        self.inner
            .mutate(|t| t.set_interface_address(id, interface, address, mask))
    }

    pub fn set_default_gateway(&self, id: DeviceId, gateway: &str) -> Result<(), CoreError> {
        self.inner.mutate(|t| t.set_default_gateway(id, gateway))
    }

    pub fn clear_default_gateway(&self, id: DeviceId) -> Result<(), CoreError> {
        self.inner.mutate(|t| t.clear_default_gateway(id))
    }

    /// Cable two interfaces and start negotiating the new link.
    ///
    /// Returns `Ok(false)` when either interface is already cabled.
    pub fn connect(
        &self,
        a: DeviceId,
        iface_a: &str,
        b: DeviceId,
        iface_b: &str,
    ) -> Result<bool, CoreError> {
        let connected = self.inner.mutate(|t| t.connect(a, iface_a, b, iface_b))?;
        if connected {
            self.inner
                .negotiate(LinkKey::new((a, iface_a).into(), (b, iface_b).into()));
        }
        Ok(connected)
    }

    pub fn disconnect(
        &self,
        a: DeviceId,
        iface_a: &str,
        b: DeviceId,
        iface_b: &str,
    ) -> Result<bool, CoreError> {
        let removed = self.inner.mutate(|t| t.disconnect(a, iface_a, b, iface_b))?;
        if removed {
            self.inner
                .negotiator
                .sever(&LinkKey::new((a, iface_a).into(), (b, iface_b).into()));
        } else {
            debug!(%a, iface_a, %b, iface_b, "nothing to disconnect");
        }
        Ok(removed)
    }

    // ── Reachability ─────────────────────────────────────────────────

    fn with_engine<R>(&self, f: impl FnOnce(&RoutingEngine<'_>) -> R) -> R {
        let snapshot = self.snapshot();
        let engine = RoutingEngine::new(&snapshot)
            .with_link_state_gating(self.inner.config.link_state_gates_routing);
        f(&engine)
    }

    pub fn test_connectivity(&self, source: DeviceId, target: DeviceId) -> PingReport {
        self.with_engine(|e| e.test_connectivity(source, target))
    }

    pub fn compute_route(&self, source: DeviceId, target: DeviceId) -> Option<Vec<DeviceId>> {
        self.with_engine(|e| e.compute_route(source, target))
    }

    pub fn trace(&self, source: DeviceId, target: DeviceId) -> TraceReport {
        self.with_engine(|e| e.trace(source, target))
    }

    pub fn routing_table(&self, id: DeviceId) -> Option<Vec<RouteEntry>> {
        self.with_engine(|e| e.routing_table(id))
    }

    pub fn exists_physical_path(&self, start: DeviceId, end: DeviceId) -> bool {
        let graph = self
            .snapshot()
            .adjacency(self.inner.config.link_state_gates_routing);
        reachability::exists_physical_path(&graph, start, end)
    }
}

impl std::fmt::Debug for Lab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lab")
            .field("config", &self.inner.config)
            .field("devices", &self.inner.topology.borrow().len())
            .field("negotiator", &self.inner.negotiator)
            .finish()
    }
}
