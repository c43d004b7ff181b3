//! Topology model and connectivity reasoning for simulated networks.
//!
//! This crate owns the domain model and every reachability rule used by the
//! `netlab` CLI (and any other display layer embedding it):
//!
//! - **[`Lab`]**: Facade over a live topology. Mutations publish snapshots
//!   on a `watch` channel; new cables negotiate for a settle delay before
//!   coming up, driven by the [`LinkNegotiator`].
//!
//! - **[`Topology`]**: The device store. Keeps cable references symmetric
//!   and derives the device-level [`AdjacencyGraph`].
//!
//! - **[`RoutingEngine`]**: Read-only queries over a topology snapshot:
//!   [`test_connectivity`](RoutingEngine::test_connectivity) classifies a
//!   ping, [`compute_route`](RoutingEngine::compute_route) reports the
//!   devices a packet visits. Both share one resolver and always agree.
//!
//! - **Addressing** ([`address`]): Strict dotted-decimal IPv4 parsing and
//!   subnet math.
//!
//! - **Persistence** ([`ProjectFile`]): JSON project files, validated on
//!   load.

pub mod address;
pub mod config;
pub mod error;
pub mod lab;
pub mod link;
pub mod model;
pub mod project;
pub mod reachability;
pub mod routing;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use address::AddressError;
pub use config::LabConfig;
pub use error::CoreError;
pub use lab::Lab;
pub use link::{Claim, LinkEvent, LinkNegotiator};
pub use project::ProjectFile;
pub use reachability::{AdjacencyGraph, exists_physical_path, physical_path};
pub use routing::{
    Hop, PathKind, PingFailure, PingReport, RouteEntry, RouteVia, RoutingEngine, TraceReport,
};
pub use store::{Link, Topology};

pub use model::{
    Device, DeviceId, DeviceKind, Endpoint, Interface, IpConfig, LinkKey, LinkState, Media,
    Position,
};
