// ── Topology storage ──

mod topology;

pub use topology::{Link, Topology};
