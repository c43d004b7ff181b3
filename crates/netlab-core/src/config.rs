// ── Engine configuration ──
//
// Tuning knobs for a `Lab`. Built by the CLI (or any embedding display
// layer) and handed in; core never reads configuration files.

use std::time::Duration;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_SWITCH_PORTS: u16 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabConfig {
    /// How long a new cable stays `Down` before coming `Up`.
    pub settle_delay: Duration,
    /// Number of ports provisioned on a new switch.
    pub switch_ports: u16,
    /// When set, cables still negotiating are unusable for reachability.
    pub link_state_gates_routing: bool,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            switch_ports: DEFAULT_SWITCH_PORTS,
            link_state_gates_routing: false,
        }
    }
}
