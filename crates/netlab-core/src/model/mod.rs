// ── Domain model ──
//
// Devices own their interfaces; interfaces reference their cable peer
// by device id and interface name.

mod device;
mod entity_id;
mod interface;

pub use device::{Device, DeviceKind, Position};
pub use entity_id::{DeviceId, Endpoint, LinkKey};
pub use interface::{Interface, IpConfig, LinkState, Media};
