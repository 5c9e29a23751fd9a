// ── Domain model ──
//
// Canonical types published to front ends. Everything here is derived
// per refresh cycle and replaced wholesale, never mutated in place.

pub mod security;
pub mod zone;

pub use security::{DdosEvent, DetectionTier, IpHit, TopBlock, ZoneReport};
pub use zone::{Zone, ZoneStatus};
