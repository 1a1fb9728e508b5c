//! Ball-lock device orchestrator ("the planet").
//!
//! Owns the rotating holder, its release crane and magnet, and the lock gate.
//! Other components influence the device only through `enable_lock`,
//! `disable_lock`, `request_eject` and `recover`:
//! - **Counts**: `locked_count >= pending_eject`, updated on capture, on
//!   request and on confirmed release
//! - **Ejects**: one physical release sequence at a time; extra requests
//!   extend the pending count
//! - **Recovery**: stalls are not detected here; the external ball search
//!   re-invokes `recover`, which is always safe to call

mod config;
mod orchestrator;
mod types;

pub use config::{DeviceConfig, EjectStrategy};
pub use orchestrator::PlanetDevice;
pub use types::{DeviceEvent, DeviceStatus, EjectPhase, RecoveryOutcome, RotationPhase};
