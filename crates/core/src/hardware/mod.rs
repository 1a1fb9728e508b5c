//! Hardware surface of the ball-lock subsystem.
//!
//! Switch transitions arrive from the driver layer at most once per physical
//! transition (debounced there). Coil commands are fire-and-forget: nothing is
//! acknowledged, correctness comes from timing and later sensor feedback.
//!
//! Reactions that must happen without a software round-trip are expressed as
//! [`HardwareRule`] descriptors that the device installs and tears down as
//! part of its own state transitions.

mod logging;
mod rules;
mod traits;
mod types;

pub use logging::LoggingActuators;
pub use rules::{HardwareRule, RuleAction, RuleEffect, RuleId};
pub use traits::Actuators;
pub use types::{Coil, Switch, SwitchEvent, SwitchState, UnknownSwitch};
