//! Trait definitions for the driver layer.

use super::rules::{HardwareRule, RuleId};
use super::types::Coil;

/// Outbound coil commands. Fire-and-forget: there is no acknowledgement
/// channel, so implementations must not block.
pub trait Actuators: Send + Sync {
    /// Energize a coil for `ms` milliseconds.
    fn pulse(&self, coil: Coil, ms: u64);

    /// Hold a coil on until disabled.
    fn enable(&self, coil: Coil);

    fn disable(&self, coil: Coil);

    /// Install (or replace) a driver-board rule.
    fn install_rule(&self, rule: HardwareRule);

    /// Tear down a rule. Removing a rule that is not installed is a no-op.
    fn remove_rule(&self, id: RuleId);
}
