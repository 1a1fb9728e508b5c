//! Borrowed view of the machine handed to the rules.

use crate::audit::{AuditEvent, AuditHandle};
use crate::device::PlanetDevice;
use crate::ledger::{BallLedger, LaunchPlan};
use crate::timers::TimerQueue;

/// The device, ledger and clock, borrowed together so the rules can issue
/// eject and launch requests. Every request goes through the ledger so the
/// mirrored counts stay in step with the device.
pub struct RulesContext<'a> {
    pub device: &'a mut PlanetDevice,
    pub ledger: &'a mut BallLedger,
    pub timers: &'a mut TimerQueue,
    pub audit: Option<&'a AuditHandle>,
}

impl RulesContext<'_> {
    /// Release up to `count` retained balls. Returns the accepted count.
    pub fn eject(&mut self, count: u32, source: &str) -> u32 {
        let accepted = self.ledger.eject(count, self.device, self.timers);
        self.emit(AuditEvent::EjectRequested {
            requested: count,
            accepted,
            pending_eject: self.device.pending_eject(),
            source: source.to_string(),
        });
        if accepted < count {
            self.emit(AuditEvent::CountClamped {
                counter: "pending_eject".to_string(),
                requested: count,
                applied: accepted,
            });
        }
        accepted
    }

    /// Put `count` more balls into play, ejecting any feed shortfall.
    pub fn launch(&mut self, count: u32, stealth: bool) -> LaunchPlan {
        let pending_before = self.device.pending_eject();
        let plan = self
            .ledger
            .launch_balls(count, stealth, self.device, self.timers);
        if plan.ejected > 0 {
            self.emit(AuditEvent::EjectRequested {
                requested: plan.ejected,
                accepted: plan.ejected,
                pending_eject: pending_before + plan.ejected,
                source: "launch_shortfall".to_string(),
            });
        }
        if plan.unfilled > 0 {
            self.emit(AuditEvent::CountClamped {
                counter: "launch".to_string(),
                requested: count,
                applied: plan.total(),
            });
        }
        plan
    }

    pub fn emit(&self, event: AuditEvent) {
        if let Some(audit) = self.audit {
            audit.try_emit(event);
        }
    }
}
