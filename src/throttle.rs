//! Notification cooldown gate.
//!
//! Two states: cooling down, or eligible. A notification is allowed only if
//! strictly more than `cooldown` has passed since the last allowed one. The
//! timestamp moves when the gate opens, not when the dispatch finishes, so
//! a burst of events is collapsed into one notification.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Decision from the gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Notify now. The gate has already recorded this instant.
    Open,
    /// Still cooling down.
    Closed,
}

/// Cooldown gate owned by a single notifier.
#[derive(Debug)]
pub struct CooldownGate {
    /// When the gate last opened. `None` until the first notification.
    last_opened: Option<Instant>,

    cooldown: Duration,
}

impl CooldownGate {
    /// Create a new gate with the given cooldown.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_opened: None,
            cooldown,
        }
    }

    /// Check the gate at `now`, recording `now` if it opens.
    pub fn try_open(&mut self, now: Instant) -> GateDecision {
        let Some(last) = self.last_opened else {
            debug!("First notification, gate open");
            self.last_opened = Some(now);
            return GateDecision::Open;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed <= self.cooldown {
            debug!(
                "Cooling down: elapsed {:?} <= cooldown {:?}",
                elapsed, self.cooldown
            );
            return GateDecision::Closed;
        }

        debug!(
            "Elapsed {:?} > cooldown {:?}, gate open",
            elapsed, self.cooldown
        );
        self.last_opened = Some(now);
        GateDecision::Open
    }

    /// When the gate last opened, if ever.
    pub fn last_opened(&self) -> Option<Instant> {
        self.last_opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_check_opens() {
        let mut gate = CooldownGate::new(ms(5000));
        let t0 = Instant::now();
        assert!(gate.last_opened().is_none());
        assert_eq!(gate.try_open(t0), GateDecision::Open);
        assert_eq!(gate.last_opened(), Some(t0));
    }

    #[test]
    fn test_burst_is_suppressed() {
        let mut gate = CooldownGate::new(ms(5000));
        let t0 = Instant::now();

        assert_eq!(gate.try_open(t0), GateDecision::Open);
        assert_eq!(gate.try_open(t0 + ms(1)), GateDecision::Closed);
        assert_eq!(gate.try_open(t0 + ms(100)), GateDecision::Closed);
        assert_eq!(gate.last_opened(), Some(t0));
    }

    #[test]
    fn test_exact_cooldown_is_still_closed() {
        let mut gate = CooldownGate::new(ms(5000));
        let t0 = Instant::now();

        assert_eq!(gate.try_open(t0), GateDecision::Open);
        assert_eq!(gate.try_open(t0 + ms(5000)), GateDecision::Closed);
        assert_eq!(gate.try_open(t0 + ms(5001)), GateDecision::Open);
    }

    #[test]
    fn test_cooldown_measured_from_last_open() {
        let mut gate = CooldownGate::new(ms(5000));
        let t0 = Instant::now();

        // Events every 3s: suppressed ones must not extend the cooldown
        assert_eq!(gate.try_open(t0), GateDecision::Open);
        assert_eq!(gate.try_open(t0 + ms(3000)), GateDecision::Closed);
        assert_eq!(gate.try_open(t0 + ms(6000)), GateDecision::Open);
        assert_eq!(gate.try_open(t0 + ms(9000)), GateDecision::Closed);
        assert_eq!(gate.try_open(t0 + ms(12000)), GateDecision::Open);
        assert_eq!(gate.last_opened(), Some(t0 + ms(12000)));
    }

    #[test]
    fn test_spaced_events_all_open() {
        let mut gate = CooldownGate::new(ms(5000));
        let t0 = Instant::now();

        for i in 0..10 {
            assert_eq!(gate.try_open(t0 + ms(i * 5001)), GateDecision::Open);
        }
    }

    #[test]
    fn test_zero_cooldown_still_rejects_same_instant() {
        let mut gate = CooldownGate::new(Duration::ZERO);
        let t0 = Instant::now();

        assert_eq!(gate.try_open(t0), GateDecision::Open);
        assert_eq!(gate.try_open(t0), GateDecision::Closed);
        assert_eq!(gate.try_open(t0 + ms(1)), GateDecision::Open);
    }
}
