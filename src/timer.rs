use std::time::Instant;

/// Identifies one arming of a [`TimerSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    generation: u64,
    due: Instant,
}

impl TimerHandle {
    pub fn due(&self) -> Instant {
        self.due
    }
}

/// An owned, optional, cancellable single-shot deadline.
///
/// At most one deadline is armed at a time: arming again replaces the
/// previous one, so a slot can never fire twice for the same round.
/// Repeating timers are modelled by re-arming from the fire site.
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<TimerHandle>,
    generation: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the slot for `due`, returning true if a pending deadline was replaced.
    pub fn arm(&mut self, due: Instant) -> bool {
        let replaced = self.armed.is_some();
        self.generation += 1;
        self.armed = Some(TimerHandle {
            generation: self.generation,
            due,
        });
        replaced
    }

    /// Disarms the slot. Safe to call when nothing is armed.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn due(&self) -> Option<Instant> {
        self.armed.map(|h| h.due)
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.armed
    }

    /// True if `handle` is the deadline currently armed in this slot
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.armed == Some(handle)
    }

    /// Disarms the slot if `handle` is still the armed deadline and is due
    /// at `now`. A handle from an earlier arming never fires.
    pub fn fire(&mut self, handle: TimerHandle, now: Instant) -> bool {
        if self.is_current(handle) && handle.due <= now {
            self.armed = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_when_idle_is_a_noop() {
        let mut slot = TimerSlot::new();
        assert!(!slot.cancel());
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_arming_replaces_pending_deadline() {
        let now = Instant::now();
        let mut slot = TimerSlot::new();

        assert!(!slot.arm(now + Duration::from_millis(100)));
        let first = slot.handle().unwrap();
        assert!(slot.arm(now + Duration::from_millis(500)));

        assert!(!slot.is_current(first));
        assert_eq!(slot.due(), Some(now + Duration::from_millis(500)));
        // The replaced deadline must not fire
        assert!(!slot.fire(first, now + Duration::from_millis(200)));
        assert!(slot.is_armed());
    }

    #[test]
    fn test_fires_exactly_once() {
        let now = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(now + Duration::from_millis(10));
        let handle = slot.handle().unwrap();

        assert!(!slot.fire(handle, now));
        assert!(slot.fire(handle, now + Duration::from_millis(10)));
        assert!(!slot.fire(handle, now + Duration::from_secs(1)));
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_stale_handle_for_same_instant_does_not_fire() {
        let now = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(now);
        let stale = slot.handle().unwrap();
        slot.cancel();
        slot.arm(now);

        assert!(!slot.fire(stale, now));
        let current = slot.handle().unwrap();
        assert_ne!(stale, current);
        assert!(slot.fire(current, now));
    }
}
