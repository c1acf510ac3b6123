use std::time::{Duration, Instant};

/// Identifies one in-flight operation. A result is only applied if its ticket is still current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Re-entrancy guard plus cool-down for one kind of background edit.
///
/// At most one operation holds the guard at a time, and a new one may not start until
/// `cooldown` has passed since the previous start.
#[derive(Clone, Debug)]
pub struct OperationGuard {
    cooldown: Duration,
    in_flight: Option<Ticket>,
    last_start: Option<Instant>,
    issued: u64,
}

impl OperationGuard {
    /// Guard with the given minimum time between starts.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            in_flight: None,
            last_start: None,
            issued: 0,
        }
    }

    /// Minimum time between starts.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Return `true` while an operation is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Try to start an operation at `now`.
    pub fn try_begin(&mut self, now: Instant) -> Option<Ticket> {
        if self.in_flight.is_some() {
            return None;
        }
        if let Some(last) = self.last_start
            && now.saturating_duration_since(last) < self.cooldown
        {
            return None;
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.in_flight = Some(ticket);
        self.last_start = Some(now);
        Some(ticket)
    }

    /// Release the guard. Returns `false` if `ticket` is not the in-flight one, in which case
    /// the caller must discard its result.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Release the guard without a result (job setup failed before it was dispatched).
    pub fn abandon(&mut self) {
        self.in_flight = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/guard.rs"]
mod tests;
