use std::time::{Duration, Instant};

/// Keys arriving this soon after an input-method composition ends may be the
/// keystroke that confirmed it.
pub const COMPOSITION_GRACE: Duration = Duration::from_millis(100);

/// Tracks input-method composition so that confirming a composition is not
/// mistaken for a command.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompositionGuard {
    active: bool,
    ended_at: Option<Instant>,
}

impl CompositionGuard {
    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn end(&mut self, at: Instant) {
        self.active = false;
        self.ended_at = Some(at);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether keys at `now` should be treated as part of a composition.
    pub fn suppresses(&self, now: Instant) -> bool {
        self.active
            || self
                .ended_at
                .map_or(false, |ended| now.saturating_duration_since(ended) < COMPOSITION_GRACE)
    }
}
