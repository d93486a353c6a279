//! One-shot delay timer with generation-checked cancellation.
//!
//! Each `arm` returns a token carrying the current generation. `cancel` and
//! re-arming bump the generation, so a token taken before a cancellation is
//! recognizably stale even if its expiry is delivered afterwards.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Default)]
pub struct DelayTimer {
    generation: u64,
    deadline: Option<Instant>,
}

impl DelayTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, deadline: Instant) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = Some(deadline);
        TimerToken(self.generation)
    }

    pub fn cancel(&mut self) {
        if self.deadline.is_some() {
            tracing::debug!(generation = self.generation, "delay timer cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and hand out the token if the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<TimerToken> {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                Some(TimerToken(self.generation))
            }
            _ => None,
        }
    }

    pub fn is_current(&self, token: TimerToken) -> bool {
        token.0 == self.generation
    }
}
