//! Wall-clock phase timer with pause support.
//!
//! Times are Unix seconds passed in by the caller, so the timer itself never
//! reads the clock.

/// Current time in Unix seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimer {
    started: i64,
    /// Elapsed seconds captured when the pause began
    frozen: Option<u64>,
}

impl PhaseTimer {
    pub fn start(now: i64) -> Self {
        Self {
            started: now,
            frozen: None,
        }
    }

    /// Timer that has already run for `elapsed` seconds
    pub fn resume_at(now: i64, elapsed: u64) -> Self {
        Self {
            started: now - elapsed as i64,
            frozen: None,
        }
    }

    pub fn elapsed(&self, now: i64) -> u64 {
        match self.frozen {
            Some(frozen) => frozen,
            None => (now - self.started).max(0) as u64,
        }
    }

    /// Start of the phase; while paused it keeps moving so elapsed stays put
    pub fn started_at(&self, now: i64) -> i64 {
        match self.frozen {
            Some(frozen) => now - frozen as i64,
            None => self.started,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn pause(&mut self, now: i64) {
        if self.frozen.is_none() {
            self.frozen = Some(self.elapsed(now));
        }
    }

    pub fn resume(&mut self, now: i64) {
        if let Some(frozen) = self.frozen.take() {
            self.started = now - frozen as i64;
        }
    }

    /// Start over at zero, keeping the pause state
    pub fn restart(&mut self, now: i64) {
        self.started = now;
        if self.frozen.is_some() {
            self.frozen = Some(0);
        }
    }
}
