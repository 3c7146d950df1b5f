//! One-shot level countdown

/// Countdown started with the level. Times are host clock seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTimer {
    limit: u32,
    started: f64,
    armed: bool,
}

impl LevelTimer {
    pub fn start(limit_seconds: u32, now: f64) -> Self {
        Self {
            limit: limit_seconds,
            started: now,
            armed: true,
        }
    }

    /// True exactly once, on the first poll at or past the limit
    pub fn poll(&mut self, now: f64) -> bool {
        if self.armed && now - self.started >= self.limit as f64 {
            self.armed = false;
            return true;
        }
        false
    }

    /// Cancel the countdown; `poll` never fires afterwards
    pub fn stop(&mut self) {
        self.armed = false;
    }

    pub fn is_running(&self) -> bool {
        self.armed
    }

    pub fn limit_seconds(&self) -> u32 {
        self.limit
    }

    pub fn elapsed_whole_seconds(&self, now: f64) -> u64 {
        (now - self.started).max(0.0).floor() as u64
    }

    pub fn remaining_whole_seconds(&self, now: f64) -> u64 {
        (self.limit as u64).saturating_sub(self.elapsed_whole_seconds(now))
    }

    /// Remaining time as `mm:ss`
    pub fn clock_text(&self, now: f64) -> String {
        let remaining = self.remaining_whole_seconds(now);
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }
}
