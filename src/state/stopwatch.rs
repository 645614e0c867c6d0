//! Stopwatch state machine

use serde::{Deserialize, Serialize};

/// Observable phase of the stopwatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Elapsed-time state for the workout stopwatch.
///
/// Elapsed time is committed into `accumulated_millis` only at pause and stop;
/// while running, the in-flight interval is derived from `run_start_epoch_millis`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwatchState {
    accumulated_millis: u64,
    run_start_epoch_millis: i64,
    is_running: bool,
    has_started: bool,
}

impl StopwatchState {
    /// Create a stopwatch at zero in the Idle phase
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a stopwatch from restored fields.
    ///
    /// A running stopwatch resumes counting from `now` rather than from the
    /// instant it was captured at. `is_running` implies `has_started`.
    pub fn restored(accumulated_millis: u64, is_running: bool, has_started: bool, now: i64) -> Self {
        let has_started = has_started || is_running;
        if !has_started {
            return Self::new();
        }

        Self {
            accumulated_millis,
            run_start_epoch_millis: if is_running { now } else { 0 },
            is_running,
            has_started,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.has_started, self.is_running) {
            (false, _) => Phase::Idle,
            (true, true) => Phase::Running,
            (true, false) => Phase::Paused,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    /// Committed elapsed time, excluding any running interval
    pub fn accumulated_millis(&self) -> u64 {
        self.accumulated_millis
    }

    /// Start or resume. Returns false when already running.
    pub fn start(&mut self, now: i64) -> bool {
        if self.is_running {
            return false;
        }

        if !self.has_started {
            self.accumulated_millis = 0;
        }
        self.run_start_epoch_millis = now;
        self.is_running = true;
        self.has_started = true;
        true
    }

    /// Pause a running stopwatch. Returns false when not running.
    pub fn pause(&mut self, now: i64) -> bool {
        if !self.is_running {
            return false;
        }

        self.commit(now);
        self.is_running = false;
        true
    }

    /// Stop and reset to Idle.
    ///
    /// Returns the total elapsed time of the finished session, or `None` when
    /// the stopwatch was already idle.
    pub fn stop(&mut self, now: i64) -> Option<u64> {
        if !self.has_started {
            return None;
        }

        if self.is_running {
            self.commit(now);
        }
        let total = self.accumulated_millis;
        *self = Self::new();
        Some(total)
    }

    /// Elapsed time as of `now`
    pub fn elapsed(&self, now: i64) -> u64 {
        if self.is_running {
            self.accumulated_millis.saturating_add(self.running_interval(now))
        } else {
            self.accumulated_millis
        }
    }

    fn commit(&mut self, now: i64) {
        self.accumulated_millis = self.accumulated_millis.saturating_add(self.running_interval(now));
    }

    // A wall clock that steps backwards contributes nothing
    fn running_interval(&self, now: i64) -> u64 {
        u64::try_from(now.saturating_sub(self.run_start_epoch_millis)).unwrap_or(0)
    }
}
