//! Countdown state machine for the wind-down timer

use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest accepted duration in minutes
pub const MIN_DURATION_MINUTES: u64 = 1;
/// Largest accepted duration in minutes
pub const MAX_DURATION_MINUTES: u64 = 180;
/// Duration used when no persisted value exists
pub const DEFAULT_DURATION_MINUTES: u64 = 30;

/// Discrete phase of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Rejected control operation; the state is left unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// `start` while a countdown is already running or paused
    AlreadyStarted,
    /// `pause` while not running
    NotRunning,
    /// `resume` while not paused
    NotPaused,
    /// `stop` while no countdown is in progress
    NotStarted,
    /// duration change while a countdown is in progress
    DurationLocked,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "timer is already started"),
            Self::NotRunning => write!(f, "timer is not running"),
            Self::NotPaused => write!(f, "timer is not paused"),
            Self::NotStarted => write!(f, "no countdown is in progress"),
            Self::DurationLocked => {
                write!(f, "duration cannot be changed while a countdown is in progress")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// Result of applying one tick to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown continues with this many seconds left
    Continue(u64),
    /// Countdown reached zero; phase is now `Completed`
    Completed,
    /// Tolerated late tick; the countdown was already halted
    NotRunning,
}

/// Countdown timer state for a single wind-down session
#[derive(Debug, Clone)]
pub struct TimerState {
    /// Configured countdown length in seconds
    pub configured_seconds: u64,
    /// Seconds left in the current countdown; 0 while idle
    pub remaining_seconds: u64,
    /// Current phase of the countdown
    pub phase: Phase,
}

impl TimerState {
    /// Create an idle timer configured with the given duration in minutes
    pub fn new(duration_minutes: u64) -> Self {
        Self {
            configured_seconds: clamp_minutes(duration_minutes) * 60,
            remaining_seconds: 0,
            phase: Phase::Idle,
        }
    }

    /// Begin a countdown from the configured duration
    pub fn start(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Idle {
            return Err(TransitionError::AlreadyStarted);
        }
        self.remaining_seconds = self.configured_seconds;
        self.phase = Phase::Running;
        Ok(())
    }

    /// Suspend a running countdown, keeping the remaining time
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Running {
            return Err(TransitionError::NotRunning);
        }
        self.phase = Phase::Paused;
        Ok(())
    }

    /// Continue a paused countdown from where it left off
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Paused {
            return Err(TransitionError::NotPaused);
        }
        self.phase = Phase::Running;
        Ok(())
    }

    /// Abandon the countdown and return to idle without a completion cue
    pub fn stop(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Running && self.phase != Phase::Paused {
            return Err(TransitionError::NotStarted);
        }
        self.remaining_seconds = 0;
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Change the configured duration; only accepted while idle.
    ///
    /// Out-of-range values are clamped to [1, 180] minutes. Returns the
    /// minutes actually applied.
    pub fn set_duration(&mut self, minutes: u64) -> Result<u64, TransitionError> {
        if self.phase != Phase::Idle {
            return Err(TransitionError::DurationLocked);
        }
        let minutes = clamp_minutes(minutes);
        self.configured_seconds = minutes * 60;
        Ok(minutes)
    }

    /// Advance the countdown by one second.
    ///
    /// Does nothing unless the phase is `Running`, so a tick that races a
    /// cancellation cannot move the state.
    pub fn apply_tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome::NotRunning;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.phase = Phase::Completed;
            TickOutcome::Completed
        } else {
            TickOutcome::Continue(self.remaining_seconds)
        }
    }

    /// Automatic `Completed` -> `Idle` transition after the cue has fired
    pub fn finish_run(&mut self) {
        if self.phase == Phase::Completed {
            self.remaining_seconds = 0;
            self.phase = Phase::Idle;
        }
    }

    /// Configured duration in whole minutes
    pub fn configured_minutes(&self) -> u64 {
        self.configured_seconds / 60
    }

    /// Elapsed fraction of the countdown, clamped to [0, 1]; 0 while idle
    pub fn progress(&self) -> f64 {
        if self.configured_seconds == 0 || self.phase == Phase::Idle {
            return 0.0;
        }
        let elapsed = self.configured_seconds.saturating_sub(self.remaining_seconds);
        (elapsed as f64 / self.configured_seconds as f64).clamp(0.0, 1.0)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MINUTES)
    }
}

fn clamp_minutes(minutes: u64) -> u64 {
    minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_idle_with_no_remaining_time() {
        let timer = TimerState::new(30);
        assert_eq!(timer.phase, Phase::Idle);
        assert_eq!(timer.remaining_seconds, 0);
        assert_eq!(timer.configured_seconds, 1800);
    }

    #[test]
    fn set_duration_while_idle_applies_in_seconds() {
        let mut timer = TimerState::default();
        for minutes in [1, 15, 45, 180] {
            assert_eq!(timer.set_duration(minutes), Ok(minutes));
            assert_eq!(timer.configured_seconds, minutes * 60);
        }
    }

    #[test]
    fn set_duration_clamps_out_of_range_values() {
        let mut timer = TimerState::default();
        assert_eq!(timer.set_duration(0), Ok(1));
        assert_eq!(timer.configured_seconds, 60);
        assert_eq!(timer.set_duration(500), Ok(180));
        assert_eq!(timer.configured_seconds, 180 * 60);
    }

    #[test]
    fn set_duration_is_rejected_while_running_or_paused() {
        let mut timer = TimerState::new(30);
        timer.start().unwrap();
        assert_eq!(timer.set_duration(45), Err(TransitionError::DurationLocked));
        assert_eq!(timer.configured_seconds, 1800);

        timer.pause().unwrap();
        assert_eq!(timer.set_duration(45), Err(TransitionError::DurationLocked));
        assert_eq!(timer.configured_seconds, 1800);
    }

    #[test]
    fn start_seeds_remaining_from_configured_duration() {
        let mut timer = TimerState::new(2);
        timer.start().unwrap();
        assert_eq!(timer.phase, Phase::Running);
        assert_eq!(timer.remaining_seconds, 120);
    }

    #[test]
    fn double_start_is_rejected_and_leaves_state_unchanged() {
        let mut timer = TimerState::new(2);
        timer.start().unwrap();
        let before = timer.clone();
        assert_eq!(timer.start(), Err(TransitionError::AlreadyStarted));
        assert_eq!(timer.phase, before.phase);
        assert_eq!(timer.remaining_seconds, before.remaining_seconds);

        timer.pause().unwrap();
        assert_eq!(timer.start(), Err(TransitionError::AlreadyStarted));
        assert_eq!(timer.phase, Phase::Paused);
    }

    #[test]
    fn pause_and_resume_preserve_remaining_exactly() {
        let mut timer = TimerState::new(1);
        timer.start().unwrap();
        timer.apply_tick();
        timer.apply_tick();
        let remaining = timer.remaining_seconds;

        timer.pause().unwrap();
        assert_eq!(timer.phase, Phase::Paused);
        assert_eq!(timer.remaining_seconds, remaining);

        timer.resume().unwrap();
        assert_eq!(timer.phase, Phase::Running);
        assert_eq!(timer.remaining_seconds, remaining);
    }

    #[test]
    fn stop_resets_to_idle_from_running_and_paused() {
        let mut timer = TimerState::new(1);
        timer.start().unwrap();
        timer.stop().unwrap();
        assert_eq!(timer.phase, Phase::Idle);
        assert_eq!(timer.remaining_seconds, 0);

        timer.start().unwrap();
        timer.pause().unwrap();
        timer.stop().unwrap();
        assert_eq!(timer.phase, Phase::Idle);
        assert_eq!(timer.remaining_seconds, 0);

        assert_eq!(timer.stop(), Err(TransitionError::NotStarted));
    }

    #[test]
    fn full_run_completes_after_exactly_configured_ticks() {
        let mut timer = TimerState::new(1);
        timer.start().unwrap();
        for _ in 0..59 {
            assert!(matches!(timer.apply_tick(), TickOutcome::Continue(_)));
        }
        assert_eq!(timer.apply_tick(), TickOutcome::Completed);
        assert_eq!(timer.phase, Phase::Completed);
        assert_eq!(timer.remaining_seconds, 0);

        timer.finish_run();
        assert_eq!(timer.phase, Phase::Idle);
        assert_eq!(timer.remaining_seconds, 0);
    }

    #[test]
    fn ticks_are_ignored_when_not_running() {
        let mut timer = TimerState::new(1);
        assert_eq!(timer.apply_tick(), TickOutcome::NotRunning);

        timer.start().unwrap();
        timer.pause().unwrap();
        let remaining = timer.remaining_seconds;
        assert_eq!(timer.apply_tick(), TickOutcome::NotRunning);
        assert_eq!(timer.remaining_seconds, remaining);
    }

    #[test]
    fn progress_runs_from_zero_to_one() {
        let mut timer = TimerState::new(1);
        timer.start().unwrap();
        assert_eq!(timer.progress(), 0.0);

        for _ in 0..30 {
            timer.apply_tick();
        }
        assert!((timer.progress() - 0.5).abs() < f64::EPSILON);

        for _ in 0..30 {
            timer.apply_tick();
        }
        assert_eq!(timer.phase, Phase::Completed);
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn pause_requires_running_and_resume_requires_paused() {
        let mut timer = TimerState::new(1);
        assert_eq!(timer.pause(), Err(TransitionError::NotRunning));
        assert_eq!(timer.resume(), Err(TransitionError::NotPaused));

        timer.start().unwrap();
        assert_eq!(timer.resume(), Err(TransitionError::NotPaused));
    }
}
