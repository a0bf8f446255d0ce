//! Main application state management

use std::{
    sync::Mutex,
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::timer_state::{Phase, TickOutcome, TimerState, TransitionError};

/// Control message for the countdown tick task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Arm the one-second tick
    Run,
    /// Disarm the tick immediately
    Halt,
}

/// Failure of a timer control operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Precondition violation; the timer state is unchanged
    Rejected(TransitionError),
    /// Lock failure or other internal fault
    Internal(String),
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(e) => write!(f, "{}", e),
            Self::Internal(e) => write!(f, "{}", e),
        }
    }
}

/// Read-only view of the timer published to watchers and API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub duration_minutes: u64,
    pub configured_seconds: u64,
    pub remaining_seconds: u64,
    pub progress: f64,
    pub remaining_display: String,
}

impl TimerSnapshot {
    fn of(timer: &TimerState) -> Self {
        // While idle the display shows the configured length, matching what
        // a client renders before a countdown starts.
        let display_seconds = if timer.phase == Phase::Idle {
            timer.configured_seconds
        } else {
            timer.remaining_seconds
        };
        Self {
            phase: timer.phase,
            duration_minutes: timer.configured_minutes(),
            configured_seconds: timer.configured_seconds,
            remaining_seconds: timer.remaining_seconds,
            progress: timer.progress(),
            remaining_display: format_clock(display_seconds),
        }
    }
}

/// Format seconds as a MM:SS clock string
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Main application state owning the countdown timer and its channels
#[derive(Debug)]
pub struct AppState {
    /// The countdown state machine
    timer: Mutex<TimerState>,
    /// Recoverable errors surfaced to clients (persistence failures etc.)
    errors: Mutex<Vec<String>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel carrying tick arm/disarm commands to the countdown task
    pub command_tx: broadcast::Sender<TimerCommand>,
    /// Channel for timer snapshot updates
    pub timer_update_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _timer_update_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create a new AppState with an idle timer of the given duration
    pub fn new(port: u16, host: String, duration_minutes: u64) -> Self {
        let timer = TimerState::new(duration_minutes);
        let (command_tx, _) = broadcast::channel(16);
        let (timer_update_tx, timer_update_rx) = watch::channel(TimerSnapshot::of(&timer));

        Self {
            timer: Mutex::new(timer),
            errors: Mutex::new(Vec::new()),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            command_tx,
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
        }
    }

    /// Apply a transition under the timer lock and publish the new snapshot
    fn transition<F>(&self, action: &str, apply: F) -> Result<TimerSnapshot, ControlError>
    where
        F: FnOnce(&mut TimerState) -> Result<(), TransitionError>,
    {
        let snapshot = {
            let mut timer = self.timer.lock()
                .map_err(|e| ControlError::Internal(format!("Failed to lock timer state: {}", e)))?;
            apply(&mut timer).map_err(ControlError::Rejected)?;
            TimerSnapshot::of(&timer)
        };

        self.record_action(action);
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Start a countdown from idle and arm the tick
    pub fn start_timer(&self) -> Result<TimerSnapshot, ControlError> {
        let snapshot = self.transition("start", TimerState::start)?;
        info!("Countdown started: {} remaining", snapshot.remaining_display);
        self.send_command(TimerCommand::Run);
        Ok(snapshot)
    }

    /// Pause a running countdown and disarm the tick
    pub fn pause_timer(&self) -> Result<TimerSnapshot, ControlError> {
        let snapshot = self.transition("pause", TimerState::pause)?;
        info!("Countdown paused with {} remaining", snapshot.remaining_display);
        self.send_command(TimerCommand::Halt);
        Ok(snapshot)
    }

    /// Resume a paused countdown and re-arm the tick
    pub fn resume_timer(&self) -> Result<TimerSnapshot, ControlError> {
        let snapshot = self.transition("resume", TimerState::resume)?;
        info!("Countdown resumed with {} remaining", snapshot.remaining_display);
        self.send_command(TimerCommand::Run);
        Ok(snapshot)
    }

    /// Stop the countdown, reset to idle and disarm the tick
    pub fn stop_timer(&self) -> Result<TimerSnapshot, ControlError> {
        let snapshot = self.transition("stop", TimerState::stop)?;
        info!("Countdown stopped");
        self.send_command(TimerCommand::Halt);
        Ok(snapshot)
    }

    /// Change the configured duration; only accepted while idle.
    ///
    /// Returns the minutes actually applied after clamping together with the
    /// updated snapshot. Persistence of the new value is the caller's
    /// concern and never blocks this transition.
    pub fn set_duration(&self, minutes: u64) -> Result<(u64, TimerSnapshot), ControlError> {
        let (applied, snapshot) = {
            let mut timer = self.timer.lock()
                .map_err(|e| ControlError::Internal(format!("Failed to lock timer state: {}", e)))?;
            let applied = timer.set_duration(minutes).map_err(ControlError::Rejected)?;
            (applied, TimerSnapshot::of(&timer))
        };

        info!("Timer duration set to {} minutes", applied);
        self.record_action("set-duration");
        self.publish(&snapshot);
        Ok((applied, snapshot))
    }

    /// Advance the countdown by one second (called only by the tick task)
    pub fn apply_tick(&self) -> Result<(TickOutcome, TimerSnapshot), String> {
        let (outcome, snapshot) = {
            let mut timer = self.timer.lock()
                .map_err(|e| format!("Failed to lock timer state: {}", e))?;
            let outcome = timer.apply_tick();
            (outcome, TimerSnapshot::of(&timer))
        };

        if outcome != TickOutcome::NotRunning {
            self.publish(&snapshot);
        }
        Ok((outcome, snapshot))
    }

    /// Return the timer to idle after a completed run's cue has fired
    pub fn finish_run(&self) -> Result<TimerSnapshot, String> {
        let snapshot = {
            let mut timer = self.timer.lock()
                .map_err(|e| format!("Failed to lock timer state: {}", e))?;
            timer.finish_run();
            TimerSnapshot::of(&timer)
        };

        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Get the current timer snapshot
    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        self.timer.lock()
            .map(|timer| TimerSnapshot::of(&timer))
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Add a recoverable error for client visibility
    pub fn add_error(&self, error: String) {
        warn!("Adding error to state: {}", error);
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error);
        }
    }

    /// Clear errors mentioning a specific component
    pub fn clear_errors_for(&self, component: &str) {
        if let Ok(mut errors) = self.errors.lock() {
            let initial_count = errors.len();
            errors.retain(|error| !error.to_lowercase().contains(&component.to_lowercase()));
            if errors.len() != initial_count {
                debug!("Cleared {} errors for component: {}", initial_count - errors.len(), component);
            }
        }
    }

    /// Current list of recoverable errors
    pub fn get_errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    fn publish(&self, snapshot: &TimerSnapshot) {
        if let Err(e) = self.timer_update_tx.send(snapshot.clone()) {
            warn!("Failed to send timer update: {}", e);
        }
    }

    fn send_command(&self, command: TimerCommand) {
        if let Err(e) = self.command_tx.send(command) {
            warn!("No countdown task listening for {:?}: {}", command, e);
        }
    }
}
