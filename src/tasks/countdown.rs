//! Countdown tick background task

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::{
    services::CompletionNotifier,
    state::{AppState, Phase, TickOutcome, TimerCommand},
};

/// Message surfaced to the user when a countdown completes
pub const COMPLETION_MESSAGE: &str = "Phone-free time completed!";

/// Background task that drives the one-second countdown tick.
///
/// This is the only tick source for the timer: the interval lives solely
/// inside `run_countdown`, so at most one tick is armed at any time, and
/// dropping it on `Halt` guarantees no further decrements.
pub async fn countdown_task(state: Arc<AppState>, notifier: Arc<dyn CompletionNotifier>) {
    info!("Starting countdown task");

    let mut commands = state.command_tx.subscribe();

    loop {
        match commands.recv().await {
            Ok(TimerCommand::Run) => {
                run_countdown(&state, notifier.as_ref(), &mut commands).await;
            }
            Ok(TimerCommand::Halt) => {
                debug!("Halt received while tick is already disarmed");
            }
            Err(RecvError::Lagged(skipped)) => {
                error!("Countdown task lagged, skipped {} commands", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Command channel closed, countdown task exiting");
                break;
            }
        }
    }
}

/// Run one armed stretch of the countdown until it is halted or completes
async fn run_countdown(
    state: &Arc<AppState>,
    notifier: &dyn CompletionNotifier,
    commands: &mut broadcast::Receiver<TimerCommand>,
) {
    debug!("Tick armed");

    let mut ticker = interval(Duration::from_secs(1));
    // The interval's first tick completes immediately; consume it so the
    // first decrement lands a full second after arming.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match state.apply_tick() {
                    Ok((TickOutcome::Continue(remaining), _)) => {
                        debug!("Tick: {} seconds remaining", remaining);
                    }
                    Ok((TickOutcome::Completed, _)) => {
                        info!("Countdown completed, firing completion cue");
                        notifier.play_completion_cue();
                        notifier.notify_user(COMPLETION_MESSAGE);

                        if let Err(e) = state.finish_run() {
                            error!("Failed to reset timer after completion: {}", e);
                        }
                        break;
                    }
                    Ok((TickOutcome::NotRunning, _)) => {
                        debug!("Tick fired for a halted countdown, disarming");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to apply tick: {}", e);
                        break;
                    }
                }
            }

            command = commands.recv() => {
                match command {
                    Ok(TimerCommand::Halt) => {
                        debug!("Tick disarmed");
                        break;
                    }
                    Ok(TimerCommand::Run) => {
                        debug!("Run received while tick is already armed");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        error!("Countdown task lagged, skipped {} commands", skipped);
                        // A Halt may have been missed; fall back to the phase
                        match state.snapshot() {
                            Ok(snapshot) if snapshot.phase == Phase::Running => {}
                            _ => break,
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Command channel closed, disarming tick");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::sleep;

    #[derive(Default)]
    struct CountingNotifier {
        cues: AtomicUsize,
        messages: AtomicUsize,
    }

    impl CompletionNotifier for CountingNotifier {
        fn play_completion_cue(&self) {
            self.cues.fetch_add(1, Ordering::SeqCst);
        }

        fn notify_user(&self, _message: &str) {
            self.messages.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn spawn_task(duration_minutes: u64) -> (Arc<AppState>, Arc<CountingNotifier>) {
        let state = Arc::new(AppState::new(0, "127.0.0.1".to_string(), duration_minutes));
        let notifier = Arc::new(CountingNotifier::default());
        tokio::spawn(countdown_task(
            Arc::clone(&state),
            Arc::clone(&notifier) as Arc<dyn CompletionNotifier>,
        ));

        // Let the task subscribe before any command is published
        while state.command_tx.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }
        (state, notifier)
    }

    async fn wait_for_phase(state: &AppState, phase: Phase) {
        loop {
            if state.snapshot().unwrap().phase == phase {
                return;
            }
            sleep(Duration::from_millis(50)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_fires_exactly_one_cue_then_returns_to_idle() {
        let (state, notifier) = spawn_task(1).await;

        state.start_timer().unwrap();
        assert_eq!(state.snapshot().unwrap().remaining_seconds, 60);

        // Cue fires once when the countdown reaches zero
        while notifier.cues.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(100)).await;
        }
        wait_for_phase(&state, Phase::Idle).await;

        assert_eq!(notifier.cues.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.messages.load(Ordering::SeqCst), 1);
        assert_eq!(state.snapshot().unwrap().remaining_seconds, 0);

        // No stray ticks after completion
        sleep(Duration::from_secs(10)).await;
        assert_eq!(notifier.cues.load(Ordering::SeqCst), 1);
        assert_eq!(state.snapshot().unwrap().phase, Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_is_immediately_restartable() {
        let (state, notifier) = spawn_task(1).await;

        state.start_timer().unwrap();
        while notifier.cues.load(Ordering::SeqCst) < 1 {
            sleep(Duration::from_millis(100)).await;
        }
        wait_for_phase(&state, Phase::Idle).await;

        state.start_timer().unwrap();
        while notifier.cues.load(Ordering::SeqCst) < 2 {
            sleep(Duration::from_millis(100)).await;
        }
        wait_for_phase(&state, Phase::Idle).await;

        assert_eq!(notifier.cues.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_halts_ticks_and_resume_continues_without_drift() {
        let (state, notifier) = spawn_task(1).await;

        state.start_timer().unwrap();
        sleep(Duration::from_secs(10)).await;

        let paused = state.pause_timer().unwrap();
        let frozen = paused.remaining_seconds;
        assert!(frozen < 60 && frozen > 40);

        // No decrements arrive while paused, however long it lasts
        sleep(Duration::from_secs(120)).await;
        assert_eq!(state.snapshot().unwrap().remaining_seconds, frozen);
        assert_eq!(state.snapshot().unwrap().phase, Phase::Paused);

        state.resume_timer().unwrap();
        sleep(Duration::from_secs(5)).await;
        let resumed = state.snapshot().unwrap().remaining_seconds;
        assert!(resumed < frozen);

        assert_eq!(notifier.cues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_resets_without_firing_the_cue() {
        let (state, notifier) = spawn_task(1).await;

        state.start_timer().unwrap();
        sleep(Duration::from_secs(5)).await;
        state.stop_timer().unwrap();

        wait_for_phase(&state, Phase::Idle).await;
        assert_eq!(state.snapshot().unwrap().remaining_seconds, 0);

        // Even well past the original deadline the cue never fires
        sleep(Duration::from_secs(120)).await;
        assert_eq!(notifier.cues.load(Ordering::SeqCst), 0);
    }
}
