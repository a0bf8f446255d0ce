//! Winddown - A state-managed HTTP server for evening wind-down countdown timing
//!
//! This library provides a phone-free countdown timer: a single-instance
//! state machine with start/pause/resume/stop controls, a one-second tick
//! task, a one-shot completion cue and persisted duration settings.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
