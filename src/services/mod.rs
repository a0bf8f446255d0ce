//! External collaborator module
//!
//! This module contains the persisted-settings store and the completion
//! notification surface consumed by the countdown timer.

pub mod notify;
pub mod settings;

// Re-export main types
pub use notify::{CompletionNotifier, SystemNotifier};
pub use settings::{RoutineSettings, SettingsStore};
