//! Completion cue and user notification collaborator

use std::path::Path;
use std::process::Stdio;

use tracing::{debug, warn};

/// Terminal notification surface for a completed countdown.
///
/// Both operations are fire-and-forget: failures are logged and swallowed,
/// never surfaced to the state machine.
pub trait CompletionNotifier: Send + Sync {
    /// Play the short completion sound
    fn play_completion_cue(&self);
    /// Surface a user-visible message
    fn notify_user(&self, message: &str);
}

/// Well-known system sounds, tried in order; the first playable one wins
const COMPLETION_SOUNDS: [(&str, &str); 3] = [
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/prompt.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

/// Desktop notifier backed by a system audio player and desktop notifications
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    sound_enabled: bool,
}

impl SystemNotifier {
    pub fn new(sound_enabled: bool) -> Self {
        Self { sound_enabled }
    }
}

impl CompletionNotifier for SystemNotifier {
    fn play_completion_cue(&self) {
        if !self.sound_enabled {
            debug!("Completion sound disabled, skipping audio cue");
            return;
        }

        tokio::spawn(async {
            for (player, sound_file) in COMPLETION_SOUNDS {
                if !Path::new(sound_file).exists() {
                    continue;
                }
                match tokio::process::Command::new(player)
                    .arg(sound_file)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                {
                    Ok(status) if status.success() => return,
                    Ok(status) => debug!("{} exited with status {}", player, status),
                    Err(e) => debug!("Failed to run {}: {}", player, e),
                }
            }
            debug!("No completion sound could be played");
        });
    }

    fn notify_user(&self, message: &str) {
        let message = message.to_string();
        // Notification::show blocks on the session bus
        tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .summary("Wind-down timer")
                .body(&message)
                .show()
            {
                warn!("Failed to show desktop notification: {}", e);
            }
        });
    }
}
