//! Audio focus arbitration with the OS audio policy service.
//!
//! Mobile platforms arbitrate which app may play audio. The core asks for
//! media focus before it lets the engine play and gives it back when playback
//! stops. Grants and losses are delivered asynchronously on an OS-owned
//! thread through a [`FocusChangeListener`] registered with the request.
//!
//! # Platform Notes
//!
//! - **Android**: `AudioManager.requestAudioFocus(AudioFocusRequest)` with
//!   `USAGE_MEDIA` / `CONTENT_TYPE_MUSIC`; `AUDIOFOCUS_REQUEST_DELAYED` maps to
//!   [`FocusRequestResult::Delayed`].
//! - **iOS**: `AVAudioSession.setActive(true)` plus interruption notifications.
//! - **Desktop**: no arbitration; adapters grant immediately.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Focus change reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusChange {
    /// Focus was (re)granted.
    Gain,
    /// Focus lost for an unbounded time (another media app started).
    Loss,
    /// Focus lost for a short time (phone call, navigation prompt).
    LossTransient,
    /// Focus lost for a short time but playback may continue at lower volume.
    LossTransientCanDuck,
}

impl fmt::Display for FocusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FocusChange::Gain => "gain",
            FocusChange::Loss => "loss",
            FocusChange::LossTransient => "loss_transient",
            FocusChange::LossTransientCanDuck => "loss_transient_can_duck",
        };
        f.write_str(label)
    }
}

/// Synchronous answer to a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusRequestResult {
    /// Focus is held as of return.
    Granted,
    /// The request was accepted but the grant arrives later as [`FocusChange::Gain`].
    Delayed,
    /// The policy refused the request.
    Denied,
}

/// Receiver for focus changes, handed to the audio policy at request time.
///
/// Invoked from an arbitrary OS thread. Implementations must only enqueue
/// and return.
pub trait FocusChangeListener: PlatformSendSync {
    fn on_focus_changed(&self, change: FocusChange);
}

/// OS audio policy service.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioPolicyService: PlatformSendSync {
    /// Request exclusive media playback focus.
    ///
    /// `listener` stays registered until [`abandon_focus`](Self::abandon_focus)
    /// and receives every later grant/loss. Implementations may invoke the
    /// listener before this call returns.
    async fn request_focus(
        &self,
        listener: Arc<dyn FocusChangeListener>,
    ) -> Result<FocusRequestResult>;

    /// Give focus back and drop the registered listener. Must be safe to call
    /// when no request is outstanding.
    async fn abandon_focus(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        changes: Mutex<Vec<FocusChange>>,
    }

    impl FocusChangeListener for RecordingListener {
        fn on_focus_changed(&self, change: FocusChange) {
            self.changes.lock().unwrap().push(change);
        }
    }

    #[test]
    fn test_focus_change_display() {
        assert_eq!(FocusChange::Gain.to_string(), "gain");
        assert_eq!(
            FocusChange::LossTransientCanDuck.to_string(),
            "loss_transient_can_duck"
        );
    }

    #[test]
    fn test_listener_is_object_safe() {
        let listener = Arc::new(RecordingListener::default());
        let dyn_listener: Arc<dyn FocusChangeListener> = listener.clone();
        dyn_listener.on_focus_changed(FocusChange::LossTransient);
        dyn_listener.on_focus_changed(FocusChange::Gain);

        assert_eq!(
            *listener.changes.lock().unwrap(),
            vec![FocusChange::LossTransient, FocusChange::Gain]
        );
    }
}
