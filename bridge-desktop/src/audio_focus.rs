//! Audio policy for hosts without focus arbitration.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    audio_focus::{AudioPolicyService, FocusChange, FocusChangeListener, FocusRequestResult},
    error::Result,
};
use parking_lot::Mutex;
use tracing::debug;

#[derive(Default)]
struct PolicyState {
    listener: Option<Arc<dyn FocusChangeListener>>,
    requests: usize,
    abandons: usize,
}

/// Audio policy that grants every request synchronously.
///
/// Desktop platforms let any number of apps play at once. [`notify`](Self::notify)
/// forwards a change to the registered listener, for hosts that detect
/// interruptions some other way (and for tests).
#[derive(Default)]
pub struct ImmediateAudioPolicy {
    state: Mutex<PolicyState>,
}

impl ImmediateAudioPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a listener is registered (focus requested and not abandoned).
    pub fn is_held(&self) -> bool {
        self.state.lock().listener.is_some()
    }

    /// Number of `request_focus` calls received.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests
    }

    /// Number of `abandon_focus` calls received.
    pub fn abandon_count(&self) -> usize {
        self.state.lock().abandons
    }

    /// Deliver a focus change to the registered listener. Returns `false`
    /// when nothing is registered.
    pub fn notify(&self, change: FocusChange) -> bool {
        let listener = self.state.lock().listener.clone();
        match listener {
            Some(listener) => {
                listener.on_focus_changed(change);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AudioPolicyService for ImmediateAudioPolicy {
    async fn request_focus(
        &self,
        listener: Arc<dyn FocusChangeListener>,
    ) -> Result<FocusRequestResult> {
        let mut state = self.state.lock();
        state.requests += 1;
        state.listener = Some(listener);
        debug!(requests = state.requests, "Granting audio focus");
        Ok(FocusRequestResult::Granted)
    }

    async fn abandon_focus(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.abandons += 1;
        state.listener = None;
        debug!("Audio focus abandoned");
        Ok(())
    }
}
