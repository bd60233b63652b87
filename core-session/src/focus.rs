//! # Audio Focus Arbitration
//!
//! Owns the negotiation with the OS audio policy and turns its grant/loss
//! callbacks into [`FocusDirective`]s for the engine.
//!
//! ## State machine
//!
//! ```text
//!            request()            grant
//!   None ───────────────> Requested ─────> Granted
//!    ^                        │               │
//!    │ abandon()              │ denied        │ loss / transient loss / duck
//!    └────────────────────────┘               v
//!                                   LostPermanent | LostTransient | LostTransientCanDuck
//!                                              gain ──> Granted
//! ```
//!
//! `Granted` is only ever entered on a confirmed grant, either the
//! synchronous result of a request or a `Gain` callback. Resume after a
//! transient loss is decided by a latch recording whether the engine was
//! playing right before the loss.

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    AudioPolicyService, FocusChange, FocusChangeListener, FocusDirective, FocusRequestResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Audio focus as last confirmed by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusState {
    #[default]
    None,
    Requested,
    Granted,
    LostTransient,
    LostTransientCanDuck,
    LostPermanent,
}

impl FocusState {
    /// Whether the engine may produce audio in this state.
    pub fn permits_playback(&self) -> bool {
        matches!(self, FocusState::Granted | FocusState::LostTransientCanDuck)
    }

    /// Whether a request is outstanding or focus is (or was) held.
    pub fn is_engaged(&self) -> bool {
        !matches!(self, FocusState::None)
    }
}

impl fmt::Display for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FocusState::None => "none",
            FocusState::Requested => "requested",
            FocusState::Granted => "granted",
            FocusState::LostTransient => "lost_transient",
            FocusState::LostTransientCanDuck => "lost_transient_can_duck",
            FocusState::LostPermanent => "lost_permanent",
        };
        f.write_str(label)
    }
}

/// Focus negotiation with the OS audio policy.
///
/// Owned by the coordinator worker; every method takes `&mut self`, so
/// callbacks must be funnelled through the worker's queue first.
pub struct FocusArbiter {
    policy: Arc<dyn AudioPolicyService>,
    can_duck: bool,
    state: FocusState,
    resume_on_gain: bool,
}

impl FocusArbiter {
    /// `can_duck` is the platform capability combined with engine support.
    pub fn new(policy: Arc<dyn AudioPolicyService>, can_duck: bool) -> Self {
        Self {
            policy,
            can_duck,
            state: FocusState::None,
            resume_on_gain: false,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn permits_playback(&self) -> bool {
        self.state.permits_playback()
    }

    /// A later `Gain` will issue `Resume`.
    pub fn resume_pending(&self) -> bool {
        self.resume_on_gain
    }

    /// Focus is parked waiting for a grant that should restart playback.
    /// Abandoning now would lose that grant.
    ///
    /// A ducked engine keeps playing, so it never waits here: a pause
    /// reported while ducked came from the user.
    pub fn awaiting_gain(&self) -> bool {
        self.resume_on_gain
            && matches!(self.state, FocusState::Requested | FocusState::LostTransient)
    }

    /// Resume once a delayed grant arrives.
    pub fn arm_resume(&mut self) {
        self.resume_on_gain = true;
    }

    /// The user paused; never auto-resume the current interruption.
    pub fn cancel_resume(&mut self) {
        self.resume_on_gain = false;
    }

    /// Ask the OS for media focus.
    ///
    /// Returns `Ok(true)` when granted synchronously and `Ok(false)` when the
    /// grant is delayed (state stays `Requested`). A refusal or a bridge
    /// failure leaves the state at `None` and returns
    /// [`SessionError::FocusDenied`].
    pub async fn request_focus(&mut self, listener: Arc<dyn FocusChangeListener>) -> Result<bool> {
        self.state = FocusState::Requested;

        match self.policy.request_focus(listener).await {
            Ok(FocusRequestResult::Granted) => {
                self.state = FocusState::Granted;
                debug!("Audio focus granted");
                Ok(true)
            }
            Ok(FocusRequestResult::Delayed) => {
                debug!("Audio focus grant delayed");
                Ok(false)
            }
            Ok(FocusRequestResult::Denied) => {
                self.state = FocusState::None;
                Err(SessionError::FocusDenied(
                    "audio policy refused the request".to_string(),
                ))
            }
            Err(err) => {
                self.state = FocusState::None;
                Err(SessionError::FocusDenied(err.to_string()))
            }
        }
    }

    /// Give focus back. No-op when nothing is held or requested.
    pub async fn abandon_focus(&mut self) {
        if !self.state.is_engaged() {
            return;
        }
        self.release().await;
    }

    /// Give focus back regardless of the tracked state.
    ///
    /// Used on teardown, where an outstanding request the policy has not
    /// answered yet must be cancelled too.
    pub async fn release(&mut self) {
        if let Err(err) = self.policy.abandon_focus().await {
            warn!(error = %err, "Failed to abandon audio focus");
        }
        self.state = FocusState::None;
        self.resume_on_gain = false;
    }

    /// Apply an OS focus change.
    ///
    /// `was_playing` is the engine's last reported playing flag; it decides
    /// whether a transient loss may later resume playback.
    pub fn on_focus_changed(
        &mut self,
        change: FocusChange,
        was_playing: bool,
    ) -> Option<FocusDirective> {
        if self.state == FocusState::None {
            debug!(%change, "Ignoring focus change while no focus is held");
            return None;
        }

        match change {
            FocusChange::Loss => {
                self.state = FocusState::LostPermanent;
                self.resume_on_gain = false;
                Some(FocusDirective::Pause)
            }
            FocusChange::LossTransient => {
                self.latch_transient_loss(was_playing);
                self.state = FocusState::LostTransient;
                Some(FocusDirective::Pause)
            }
            FocusChange::LossTransientCanDuck if self.state == FocusState::LostTransient => {
                // Already paused for an interruption; ducking would not restart it.
                self.latch_transient_loss(was_playing);
                None
            }
            FocusChange::LossTransientCanDuck if self.can_duck => {
                self.latch_transient_loss(was_playing);
                self.state = FocusState::LostTransientCanDuck;
                Some(FocusDirective::Duck)
            }
            FocusChange::LossTransientCanDuck => {
                self.latch_transient_loss(was_playing);
                self.state = FocusState::LostTransient;
                Some(FocusDirective::Pause)
            }
            FocusChange::Gain => {
                let previous = self.state;
                self.state = FocusState::Granted;
                if previous == FocusState::Granted {
                    return None;
                }
                if std::mem::take(&mut self.resume_on_gain) {
                    Some(FocusDirective::Resume)
                } else {
                    None
                }
            }
        }
    }

    fn latch_transient_loss(&mut self, was_playing: bool) {
        // The loss that first stopped the engine owns the latch; follow-up
        // losses and pending grants only ever arm it.
        let carried = self.resume_on_gain
            && matches!(
                self.state,
                FocusState::Requested
                    | FocusState::LostTransient
                    | FocusState::LostTransientCanDuck
            );
        self.resume_on_gain = was_playing || carried;
    }
}

impl fmt::Debug for FocusArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusArbiter")
            .field("state", &self.state)
            .field("can_duck", &self.can_duck)
            .field("resume_on_gain", &self.resume_on_gain)
            .finish()
    }
}
