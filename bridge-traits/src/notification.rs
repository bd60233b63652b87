//! Media notification and lock-screen session surfaces.
//!
//! The core describes what the OS should show with two plain values:
//! [`MediaSessionState`] (the media session / lock-screen metadata) and
//! [`MediaNotification`] (the persistent transport-control notification).
//! Hosts translate them into platform objects:
//!
//! - **Android**: `MediaSession.setMetadata` / `setPlaybackState` and a
//!   `Notification.MediaStyle` notification posted on a notification channel.
//! - **iOS**: `MPNowPlayingInfoCenter` and `MPRemoteCommandCenter`.
//!
//! User taps on transport controls come back through a
//! [`TransportControlListener`] registered with the session.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Transport action invoked from an OS surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportAction {
    Play,
    Pause,
    SkipNext,
    SkipPrevious,
    /// Absolute target position, forwarded to the engine unchanged.
    SeekTo { position_ms: u64 },
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportAction::Play => f.write_str("play"),
            TransportAction::Pause => f.write_str("pause"),
            TransportAction::SkipNext => f.write_str("skip_next"),
            TransportAction::SkipPrevious => f.write_str("skip_previous"),
            TransportAction::SeekTo { position_ms } => write!(f, "seek_to({position_ms})"),
        }
    }
}

/// Set of transport actions declared to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedActions {
    pub play: bool,
    pub pause: bool,
    pub skip_next: bool,
    pub skip_previous: bool,
    pub seek_to: bool,
}

impl SupportedActions {
    /// Every action the core knows how to route.
    pub fn all() -> Self {
        Self {
            play: true,
            pause: true,
            skip_next: true,
            skip_previous: true,
            seek_to: true,
        }
    }

    pub fn without_seek(mut self) -> Self {
        self.seek_to = false;
        self
    }

    /// Whether `action` belongs to the declared set.
    pub fn allows(&self, action: &TransportAction) -> bool {
        match action {
            TransportAction::Play => self.play,
            TransportAction::Pause => self.pause,
            TransportAction::SkipNext => self.skip_next,
            TransportAction::SkipPrevious => self.skip_previous,
            TransportAction::SeekTo { .. } => self.seek_to,
        }
    }
}

impl Default for SupportedActions {
    fn default() -> Self {
        Self::all()
    }
}

/// Receiver for transport-control taps. Invoked on the OS main/UI thread.
pub trait TransportControlListener: PlatformSendSync {
    fn on_transport_action(&self, action: TransportAction);
}

/// Playback status shown on the media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Playing,
    Paused,
}

/// Square RGBA8 thumbnail ready to attach to a session or notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Bytes,
}

impl Thumbnail {
    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

/// Lock-screen / media-session metadata and playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSessionState {
    pub title: String,
    pub artist: String,
    pub duration_ms: u64,
    pub position_ms: u64,
    pub status: PlaybackStatus,
    /// Playback speed the OS uses to extrapolate the position.
    pub playback_speed: f32,
    pub actions: SupportedActions,
    pub artwork: Option<Thumbnail>,
}

/// Importance of the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelImportance {
    Low,
    Default,
    High,
}

/// Notification channel (Android O+) the media notification is posted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

/// Button rendered on the media notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationButton {
    Previous,
    Play,
    Pause,
    Next,
}

impl NotificationButton {
    /// Transport action the button triggers when tapped.
    pub fn action(&self) -> TransportAction {
        match self {
            NotificationButton::Previous => TransportAction::SkipPrevious,
            NotificationButton::Play => TransportAction::Play,
            NotificationButton::Pause => TransportAction::Pause,
            NotificationButton::Next => TransportAction::SkipNext,
        }
    }
}

/// Persistent media notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaNotification {
    pub id: i32,
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub large_icon: Option<Thumbnail>,
    pub buttons: Vec<NotificationButton>,
    /// Indices into `buttons` shown in the collapsed view.
    pub compact_buttons: Vec<usize>,
    /// Show full content on the lock screen.
    pub public_visibility: bool,
    /// Tapping the notification opens the host app.
    pub launch_app_on_tap: bool,
    /// Posted as the foreground-service notification (not swipe-dismissable).
    pub ongoing: bool,
}

/// OS notification + media session service.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NotificationService: PlatformSendSync {
    /// Create the notification channel. Creating an existing channel must be a no-op.
    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<()>;

    /// Create and activate the media session under `tag`, declaring the
    /// supported actions and the listener that receives transport taps.
    async fn register_session(
        &self,
        tag: &str,
        actions: SupportedActions,
        listener: Arc<dyn TransportControlListener>,
    ) -> Result<()>;

    /// Deactivate and release the media session.
    async fn unregister_session(&self) -> Result<()>;

    /// Replace the session metadata and playback state.
    async fn update_session(&self, state: &MediaSessionState) -> Result<()>;

    /// Post (or replace) the media notification.
    async fn post_notification(&self, notification: &MediaNotification) -> Result<()>;

    /// Remove the media notification. Must be safe when nothing is posted.
    async fn clear_notification(&self) -> Result<()>;
}
