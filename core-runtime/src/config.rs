//! # Session Configuration Module
//!
//! Provides configuration management for the media session core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `SessionConfig`
//! instance that holds every bridge the session coordinator talks to, plus the
//! platform capability flags resolved once at startup. It enforces fail-fast
//! validation so a missing bridge is reported before the coordinator exists.
//!
//! ## Required Dependencies
//!
//! - `PlaybackEngine` - Always required; there is no default engine
//! - `AudioPolicyService` - Audio focus arbitration
//! - `NotificationService` - Media session and persistent notification
//! - `KeepAliveHost` - Foreground-equivalent process promotion
//!
//! When the `desktop-shims` feature is enabled, in-process defaults for the
//! three OS bridges are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{PlatformCapabilities, SessionConfig};
//! use std::sync::Arc;
//!
//! let config = SessionConfig::builder()
//!     .engine(Arc::new(MyEngine))
//!     .audio_policy(Arc::new(MyAudioPolicy))
//!     .notification_service(Arc::new(MyNotifications))
//!     .keep_alive_host(Arc::new(MyForegroundService))
//!     .capabilities(PlatformCapabilities::for_current_platform())
//!     .artwork_size_px(256)
//!     .build()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Missing bridges produce [`Error::CapabilityMissing`] naming the capability
//! and what each platform should inject; out-of-range values produce
//! [`Error::InvalidConfig`] naming the offending field.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    AudioPolicyService, ChannelImportance, KeepAliveHost, NotificationChannel,
    NotificationService, PlaybackEngine,
};
use std::sync::Arc;

/// Largest thumbnail edge accepted for notification artwork.
pub const MAX_ARTWORK_SIZE_PX: u32 = 2048;

/// OS feature flags, determined once when the host starts.
///
/// The coordinator reads these instead of branching on OS versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// The audio policy may ask for ducking instead of a transient pause.
    pub supports_ducking: bool,
    /// Notifications must be posted to a registered channel.
    pub requires_notification_channel: bool,
    /// Transport controls can expose a seek bar.
    pub supports_seek: bool,
}

impl PlatformCapabilities {
    /// Capability defaults for the compilation target.
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "android") {
            Self {
                supports_ducking: true,
                requires_notification_channel: true,
                supports_seek: true,
            }
        } else if cfg!(target_os = "ios") {
            Self {
                supports_ducking: true,
                requires_notification_channel: false,
                supports_seek: true,
            }
        } else {
            Self {
                supports_ducking: false,
                requires_notification_channel: false,
                supports_seek: true,
            }
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::for_current_platform()
    }
}

/// Channel the media notification is posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannelConfig {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

impl Default for NotificationChannelConfig {
    fn default() -> Self {
        Self {
            id: "media_channel".to_string(),
            name: "Media Controls".to_string(),
            importance: ChannelImportance::Low,
        }
    }
}

impl NotificationChannelConfig {
    /// Bridge payload for `NotificationService::ensure_channel`.
    pub fn to_channel(&self) -> NotificationChannel {
        NotificationChannel {
            id: self.id.clone(),
            name: self.name.clone(),
            importance: self.importance,
        }
    }
}

/// Configuration for one session coordinator.
///
/// Use [`SessionConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct SessionConfig {
    /// Native playback engine (required)
    pub engine: Arc<dyn PlaybackEngine>,

    /// OS audio policy service
    pub audio_policy: Arc<dyn AudioPolicyService>,

    /// OS media session and notification service
    pub notification_service: Arc<dyn NotificationService>,

    /// OS keep-alive host
    pub keep_alive_host: Arc<dyn KeepAliveHost>,

    pub capabilities: PlatformCapabilities,

    pub channel: NotificationChannelConfig,

    /// Id of the persistent media notification
    pub notification_id: i32,

    /// Edge length of the square artwork thumbnail
    pub artwork_size_px: u32,

    /// Tag the OS media session is registered under
    pub session_tag: String,

    /// Tag attached to the keep-alive wake lock
    pub keep_alive_tag: String,

    /// Events buffered per event-bus subscriber
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("engine", &"PlaybackEngine { ... }")
            .field("audio_policy", &"AudioPolicyService { ... }")
            .field("notification_service", &"NotificationService { ... }")
            .field("keep_alive_host", &"KeepAliveHost { ... }")
            .field("capabilities", &self.capabilities)
            .field("channel", &self.channel)
            .field("notification_id", &self.notification_id)
            .field("artwork_size_px", &self.artwork_size_px)
            .field("session_tag", &self.session_tag)
            .field("keep_alive_tag", &self.keep_alive_tag)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl SessionConfig {
    /// Creates a new builder for constructing a `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Channel id and tags are not empty
    /// - Artwork size is in `1..=2048`
    /// - Event buffer holds at least one event
    pub fn validate(&self) -> Result<()> {
        if self.channel.id.trim().is_empty() {
            return Err(Error::invalid("channel.id", "must not be empty"));
        }
        if self.session_tag.trim().is_empty() {
            return Err(Error::invalid("session_tag", "must not be empty"));
        }
        if self.keep_alive_tag.trim().is_empty() {
            return Err(Error::invalid("keep_alive_tag", "must not be empty"));
        }
        if !(1..=MAX_ARTWORK_SIZE_PX).contains(&self.artwork_size_px) {
            return Err(Error::invalid(
                "artwork_size_px",
                format!(
                    "{} px is outside 1..={} px",
                    self.artwork_size_px, MAX_ARTWORK_SIZE_PX
                ),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(Error::invalid("event_buffer_size", "must hold at least one event"));
        }

        Ok(())
    }
}

fn engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlaybackEngine".to_string(),
        message: "PlaybackEngine implementation is required to route transport controls \
                 and focus directives. Inject the native engine handle with .engine()."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn audio_policy_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioPolicyService".to_string(),
        message: "AudioPolicyService implementation is required for audio focus. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ImmediateAudioPolicy. \
                 Android: inject an AudioManager-backed policy. \
                 iOS: inject an AVAudioSession-backed policy."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn notification_service_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NotificationService".to_string(),
        message: "NotificationService implementation is required for transport controls. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default InMemoryNotificationService. \
                 Android: inject a MediaSession/NotificationManager bridge. \
                 iOS: inject an MPNowPlayingInfoCenter bridge."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn keep_alive_host_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "KeepAliveHost".to_string(),
        message: "KeepAliveHost implementation is required to keep playback alive in the background. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopKeepAliveHost. \
                 Android: inject a foreground-service host. \
                 iOS: inject an audio background-mode host."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_audio_policy() -> Result<Arc<dyn AudioPolicyService>> {
    use bridge_desktop::ImmediateAudioPolicy;

    let policy: Arc<dyn AudioPolicyService> = Arc::new(ImmediateAudioPolicy::new());
    Ok(policy)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_audio_policy() -> Result<Arc<dyn AudioPolicyService>> {
    Err(audio_policy_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_notification_service() -> Result<Arc<dyn NotificationService>> {
    use bridge_desktop::InMemoryNotificationService;

    let service: Arc<dyn NotificationService> = Arc::new(InMemoryNotificationService::new());
    Ok(service)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_notification_service() -> Result<Arc<dyn NotificationService>> {
    Err(notification_service_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_keep_alive_host() -> Result<Arc<dyn KeepAliveHost>> {
    use bridge_desktop::DesktopKeepAliveHost;

    let host: Arc<dyn KeepAliveHost> = Arc::new(DesktopKeepAliveHost::new());
    Ok(host)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_keep_alive_host() -> Result<Arc<dyn KeepAliveHost>> {
    Err(keep_alive_host_missing_error())
}

/// Builder for constructing [`SessionConfig`] instances.
///
/// Call [`build()`](SessionConfigBuilder::build) once every required bridge
/// is set.
#[derive(Default)]
pub struct SessionConfigBuilder {
    engine: Option<Arc<dyn PlaybackEngine>>,
    audio_policy: Option<Arc<dyn AudioPolicyService>>,
    notification_service: Option<Arc<dyn NotificationService>>,
    keep_alive_host: Option<Arc<dyn KeepAliveHost>>,
    capabilities: Option<PlatformCapabilities>,
    channel: Option<NotificationChannelConfig>,
    notification_id: Option<i32>,
    artwork_size_px: Option<u32>,
    session_tag: Option<String>,
    keep_alive_tag: Option<String>,
    event_buffer_size: Option<usize>,
}

impl SessionConfigBuilder {
    /// Sets the playback engine (required).
    pub fn engine(mut self, engine: Arc<dyn PlaybackEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the audio policy service.
    ///
    /// If not provided, the desktop default (grant immediately) will be used
    /// when the `desktop-shims` feature is enabled.
    pub fn audio_policy(mut self, policy: Arc<dyn AudioPolicyService>) -> Self {
        self.audio_policy = Some(policy);
        self
    }

    /// Sets the notification service.
    pub fn notification_service(mut self, service: Arc<dyn NotificationService>) -> Self {
        self.notification_service = Some(service);
        self
    }

    /// Sets the keep-alive host.
    pub fn keep_alive_host(mut self, host: Arc<dyn KeepAliveHost>) -> Self {
        self.keep_alive_host = Some(host);
        self
    }

    /// Overrides the capability flags detected for the current platform.
    pub fn capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn channel(mut self, channel: NotificationChannelConfig) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Default: 1
    pub fn notification_id(mut self, id: i32) -> Self {
        self.notification_id = Some(id);
        self
    }

    /// Default: 512
    pub fn artwork_size_px(mut self, size: u32) -> Self {
        self.artwork_size_px = Some(size);
        self
    }

    /// Default: `"RustMediaSession"`
    pub fn session_tag(mut self, tag: impl Into<String>) -> Self {
        self.session_tag = Some(tag.into());
        self
    }

    /// Default: `"MediaWakeLock"`
    pub fn keep_alive_tag(mut self, tag: impl Into<String>) -> Self {
        self.keep_alive_tag = Some(tag.into());
        self
    }

    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `SessionConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(SessionConfig)` on success, or an error if:
    /// - The engine is missing
    /// - An OS bridge is missing and no desktop default is compiled in
    /// - Configuration values are invalid
    pub fn build(self) -> Result<SessionConfig> {
        let engine = self.engine.ok_or_else(engine_missing_error)?;

        let audio_policy = match self.audio_policy {
            Some(policy) => policy,
            None => provide_default_audio_policy()?,
        };

        let notification_service = match self.notification_service {
            Some(service) => service,
            None => provide_default_notification_service()?,
        };

        let keep_alive_host = match self.keep_alive_host {
            Some(host) => host,
            None => provide_default_keep_alive_host()?,
        };

        let config = SessionConfig {
            engine,
            audio_policy,
            notification_service,
            keep_alive_host,
            capabilities: self
                .capabilities
                .unwrap_or_else(PlatformCapabilities::for_current_platform),
            channel: self.channel.unwrap_or_default(),
            notification_id: self.notification_id.unwrap_or(1),
            artwork_size_px: self.artwork_size_px.unwrap_or(512),
            session_tag: self
                .session_tag
                .unwrap_or_else(|| "RustMediaSession".to_string()),
            keep_alive_tag: self
                .keep_alive_tag
                .unwrap_or_else(|| "MediaWakeLock".to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
