//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements for the
//! media session core.
//!
//! ## Overview
//!
//! The session core never talks to an OS API directly. Every capability it
//! needs is a trait defined here, implemented once per platform and injected
//! at startup. Callbacks flowing the other way (focus changes, transport
//! taps) go through listener traits whose implementation is a handle onto the
//! coordinator, passed at registration time.
//!
//! ## Traits
//!
//! ### OS media surfaces
//! - [`AudioPolicyService`](audio_focus::AudioPolicyService) - Audio focus request/abandon
//! - [`NotificationService`](notification::NotificationService) - Media session + persistent notification
//! - [`KeepAliveHost`](background::KeepAliveHost) - Foreground-equivalent process promotion
//!
//! ### Callbacks into the core
//! - [`FocusChangeListener`](audio_focus::FocusChangeListener) - Focus grant/loss delivery
//! - [`TransportControlListener`](notification::TransportControlListener) - Transport taps
//!
//! ### Engine
//! - [`PlaybackEngine`](playback::PlaybackEngine) - Commands into the native playback engine
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In-process adapters |
//! | Android  | host app (JNI)      | 📋 Planned |
//! | iOS      | host app            | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations catch their own exceptions and convert them before
//! returning, so no raw platform failure reaches the core.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` on native targets; listener
//! implementations are invoked from OS-owned threads.

pub mod audio_focus;
pub mod background;
pub mod error;
pub mod logging;
pub mod notification;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio_focus::{AudioPolicyService, FocusChange, FocusChangeListener, FocusRequestResult};
pub use background::{KeepAliveHost, KeepAliveRequest};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use notification::{
    ChannelImportance, MediaNotification, MediaSessionState, NotificationButton,
    NotificationChannel, NotificationService, PlaybackStatus, SupportedActions, Thumbnail,
    TransportAction, TransportControlListener,
};
pub use playback::{FocusDirective, PlaybackEngine, PlaybackGate};
