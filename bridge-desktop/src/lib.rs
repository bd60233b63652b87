//! # Desktop Bridge Implementations
//!
//! Default implementations of the media-session bridge traits for hosts
//! without mobile media surfaces (macOS, Windows, Linux, CI).
//!
//! ## Overview
//!
//! Desktop processes are never reclaimed and have no audio-focus arbitration,
//! so these adapters are in-process:
//! - `AudioPolicyService` as [`ImmediateAudioPolicy`], which grants every request
//! - `NotificationService` as [`InMemoryNotificationService`], which keeps the
//!   last posted payloads for inspection
//! - `KeepAliveHost` as [`DesktopKeepAliveHost`], which only tracks the lease
//!
//! Each adapter records what the core asked of it, which also makes them the
//! default fakes for coordinator tests.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopKeepAliveHost, ImmediateAudioPolicy, InMemoryNotificationService};
//! use core_runtime::config::SessionConfig;
//! use std::sync::Arc;
//!
//! let config = SessionConfig::builder()
//!     .engine(engine)
//!     .audio_policy(Arc::new(ImmediateAudioPolicy::new()))
//!     .notification_service(Arc::new(InMemoryNotificationService::new()))
//!     .keep_alive_host(Arc::new(DesktopKeepAliveHost::new()))
//!     .build()?;
//! ```

mod audio_focus;
mod background;
mod notification;

pub use audio_focus::ImmediateAudioPolicy;
pub use background::DesktopKeepAliveHost;
pub use notification::InMemoryNotificationService;
