//! # Core Session
//!
//! Media session coordinator for background audio playback.
//!
//! ## Overview
//!
//! This crate turns a native playback engine's state into what the OS shows
//! and permits: audio focus, the persistent media notification with its
//! lock-screen controls, and the keep-alive lease that stops the process from
//! being reclaimed mid-track. Transport taps flow back the other way into the
//! engine.
//!
//! ## Components
//!
//! - [`SessionCoordinator`] / [`SessionHandle`]: single-worker orchestrator
//!   and its cloneable, thread-safe entry point
//! - [`FocusArbiter`]: audio-focus state machine and directive derivation
//! - [`NotificationProjector`]: snapshot to media session + notification
//! - [`ActionBridge`]: transport action to engine entry point
//! - [`KeepAliveLease`]: scoped process promotion
//!
//! ## Example
//!
//! ```ignore
//! use core_runtime::config::SessionConfig;
//! use core_session::SessionCoordinator;
//!
//! let config = SessionConfig::builder().engine(engine).build()?;
//! let coordinator = SessionCoordinator::spawn(config)?;
//! let handle = coordinator.handle();
//!
//! handle.report_state("Song", "Artist", 180_000, 0, true, None)?;
//! ```

pub mod actions;
pub mod artwork;
pub mod coordinator;
pub mod error;
pub mod focus;
pub mod lease;
pub mod projector;
pub mod snapshot;

pub use actions::ActionBridge;
pub use artwork::{scale_artwork, ArtworkScaler};
pub use coordinator::{SessionCoordinator, SessionHandle, SessionStatus};
pub use error::{Result, SessionError};
pub use focus::{FocusArbiter, FocusState};
pub use lease::KeepAliveLease;
pub use projector::{NotificationProjector, Projection, RenderReport};
pub use snapshot::{PlaybackStateSnapshot, SessionId, SessionLifecycle};
