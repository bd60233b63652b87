//! Workspace facade crate.
//!
//! Host applications depend on `media-session-workspace` to pull in the
//! session coordinator together with its bridge contracts and runtime
//! plumbing. The `desktop-shims` feature (default) also exposes the
//! in-process bridge adapters from `bridge-desktop` and lets
//! [`SessionConfig`](core_runtime::config::SessionConfig) fall back to them
//! when no platform adapter is injected.

pub use bridge_traits;
pub use core_runtime;
pub use core_session;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_runtime::config::{PlatformCapabilities, SessionConfig};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_session::{
    FocusState, PlaybackStateSnapshot, SessionCoordinator, SessionError, SessionHandle,
    SessionLifecycle, SessionStatus,
};
