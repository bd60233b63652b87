//! Keep-alive hosting
//!
//! While media plays in the background the OS must not reclaim the process.
//! The host provides a [`KeepAliveHost`] that promotes the process to a
//! foreground-equivalent state:
//!
//! - **Android**: foreground service (`startForeground`) plus a partial wake lock
//! - **iOS**: active `AVAudioSession` with the `audio` background mode
//! - **Desktop**: nothing to do, the process is never reclaimed
//!
//! The core holds the promotion as a scoped lease: acquired when the session
//! starts, released when it stops.

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Parameters for a keep-alive acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepAliveRequest {
    /// Tag the host attaches to its wake lock / background task.
    pub tag: String,
    /// Notification id the foreground service is bound to.
    pub notification_id: i32,
    /// Also hold the CPU awake while the screen is off.
    pub hold_wake_lock: bool,
}

impl KeepAliveRequest {
    pub fn new(tag: impl Into<String>, notification_id: i32) -> Self {
        Self {
            tag: tag.into(),
            notification_id,
            hold_wake_lock: true,
        }
    }
}

/// Process keep-alive host.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait KeepAliveHost: PlatformSendSync {
    /// Promote the process so it survives in the background.
    async fn acquire(&self, request: &KeepAliveRequest) -> Result<()>;

    /// Drop the promotion. Must be safe to call when nothing is held.
    async fn release(&self) -> Result<()>;

    /// Whether the host currently holds a promotion.
    fn is_held(&self) -> bool;
}
