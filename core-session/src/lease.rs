//! Keep-alive lease held while the session is active.

use std::sync::Arc;

use bridge_traits::{KeepAliveHost, KeepAliveRequest};
use tracing::{debug, warn};

use crate::error::Result;

/// Scoped foreground-equivalent promotion of the host process.
///
/// Release explicitly with [`release`](Self::release). A lease dropped
/// without that is released in the background when a tokio runtime is
/// available.
pub struct KeepAliveLease {
    host: Arc<dyn KeepAliveHost>,
    tag: String,
    released: bool,
}

impl KeepAliveLease {
    pub async fn acquire(host: Arc<dyn KeepAliveHost>, request: KeepAliveRequest) -> Result<Self> {
        host.acquire(&request).await?;
        debug!(tag = %request.tag, "Keep-alive lease acquired");
        Ok(Self {
            host,
            tag: request.tag,
            released: false,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_held(&self) -> bool {
        !self.released && self.host.is_held()
    }

    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        self.host.release().await?;
        debug!(tag = %self.tag, "Keep-alive lease released");
        Ok(())
    }
}

impl Drop for KeepAliveLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let host = Arc::clone(&self.host);
        let tag = std::mem::take(&mut self.tag);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = host.release().await {
                        warn!(tag = %tag, error = %err, "Failed to release leaked keep-alive lease");
                    }
                });
            }
            Err(_) => {
                warn!(tag = %tag, "Keep-alive lease dropped outside a runtime; host keeps it");
            }
        }
    }
}
