//! Keep-alive host for desktop processes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bridge_traits::{
    background::{KeepAliveHost, KeepAliveRequest},
    error::Result,
};
use parking_lot::Mutex;
use tracing::debug;

/// Desktop processes are never reclaimed, so acquiring only records the lease.
#[derive(Default)]
pub struct DesktopKeepAliveHost {
    held: AtomicBool,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    last_request: Mutex<Option<KeepAliveRequest>>,
}

impl DesktopKeepAliveHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_count(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<KeepAliveRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl KeepAliveHost for DesktopKeepAliveHost {
    async fn acquire(&self, request: &KeepAliveRequest) -> Result<()> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.held.store(true, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        debug!(tag = %request.tag, "Keep-alive lease recorded");
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.held.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}
