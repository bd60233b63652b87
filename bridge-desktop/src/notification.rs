//! In-memory notification and media session service.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    notification::{
        MediaNotification, MediaSessionState, NotificationChannel, NotificationService,
        SupportedActions, TransportAction, TransportControlListener,
    },
};
use parking_lot::Mutex;
use tracing::{debug, trace};

#[derive(Default)]
struct ServiceState {
    channels: Vec<NotificationChannel>,
    tag: Option<String>,
    actions: Option<SupportedActions>,
    listener: Option<Arc<dyn TransportControlListener>>,
    session: Option<MediaSessionState>,
    notification: Option<MediaNotification>,
    session_updates: usize,
    posts: usize,
    clears: usize,
}

/// Keeps the most recent session state and notification in memory.
///
/// Desktop shells can poll it to mirror transport controls in their own UI,
/// and [`press`](Self::press) routes a tap back into the registered listener.
#[derive(Default)]
pub struct InMemoryNotificationService {
    state: Mutex<ServiceState>,
}

impl InMemoryNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.state.lock().channels.clone()
    }

    pub fn is_session_registered(&self) -> bool {
        self.state.lock().listener.is_some()
    }

    /// Tag of the registered session.
    pub fn session_tag(&self) -> Option<String> {
        self.state.lock().tag.clone()
    }

    pub fn declared_actions(&self) -> Option<SupportedActions> {
        self.state.lock().actions
    }

    pub fn session_state(&self) -> Option<MediaSessionState> {
        self.state.lock().session.clone()
    }

    /// Notification currently visible, `None` once cleared.
    pub fn notification(&self) -> Option<MediaNotification> {
        self.state.lock().notification.clone()
    }

    pub fn session_update_count(&self) -> usize {
        self.state.lock().session_updates
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().posts
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }

    /// Simulate a tap on a transport control. Returns `false` when no session
    /// is registered or the action was not declared.
    pub fn press(&self, action: TransportAction) -> bool {
        let (listener, actions) = {
            let state = self.state.lock();
            (state.listener.clone(), state.actions)
        };
        match (listener, actions) {
            (Some(listener), Some(actions)) if actions.allows(&action) => {
                listener.on_transport_action(action);
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<()> {
        let mut state = self.state.lock();
        if !state.channels.iter().any(|existing| existing.id == channel.id) {
            debug!(channel = %channel.id, "Registering notification channel");
            state.channels.push(channel.clone());
        }
        Ok(())
    }

    async fn register_session(
        &self,
        tag: &str,
        actions: SupportedActions,
        listener: Arc<dyn TransportControlListener>,
    ) -> Result<()> {
        debug!(tag, "Registering media session");
        let mut state = self.state.lock();
        state.tag = Some(tag.to_string());
        state.actions = Some(actions);
        state.listener = Some(listener);
        Ok(())
    }

    async fn unregister_session(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.tag = None;
        state.actions = None;
        state.listener = None;
        state.session = None;
        Ok(())
    }

    async fn update_session(&self, session: &MediaSessionState) -> Result<()> {
        let mut state = self.state.lock();
        state.session_updates += 1;
        state.session = Some(session.clone());
        trace!(title = %session.title, status = ?session.status, "Session updated");
        Ok(())
    }

    async fn post_notification(&self, notification: &MediaNotification) -> Result<()> {
        let mut state = self.state.lock();
        state.posts += 1;
        state.notification = Some(notification.clone());
        Ok(())
    }

    async fn clear_notification(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.clears += 1;
        state.notification = None;
        Ok(())
    }
}
