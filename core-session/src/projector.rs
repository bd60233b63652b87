//! # Notification Projection
//!
//! Renders `(snapshot, focus)` into the OS media session object and the
//! persistent media notification.
//!
//! Every render rebuilds both payloads from scratch; nothing about the
//! visible notification is retained between renders, so it can never drift
//! from the snapshot it was built from.
//!
//! ## Failure handling
//!
//! A rejected payload is retried once without artwork (oversized or
//! malformed bitmaps are the usual cause). If the retry also fails the
//! render reports [`SessionError::RenderFailure`] and the session carries on
//! without a visible notification.

use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult, MediaNotification, MediaSessionState, NotificationButton,
    NotificationService, PlaybackStatus, SupportedActions, Thumbnail, TransportControlListener,
};
use core_runtime::config::{NotificationChannelConfig, PlatformCapabilities};
use tracing::{debug, warn};

use crate::artwork::ArtworkScaler;
use crate::error::{Result, SessionError};
use crate::focus::FocusState;
use crate::snapshot::PlaybackStateSnapshot;

/// Indices into `[Previous, Play/Pause, Next]` shown in the compact view.
const COMPACT_BUTTONS: [usize; 3] = [0, 1, 2];

const PLAYBACK_SPEED: f32 = 1.0;

/// Payloads for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub session: MediaSessionState,
    pub notification: MediaNotification,
}

impl Projection {
    pub fn has_artwork(&self) -> bool {
        self.session.artwork.is_some() || self.notification.large_icon.is_some()
    }

    pub fn without_artwork(mut self) -> Self {
        self.session.artwork = None;
        self.notification.large_icon = None;
        self
    }
}

/// Result of a successful render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    /// Playing flag actually shown (snapshot gated by focus).
    pub is_playing: bool,
    pub artwork_attached: bool,
    /// The first attempt failed and the artwork-free retry succeeded.
    pub retried: bool,
}

/// Builds and posts the OS-visible media session state.
pub struct NotificationProjector {
    service: Arc<dyn NotificationService>,
    channel: NotificationChannelConfig,
    requires_channel: bool,
    channel_ready: bool,
    notification_id: i32,
    session_tag: String,
    actions: SupportedActions,
    artwork: ArtworkScaler,
}

impl NotificationProjector {
    pub fn new(
        service: Arc<dyn NotificationService>,
        channel: NotificationChannelConfig,
        capabilities: PlatformCapabilities,
        notification_id: i32,
        session_tag: impl Into<String>,
        artwork_size_px: u32,
    ) -> Self {
        let actions = if capabilities.supports_seek {
            SupportedActions::all()
        } else {
            SupportedActions::all().without_seek()
        };

        Self {
            service,
            channel,
            requires_channel: capabilities.requires_notification_channel,
            channel_ready: false,
            notification_id,
            session_tag: session_tag.into(),
            actions,
            artwork: ArtworkScaler::new(artwork_size_px),
        }
    }

    /// Transport actions declared to the OS.
    pub fn supported_actions(&self) -> SupportedActions {
        self.actions
    }

    async fn ensure_channel(&mut self) -> BridgeResult<()> {
        if !self.requires_channel || self.channel_ready {
            return Ok(());
        }
        self.service.ensure_channel(&self.channel.to_channel()).await?;
        self.channel_ready = true;
        debug!(channel = %self.channel.id, "Notification channel registered");
        Ok(())
    }

    /// Activate the OS media session and declare the supported actions.
    pub async fn register(&mut self, listener: Arc<dyn TransportControlListener>) -> Result<()> {
        self.ensure_channel()
            .await
            .map_err(|e| SessionError::RenderFailure(e.to_string()))?;
        self.service
            .register_session(&self.session_tag, self.actions, listener)
            .await
            .map_err(|e| SessionError::RenderFailure(e.to_string()))
    }

    /// Build the payloads for `snapshot` as seen under `focus`. Pure.
    pub fn project(
        &self,
        snapshot: &PlaybackStateSnapshot,
        focus: FocusState,
        thumbnail: Option<Thumbnail>,
    ) -> Projection {
        let is_playing = snapshot.is_playing && focus.permits_playback();
        let status = if is_playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        };
        let toggle = if is_playing {
            NotificationButton::Pause
        } else {
            NotificationButton::Play
        };

        let session = MediaSessionState {
            title: snapshot.display_title().to_string(),
            artist: snapshot.display_artist().to_string(),
            duration_ms: snapshot.duration_ms,
            position_ms: snapshot.position_ms,
            status,
            playback_speed: PLAYBACK_SPEED,
            actions: self.actions,
            artwork: thumbnail.clone(),
        };

        let notification = MediaNotification {
            id: self.notification_id,
            channel_id: self.channel.id.clone(),
            title: snapshot.display_title().to_string(),
            text: snapshot.display_artist().to_string(),
            large_icon: thumbnail,
            buttons: vec![
                NotificationButton::Previous,
                toggle,
                NotificationButton::Next,
            ],
            compact_buttons: COMPACT_BUTTONS.to_vec(),
            public_visibility: true,
            launch_app_on_tap: true,
            ongoing: is_playing,
        };

        Projection {
            session,
            notification,
        }
    }

    /// Rebuild and post the session state and notification.
    pub async fn render(
        &mut self,
        snapshot: &PlaybackStateSnapshot,
        focus: FocusState,
    ) -> Result<RenderReport> {
        self.ensure_channel()
            .await
            .map_err(|e| SessionError::RenderFailure(format!("channel registration: {}", e)))?;

        let thumbnail = match &snapshot.artwork {
            Some(artwork) => match self.artwork.thumbnail(artwork).await {
                Ok(thumbnail) => Some(thumbnail),
                Err(err) => {
                    warn!(error = %err, "Rendering without artwork");
                    None
                }
            },
            None => None,
        };

        let projection = self.project(snapshot, focus, thumbnail);
        let is_playing = projection.notification.ongoing;

        match self.post(&projection).await {
            Ok(()) => Ok(RenderReport {
                is_playing,
                artwork_attached: projection.has_artwork(),
                retried: false,
            }),
            Err(first) => {
                warn!(error = %first, "Notification rejected, retrying without artwork");
                let stripped = projection.without_artwork();
                self.post(&stripped).await.map_err(|second| {
                    SessionError::RenderFailure(format!(
                        "{} (retry without artwork: {})",
                        first, second
                    ))
                })?;
                Ok(RenderReport {
                    is_playing,
                    artwork_attached: false,
                    retried: true,
                })
            }
        }
    }

    async fn post(&self, projection: &Projection) -> BridgeResult<()> {
        self.service.update_session(&projection.session).await?;
        self.service
            .post_notification(&projection.notification)
            .await
    }

    /// Remove the notification and deactivate the session.
    pub async fn clear(&mut self) -> Result<()> {
        let cleared = self.service.clear_notification().await;
        let unregistered = self.service.unregister_session().await;
        cleared
            .and(unregistered)
            .map_err(|e| SessionError::RenderFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::tests::encoded_png;
    use async_trait::async_trait;
    use bridge_desktop::InMemoryNotificationService;
    use bridge_traits::{BridgeError, NotificationChannel};
    use mockall::mock;

    mock! {
        Notifications {}

        #[async_trait]
        impl NotificationService for Notifications {
            async fn ensure_channel(&self, channel: &NotificationChannel) -> BridgeResult<()>;
            async fn register_session(
                &self,
                tag: &str,
                actions: SupportedActions,
                listener: Arc<dyn TransportControlListener>,
            ) -> BridgeResult<()>;
            async fn unregister_session(&self) -> BridgeResult<()>;
            async fn update_session(&self, state: &MediaSessionState) -> BridgeResult<()>;
            async fn post_notification(&self, notification: &MediaNotification) -> BridgeResult<()>;
            async fn clear_notification(&self) -> BridgeResult<()>;
        }
    }

    fn capabilities(requires_channel: bool, supports_seek: bool) -> PlatformCapabilities {
        PlatformCapabilities {
            supports_ducking: true,
            requires_notification_channel: requires_channel,
            supports_seek,
        }
    }

    fn projector(service: Arc<dyn NotificationService>) -> NotificationProjector {
        NotificationProjector::new(
            service,
            NotificationChannelConfig::default(),
            capabilities(true, true),
            1,
            "RustMediaSession",
            32,
        )
    }

    fn song(is_playing: bool) -> PlaybackStateSnapshot {
        PlaybackStateSnapshot::new("Song", "Artist", 180_000, 42_000, is_playing)
    }

    #[test]
    fn test_project_playing() {
        let projector = projector(Arc::new(InMemoryNotificationService::new()));
        let projection = projector.project(&song(true), FocusState::Granted, None);

        assert_eq!(projection.session.status, PlaybackStatus::Playing);
        assert_eq!(projection.session.playback_speed, 1.0);
        assert_eq!(projection.session.position_ms, 42_000);
        assert_eq!(
            projection.notification.buttons,
            vec![
                NotificationButton::Previous,
                NotificationButton::Pause,
                NotificationButton::Next
            ]
        );
        assert_eq!(projection.notification.compact_buttons, vec![0, 1, 2]);
        assert!(projection.notification.ongoing);
        assert!(projection.notification.public_visibility);
        assert_eq!(projection.notification.channel_id, "media_channel");
    }

    #[test]
    fn test_project_gated_by_focus() {
        let projector = projector(Arc::new(InMemoryNotificationService::new()));
        for focus in [FocusState::None, FocusState::Requested, FocusState::LostTransient] {
            let projection = projector.project(&song(true), focus, None);
            assert_eq!(projection.session.status, PlaybackStatus::Paused);
            assert_eq!(projection.notification.buttons[1], NotificationButton::Play);
            assert!(!projection.notification.ongoing);
        }

        let ducked = projector.project(&song(true), FocusState::LostTransientCanDuck, None);
        assert_eq!(ducked.session.status, PlaybackStatus::Playing);
    }

    #[test]
    fn test_seek_omitted_when_unsupported() {
        let projector = NotificationProjector::new(
            Arc::new(InMemoryNotificationService::new()),
            NotificationChannelConfig::default(),
            capabilities(false, false),
            1,
            "RustMediaSession",
            32,
        );
        assert!(!projector.supported_actions().seek_to);
        assert!(projector.supported_actions().play);
    }

    #[tokio::test]
    async fn test_render_registers_channel_once() {
        let service = Arc::new(InMemoryNotificationService::new());
        let mut projector = projector(service.clone());

        projector.render(&song(true), FocusState::Granted).await.unwrap();
        projector.render(&song(false), FocusState::Granted).await.unwrap();

        assert_eq!(service.channels().len(), 1);
        assert_eq!(service.post_count(), 2);
        let session = service.session_state().unwrap();
        assert_eq!(session.status, PlaybackStatus::Paused);
    }

    #[tokio::test]
    async fn test_render_without_artwork() {
        let service = Arc::new(InMemoryNotificationService::new());
        let mut projector = projector(service.clone());

        let report = projector.render(&song(true), FocusState::Granted).await.unwrap();
        assert!(!report.artwork_attached);
        assert!(service.notification().unwrap().large_icon.is_none());
    }

    #[tokio::test]
    async fn test_render_attaches_scaled_artwork() {
        let service = Arc::new(InMemoryNotificationService::new());
        let mut projector = projector(service.clone());
        let snapshot = song(true).with_artwork(encoded_png(120, 80));

        let report = projector.render(&snapshot, FocusState::Granted).await.unwrap();
        assert!(report.artwork_attached);
        let icon = service.notification().unwrap().large_icon.unwrap();
        assert_eq!((icon.width, icon.height), (32, 32));
    }

    #[tokio::test]
    async fn test_render_with_undecodable_artwork() {
        let service = Arc::new(InMemoryNotificationService::new());
        let mut projector = projector(service.clone());
        let snapshot = song(true).with_artwork(&b"garbage"[..]);

        let report = projector.render(&snapshot, FocusState::Granted).await.unwrap();
        assert!(!report.artwork_attached);
        assert_eq!(service.post_count(), 1);
    }

    #[tokio::test]
    async fn test_render_retries_without_artwork() {
        let mut service = MockNotifications::new();
        service.expect_ensure_channel().returning(|_| Ok(()));
        service.expect_update_session().returning(|_| Ok(()));
        service
            .expect_post_notification()
            .withf(|notification| notification.large_icon.is_some())
            .times(1)
            .returning(|_| Err(BridgeError::PayloadRejected("bitmap too large".to_string())));
        service
            .expect_post_notification()
            .withf(|notification| notification.large_icon.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let mut projector = projector(Arc::new(service));
        let snapshot = song(true).with_artwork(encoded_png(64, 64));

        let report = projector.render(&snapshot, FocusState::Granted).await.unwrap();
        assert!(report.retried);
        assert!(!report.artwork_attached);
    }

    #[tokio::test]
    async fn test_render_failure_after_retry() {
        let mut service = MockNotifications::new();
        service.expect_ensure_channel().returning(|_| Ok(()));
        service
            .expect_update_session()
            .times(2)
            .returning(|_| Err(BridgeError::Platform("session released".to_string())));

        let mut projector = projector(Arc::new(service));
        let err = projector
            .render(&song(true), FocusState::Granted)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::RenderFailure(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_clear_unregisters_session() {
        let service = Arc::new(InMemoryNotificationService::new());
        let mut projector = projector(service.clone());

        projector.render(&song(true), FocusState::Granted).await.unwrap();
        projector.clear().await.unwrap();

        assert!(service.notification().is_none());
        assert!(service.session_state().is_none());
        assert_eq!(service.clear_count(), 1);
    }
}
