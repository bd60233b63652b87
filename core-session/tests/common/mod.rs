//! Shared fixtures for core-session integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_desktop::{DesktopKeepAliveHost, InMemoryNotificationService};
use bridge_traits::{
    error::Result as BridgeResult, AudioPolicyService, BridgeError, FocusChange,
    FocusChangeListener, FocusDirective, FocusRequestResult, MediaNotification,
    MediaSessionState, NotificationChannel, NotificationService, PlaybackEngine, PlaybackGate,
    SupportedActions, TransportControlListener,
};
use bytes::Bytes;
use core_runtime::config::{PlatformCapabilities, SessionConfig};
use core_session::SessionCoordinator;
use image::{DynamicImage, ImageFormat, RgbImage};
use parking_lot::Mutex;

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Play,
    Pause,
    SkipNext,
    SkipPrevious,
    SeekTo(u64),
    Directive(FocusDirective),
    Gated(PlaybackGate),
}

/// Engine that records every call it receives.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn directives(&self) -> Vec<FocusDirective> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Directive(directive) => Some(*directive),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) -> BridgeResult<()> {
        self.calls.lock().push(call);
        Ok(())
    }
}

impl PlaybackEngine for RecordingEngine {
    fn play(&self) -> BridgeResult<()> {
        self.record(EngineCall::Play)
    }

    fn pause(&self) -> BridgeResult<()> {
        self.record(EngineCall::Pause)
    }

    fn skip_next(&self) -> BridgeResult<()> {
        self.record(EngineCall::SkipNext)
    }

    fn skip_previous(&self) -> BridgeResult<()> {
        self.record(EngineCall::SkipPrevious)
    }

    fn seek_to(&self, position_ms: u64) -> BridgeResult<()> {
        self.record(EngineCall::SeekTo(position_ms))
    }

    fn on_focus_directive(&self, directive: FocusDirective) -> BridgeResult<()> {
        self.record(EngineCall::Directive(directive))
    }

    fn on_playback_gated(&self, gate: PlaybackGate) -> BridgeResult<()> {
        self.record(EngineCall::Gated(gate))
    }
}

// ============================================================================
// Audio policy
// ============================================================================

/// Audio policy with a scripted answer that, like some real platforms, keeps
/// its listener after `abandon_focus`.
pub struct ScriptedPolicy {
    answer: Mutex<FocusRequestResult>,
    listener: Mutex<Option<Arc<dyn FocusChangeListener>>>,
    requests: Mutex<usize>,
    abandons: Mutex<usize>,
}

impl ScriptedPolicy {
    pub fn new(answer: FocusRequestResult) -> Self {
        Self {
            answer: Mutex::new(answer),
            listener: Mutex::new(None),
            requests: Mutex::new(0),
            abandons: Mutex::new(0),
        }
    }

    pub fn answer_with(&self, answer: FocusRequestResult) {
        *self.answer.lock() = answer;
    }

    /// Deliver a focus change to whatever listener the policy last saw.
    pub fn fire(&self, change: FocusChange) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_focus_changed(change);
        }
    }

    pub fn request_count(&self) -> usize {
        *self.requests.lock()
    }

    pub fn abandon_count(&self) -> usize {
        *self.abandons.lock()
    }
}

#[async_trait]
impl AudioPolicyService for ScriptedPolicy {
    async fn request_focus(
        &self,
        listener: Arc<dyn FocusChangeListener>,
    ) -> BridgeResult<FocusRequestResult> {
        *self.requests.lock() += 1;
        *self.listener.lock() = Some(listener);
        Ok(*self.answer.lock())
    }

    async fn abandon_focus(&self) -> BridgeResult<()> {
        *self.abandons.lock() += 1;
        Ok(())
    }
}

// ============================================================================
// Notification service
// ============================================================================

/// Notification service that rejects any payload carrying artwork, the way
/// some platforms reject oversized bitmaps.
pub struct ArtworkRejectingService {
    inner: InMemoryNotificationService,
}

impl ArtworkRejectingService {
    pub fn new() -> Self {
        Self {
            inner: InMemoryNotificationService::new(),
        }
    }

    pub fn inner(&self) -> &InMemoryNotificationService {
        &self.inner
    }
}

#[async_trait]
impl NotificationService for ArtworkRejectingService {
    async fn ensure_channel(&self, channel: &NotificationChannel) -> BridgeResult<()> {
        self.inner.ensure_channel(channel).await
    }

    async fn register_session(
        &self,
        tag: &str,
        actions: SupportedActions,
        listener: Arc<dyn TransportControlListener>,
    ) -> BridgeResult<()> {
        self.inner.register_session(tag, actions, listener).await
    }

    async fn unregister_session(&self) -> BridgeResult<()> {
        self.inner.unregister_session().await
    }

    async fn update_session(&self, state: &MediaSessionState) -> BridgeResult<()> {
        if state.artwork.is_some() {
            return Err(BridgeError::OperationFailed("bitmap too large".to_string()));
        }
        self.inner.update_session(state).await
    }

    async fn post_notification(&self, notification: &MediaNotification) -> BridgeResult<()> {
        if notification.large_icon.is_some() {
            return Err(BridgeError::OperationFailed("bitmap too large".to_string()));
        }
        self.inner.post_notification(notification).await
    }

    async fn clear_notification(&self) -> BridgeResult<()> {
        self.inner.clear_notification().await
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub const ARTWORK_SIZE: u32 = 64;

pub fn capabilities() -> PlatformCapabilities {
    PlatformCapabilities {
        supports_ducking: true,
        requires_notification_channel: true,
        supports_seek: true,
    }
}

pub struct Fixture {
    pub coordinator: SessionCoordinator,
    pub engine: Arc<RecordingEngine>,
    pub host: Arc<DesktopKeepAliveHost>,
}

pub fn spawn_with(
    engine: Arc<dyn PlaybackEngine>,
    policy: Arc<dyn AudioPolicyService>,
    notifications: Arc<dyn NotificationService>,
    host: Arc<DesktopKeepAliveHost>,
) -> anyhow::Result<SessionCoordinator> {
    let config = SessionConfig::builder()
        .engine(engine)
        .audio_policy(policy)
        .notification_service(notifications)
        .keep_alive_host(host)
        .capabilities(capabilities())
        .artwork_size_px(ARTWORK_SIZE)
        .build()?;
    Ok(SessionCoordinator::spawn(config)?)
}

pub fn fixture(
    policy: Arc<dyn AudioPolicyService>,
    notifications: Arc<dyn NotificationService>,
) -> anyhow::Result<Fixture> {
    let engine = Arc::new(RecordingEngine::default());
    let host = Arc::new(DesktopKeepAliveHost::new());
    let coordinator = spawn_with(engine.clone(), policy, notifications, host.clone())?;
    Ok(Fixture {
        coordinator,
        engine,
        host,
    })
}

/// Encoded PNG of the given dimensions.
pub fn encoded_png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, image::Rgb([30, 144, 255]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png");
    Bytes::from(buffer)
}
