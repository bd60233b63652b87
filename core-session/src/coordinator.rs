//! # Session Coordinator
//!
//! Single authority for what the OS shows and permits right now.
//!
//! ## Overview
//!
//! The coordinator keeps three independently changing inputs consistent:
//! the engine's playback snapshot, the OS audio-focus state and the OS media
//! notification. Each input arrives on its own thread (engine callback
//! thread, UI thread, audio-policy thread), so every entry point only
//! enqueues a [`Command`] and returns. One worker task drains the queue and
//! owns all state, which makes snapshot replacement and focus transitions
//! atomic with respect to rendering, and no OS call ever runs under a lock.
//!
//! ```text
//!  engine ──report_state──┐
//!  OS taps ──transport────┼──> mpsc ──> SessionWorker ──> FocusArbiter ──> AudioPolicyService
//!  OS focus ──focus change┘                │          ──> NotificationProjector ──> NotificationService
//!                                          │          ──> ActionBridge ──> PlaybackEngine
//!                                          └──> watch<SessionStatus>, EventBus
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SessionConfig;
//! use core_session::{PlaybackStateSnapshot, SessionCoordinator};
//!
//! let coordinator = SessionCoordinator::spawn(config)?;
//! let handle = coordinator.handle();
//!
//! // Engine callback thread
//! handle.report_state("Song", "Artist", 180_000, 0, true, None)?;
//!
//! // Host teardown
//! coordinator.shutdown("service destroyed").await;
//! ```

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    FocusChange, FocusChangeListener, FocusDirective, KeepAliveHost, KeepAliveRequest,
    PlaybackEngine, PlaybackGate, TransportAction, TransportControlListener,
};
use bytes::Bytes;
use core_runtime::config::SessionConfig;
use core_runtime::events::{
    CoreEvent, EventBus, FocusEvent, NotificationEvent, Receiver, SessionEvent, TransportEvent,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::actions::ActionBridge;
use crate::error::{Result, SessionError};
use crate::focus::{FocusArbiter, FocusState};
use crate::lease::KeepAliveLease;
use crate::projector::NotificationProjector;
use crate::snapshot::{PlaybackStateSnapshot, SessionId, SessionLifecycle};

/// Consistent read-only view of the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub lifecycle: SessionLifecycle,
    pub focus: FocusState,
    pub snapshot: Option<Arc<PlaybackStateSnapshot>>,
}

impl SessionStatus {
    /// Playing flag as shown to the OS: engine playing and focus permitting it.
    pub fn is_effectively_playing(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.is_playing)
            && self.focus.permits_playback()
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            lifecycle: SessionLifecycle::Uninitialized,
            focus: FocusState::None,
            snapshot: None,
        }
    }
}

#[derive(Debug)]
enum StopReason {
    Requested,
    HostTeardown,
    Fatal(SessionError),
    HandlesDropped,
}

impl StopReason {
    fn is_fatal(&self) -> bool {
        matches!(self, StopReason::Fatal(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => f.write_str("stop requested"),
            StopReason::HostTeardown => f.write_str("host teardown"),
            StopReason::Fatal(err) => write!(f, "{}", err),
            StopReason::HandlesDropped => f.write_str("all session handles dropped"),
        }
    }
}

enum Command {
    Start(oneshot::Sender<Result<()>>),
    Stop {
        reason: StopReason,
        done: Option<oneshot::Sender<()>>,
    },
    EngineState(PlaybackStateSnapshot),
    UserAction(TransportAction),
    FocusChanged(FocusChange),
    Settled(oneshot::Sender<()>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Start(_) => "start",
            Command::Stop { .. } => "stop",
            Command::EngineState(_) => "report_state",
            Command::UserAction(_) => "on_user_action",
            Command::FocusChanged(_) => "on_focus_changed",
            Command::Settled(_) => "settled",
        }
    }
}

/// Cloneable, thread-safe entry point into a running coordinator.
///
/// Every method enqueues and returns without waiting for OS calls, except
/// [`start`](Self::start), [`stop`](Self::stop) and [`settled`](Self::settled)
/// which await the worker.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
    events: EventBus,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    fn send(&self, command: Command) -> Result<()> {
        let operation = command.name();
        let state = self.status.borrow().lifecycle;
        if state == SessionLifecycle::Stopped {
            return Err(SessionError::InvalidLifecycleState { operation, state });
        }
        self.commands
            .send(command)
            .map_err(|_| SessionError::InvalidLifecycleState {
                operation,
                state: SessionLifecycle::Stopped,
            })
    }

    /// Engine pushes a new authoritative snapshot.
    pub fn report_state(
        &self,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_ms: u64,
        position_ms: u64,
        is_playing: bool,
        artwork: Option<Bytes>,
    ) -> Result<()> {
        let mut snapshot =
            PlaybackStateSnapshot::new(title, artist, duration_ms, position_ms, is_playing);
        snapshot.artwork = artwork;
        self.on_engine_state_changed(snapshot)
    }

    /// Replace the current snapshot. The first snapshot activates the session.
    pub fn on_engine_state_changed(&self, snapshot: PlaybackStateSnapshot) -> Result<()> {
        self.send(Command::EngineState(snapshot))
    }

    /// Engine hit an unrecoverable error; the session stops itself.
    pub fn report_fatal_error(&self, reason: impl Into<String>) -> Result<()> {
        self.send(Command::Stop {
            reason: StopReason::Fatal(SessionError::FatalEngineError(reason.into())),
            done: None,
        })
    }

    /// Route an OS transport action to the engine.
    pub fn on_user_action(&self, action: TransportAction) -> Result<()> {
        self.send(Command::UserAction(action))
    }

    /// Apply an OS audio-focus change.
    pub fn on_focus_changed(&self, change: FocusChange) -> Result<()> {
        self.send(Command::FocusChanged(change))
    }

    /// The OS is destroying the host (service/activity). Stops the session.
    pub fn on_host_teardown(&self) {
        let command = Command::Stop {
            reason: StopReason::HostTeardown,
            done: None,
        };
        if let Err(err) = self.send(command) {
            debug!(session_id = %self.id, error = %err, "Teardown after session stopped");
        }
    }

    /// Activate the session. No-op when already active.
    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx))?;
        rx.await.map_err(|_| SessionError::InvalidLifecycleState {
            operation: "start",
            state: SessionLifecycle::Stopped,
        })?
    }

    /// Stop the session and wait for teardown to finish. Idempotent.
    pub async fn stop(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let command = Command::Stop {
            reason: StopReason::Requested,
            done: Some(tx),
        };
        if self.send(command).is_err() {
            return Ok(());
        }
        // The sender is dropped unanswered only if the worker stopped first.
        let _ = rx.await;
        Ok(())
    }

    /// Wait until every command enqueued before this call has been applied.
    pub async fn settled(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Settled(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn lifecycle(&self) -> SessionLifecycle {
        self.status.borrow().lifecycle
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    fn downgrade(&self) -> CallbackBridge {
        CallbackBridge {
            id: self.id,
            commands: self.commands.downgrade(),
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

/// Listener registered with the OS bridges.
///
/// Holds only a weak sender: bridges keep their listener alive for as long as
/// they like, and that must not keep a coordinator nobody owns running.
/// Callbacks after stop are logged and ignored.
struct CallbackBridge {
    id: SessionId,
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl CallbackBridge {
    fn deliver(&self, command: Command) {
        let operation = command.name();
        let delivered = self
            .commands
            .upgrade()
            .is_some_and(|sender| sender.send(command).is_ok());
        if !delivered {
            let err = SessionError::InvalidLifecycleState {
                operation,
                state: SessionLifecycle::Stopped,
            };
            debug!(session_id = %self.id, error = %err, "Ignoring OS callback");
        }
    }
}

impl FocusChangeListener for CallbackBridge {
    fn on_focus_changed(&self, change: FocusChange) {
        self.deliver(Command::FocusChanged(change));
    }
}

impl TransportControlListener for CallbackBridge {
    fn on_transport_action(&self, action: TransportAction) {
        self.deliver(Command::UserAction(action));
    }
}

/// Owner of one media session.
///
/// The keep-alive host owns the coordinator and passes [`SessionHandle`]s to
/// the engine and platform glue. Dropping every handle (including this one)
/// stops the session.
pub struct SessionCoordinator {
    handle: SessionHandle,
    worker: JoinHandle<()>,
}

impl SessionCoordinator {
    /// Spawn the coordinator worker on the current tokio runtime.
    pub fn spawn(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::RuntimeUnavailable(e.to_string()))?;

        let id = SessionId::new();
        let events = EventBus::new(config.event_buffer_size);
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());

        let handle = SessionHandle {
            id,
            commands,
            status: status_rx,
            events: events.clone(),
        };

        let worker = SessionWorker::new(id, &config, handle.downgrade(), events, status_tx);
        let worker = runtime.spawn(worker.run(receiver));

        info!(session_id = %id, "Session coordinator spawned");
        Ok(Self { handle, worker })
    }

    pub fn id(&self) -> SessionId {
        self.handle.id
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub async fn start(&self) -> Result<()> {
        self.handle.start().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.handle.stop().await
    }

    pub fn status(&self) -> SessionStatus {
        self.handle.status()
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.handle.subscribe_events()
    }

    /// Stop the session and wait for the worker to exit.
    pub async fn shutdown(self, reason: &str) {
        info!(session_id = %self.handle.id, reason, "Shutting down session coordinator");
        let _ = self.handle.stop().await;
        drop(self.handle);
        if let Err(err) = self.worker.await {
            error!(error = %err, "Session worker panicked");
        }
    }
}

/// State owned by the worker task.
struct SessionWorker {
    id: SessionId,
    lifecycle: SessionLifecycle,
    snapshot: Option<Arc<PlaybackStateSnapshot>>,
    /// Playing flag the last focus decision was made for.
    arbitrated_playing: Option<bool>,
    focus: FocusArbiter,
    projector: NotificationProjector,
    actions: ActionBridge,
    engine: Arc<dyn PlaybackEngine>,
    keep_alive_host: Arc<dyn KeepAliveHost>,
    keep_alive_request: KeepAliveRequest,
    lease: Option<KeepAliveLease>,
    listener: Arc<CallbackBridge>,
    events: EventBus,
    status: watch::Sender<SessionStatus>,
}

impl SessionWorker {
    fn new(
        id: SessionId,
        config: &SessionConfig,
        listener: CallbackBridge,
        events: EventBus,
        status: watch::Sender<SessionStatus>,
    ) -> Self {
        let can_duck = config.capabilities.supports_ducking && config.engine.supports_ducking();
        Self {
            id,
            lifecycle: SessionLifecycle::Uninitialized,
            snapshot: None,
            arbitrated_playing: None,
            focus: FocusArbiter::new(Arc::clone(&config.audio_policy), can_duck),
            projector: NotificationProjector::new(
                Arc::clone(&config.notification_service),
                config.channel.clone(),
                config.capabilities,
                config.notification_id,
                config.session_tag.clone(),
                config.artwork_size_px,
            ),
            actions: ActionBridge::new(Arc::clone(&config.engine)),
            engine: Arc::clone(&config.engine),
            keep_alive_host: Arc::clone(&config.keep_alive_host),
            keep_alive_request: KeepAliveRequest::new(
                config.keep_alive_tag.clone(),
                config.notification_id,
            ),
            lease: None,
            listener: Arc::new(listener),
            events,
            status,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
            if self.lifecycle == SessionLifecycle::Stopped {
                break;
            }
        }

        if self.lifecycle != SessionLifecycle::Stopped {
            self.shutdown(StopReason::HandlesDropped).await;
        }

        commands.close();
        while let Ok(command) = commands.try_recv() {
            self.reject(command);
        }
        debug!(session_id = %self.id, "Session worker exited");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.start().await);
            }
            Command::Stop { reason, done } => {
                self.shutdown(reason).await;
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            Command::EngineState(snapshot) => self.apply_snapshot(snapshot).await,
            Command::UserAction(action) => self.route_action(action).await,
            Command::FocusChanged(change) => self.apply_focus_change(change).await,
            Command::Settled(reply) => {
                let _ = reply.send(());
            }
        }
    }

    /// Answer commands that were queued behind the stop.
    fn reject(&self, command: Command) {
        let err = SessionError::InvalidLifecycleState {
            operation: command.name(),
            state: self.lifecycle,
        };
        match command {
            Command::Start(reply) => {
                let _ = reply.send(Err(err));
            }
            Command::Stop { done, .. } => {
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            Command::Settled(reply) => {
                let _ = reply.send(());
            }
            Command::EngineState(_) | Command::UserAction(_) | Command::FocusChanged(_) => {
                debug!(session_id = %self.id, error = %err, "Ignoring command after stop");
            }
        }
    }

    fn emit(&self, event: CoreEvent) {
        let _ = self.events.emit(event);
    }

    fn publish_status(&self) {
        let next = SessionStatus {
            lifecycle: self.lifecycle,
            focus: self.focus.state(),
            snapshot: self.snapshot.clone(),
        };
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    #[instrument(skip_all, fields(session_id = %self.id))]
    async fn start(&mut self) -> Result<()> {
        match self.lifecycle {
            SessionLifecycle::Active => Ok(()),
            SessionLifecycle::Stopped => Err(SessionError::InvalidLifecycleState {
                operation: "start",
                state: SessionLifecycle::Stopped,
            }),
            SessionLifecycle::Uninitialized => {
                self.activate().await;
                Ok(())
            }
        }
    }

    /// Uninitialized -> Active. Bridge failures degrade the session, they
    /// do not prevent it from starting.
    async fn activate(&mut self) {
        self.lifecycle = SessionLifecycle::Active;

        match KeepAliveLease::acquire(
            Arc::clone(&self.keep_alive_host),
            self.keep_alive_request.clone(),
        )
        .await
        {
            Ok(lease) => self.lease = Some(lease),
            Err(err) => warn!(error = %err, "Keep-alive unavailable, process may be reclaimed"),
        }

        let listener: Arc<dyn TransportControlListener> = self.listener.clone();
        if let Err(err) = self.projector.register(listener).await {
            warn!(error = %err, "Media session registration failed, transport controls unavailable");
        }

        info!(keep_alive = self.lease.is_some(), "Session started");
        self.publish_status();
        self.emit(CoreEvent::Session(SessionEvent::Started {
            session_id: self.id.to_string(),
            keep_alive: self.lease.is_some(),
        }));
    }

    #[instrument(skip_all, fields(session_id = %self.id, %reason))]
    async fn shutdown(&mut self, reason: StopReason) {
        if self.lifecycle == SessionLifecycle::Stopped {
            return;
        }
        let was_active = self.lifecycle == SessionLifecycle::Active;
        if let StopReason::Fatal(err) = &reason {
            error!(error = %err, "Stopping session after engine failure");
        }

        if was_active {
            // Unconditional: an unanswered request must be cancelled too.
            let before = self.focus.state();
            self.focus.release().await;
            self.emit_focus_transition(before);

            match self.projector.clear().await {
                Ok(()) => self.emit(CoreEvent::Notification(NotificationEvent::Cleared)),
                Err(err) => warn!(error = %err, "Failed to clear media notification"),
            }
        }

        if let Some(lease) = self.lease.take() {
            if let Err(err) = lease.release().await {
                warn!(error = %err, "Failed to release keep-alive lease");
            }
        }

        self.lifecycle = SessionLifecycle::Stopped;
        info!("Session stopped");
        self.publish_status();
        self.emit(CoreEvent::Session(SessionEvent::Stopped {
            session_id: self.id.to_string(),
            reason: reason.to_string(),
            fatal: reason.is_fatal(),
        }));
    }

    #[instrument(skip_all, fields(session_id = %self.id, is_playing = snapshot.is_playing))]
    async fn apply_snapshot(&mut self, snapshot: PlaybackStateSnapshot) {
        if self.lifecycle == SessionLifecycle::Uninitialized {
            self.activate().await;
        }

        let snapshot = Arc::new(snapshot.normalized());
        let position_only = self
            .snapshot
            .as_ref()
            .is_some_and(|previous| previous.same_except_position(&snapshot));
        self.snapshot = Some(Arc::clone(&snapshot));

        if position_only {
            trace!(position_ms = snapshot.position_ms, "Position update");
        } else {
            self.emit(CoreEvent::Session(SessionEvent::SnapshotApplied {
                title: snapshot.title.clone(),
                is_playing: snapshot.is_playing,
                position_ms: snapshot.position_ms,
            }));
        }

        if self.arbitrated_playing != Some(snapshot.is_playing) {
            self.arbitrated_playing = Some(snapshot.is_playing);
            self.arbitrate(snapshot.is_playing).await;
        }

        self.render().await;
        self.publish_status();
    }

    /// Bring focus in line with the engine's playing flag.
    async fn arbitrate(&mut self, is_playing: bool) {
        let before = self.focus.state();

        if is_playing {
            if !matches!(before, FocusState::Granted | FocusState::Requested) {
                self.acquire_focus().await;
            }
        } else if self.focus.awaiting_gain() {
            debug!(focus = %before, "Keeping focus until the interruption ends");
        } else {
            self.focus.abandon_focus().await;
        }

        self.emit_focus_transition(before);
    }

    async fn acquire_focus(&mut self) {
        let listener: Arc<dyn FocusChangeListener> = self.listener.clone();
        match self.focus.request_focus(listener).await {
            Ok(true) => {}
            Ok(false) => {
                self.focus.arm_resume();
                self.gate_playback(PlaybackGate::FocusPending);
                self.emit(CoreEvent::Focus(FocusEvent::Pending));
            }
            Err(err) => {
                warn!(error = %err, "Playback gated");
                self.gate_playback(PlaybackGate::FocusDenied);
                self.emit(CoreEvent::Focus(FocusEvent::Denied {
                    message: err.to_string(),
                }));
            }
        }
    }

    /// Hold the engine back until focus is obtained.
    fn gate_playback(&self, gate: PlaybackGate) {
        self.issue_directive(FocusDirective::Pause);
        if let Err(err) = self.engine.on_playback_gated(gate) {
            warn!(error = %err, ?gate, "Engine rejected playback gate");
        }
    }

    fn issue_directive(&self, directive: FocusDirective) {
        debug!(%directive, "Issuing focus directive");
        if let Err(err) = self.engine.on_focus_directive(directive) {
            warn!(error = %err, %directive, "Engine rejected focus directive");
        }
        self.emit(CoreEvent::Focus(FocusEvent::DirectiveIssued {
            directive: directive.to_string(),
        }));
    }

    fn emit_focus_transition(&self, before: FocusState) {
        let after = self.focus.state();
        if before != after {
            debug!(from = %before, to = %after, "Focus state changed");
            self.emit(CoreEvent::Focus(FocusEvent::StateChanged {
                from: before.to_string(),
                to: after.to_string(),
            }));
        }
    }

    #[instrument(skip_all, fields(session_id = %self.id, %change))]
    async fn apply_focus_change(&mut self, change: FocusChange) {
        if self.lifecycle != SessionLifecycle::Active {
            debug!(lifecycle = %self.lifecycle, "Ignoring focus change");
            return;
        }

        let was_playing = self
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.is_playing);
        let before = self.focus.state();

        if let Some(directive) = self.focus.on_focus_changed(change, was_playing) {
            self.issue_directive(directive);
        }
        self.emit_focus_transition(before);

        self.render().await;
        self.publish_status();
    }

    #[instrument(skip_all, fields(session_id = %self.id, %action))]
    async fn route_action(&mut self, action: TransportAction) {
        if self.lifecycle != SessionLifecycle::Active {
            debug!(lifecycle = %self.lifecycle, "Ignoring transport action");
            return;
        }

        if action == TransportAction::Pause && self.focus.resume_pending() {
            self.focus.cancel_resume();
            if self.arbitrated_playing == Some(false) {
                let before = self.focus.state();
                self.focus.abandon_focus().await;
                self.emit_focus_transition(before);
                self.publish_status();
            }
        }

        match self.actions.dispatch(action) {
            Ok(()) => self.emit(CoreEvent::Transport(TransportEvent::ActionRouted {
                action: action.to_string(),
            })),
            Err(err) => {
                warn!(error = %err, "Engine rejected transport action");
                self.emit(CoreEvent::Transport(TransportEvent::ActionFailed {
                    action: action.to_string(),
                    message: err.to_string(),
                }));
            }
        }
    }

    async fn render(&mut self) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };

        match self.projector.render(&snapshot, self.focus.state()).await {
            Ok(report) => self.emit(CoreEvent::Notification(NotificationEvent::Rendered {
                title: snapshot.title.clone(),
                is_playing: report.is_playing,
                artwork: report.artwork_attached,
            })),
            Err(err) => {
                warn!(error = %err, "Continuing without a visible notification");
                self.emit(CoreEvent::Notification(NotificationEvent::RenderFailed {
                    message: err.to_string(),
                    artwork_stripped: snapshot.artwork.is_some(),
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::{DesktopKeepAliveHost, ImmediateAudioPolicy, InMemoryNotificationService};
    use bridge_traits::{BridgeError, PlaybackStatus};
    use core_runtime::config::PlatformCapabilities;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingEngine {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn record(&self, call: impl Into<String>) -> bridge_traits::error::Result<()> {
            self.calls.lock().push(call.into());
            Ok(())
        }
    }

    impl PlaybackEngine for RecordingEngine {
        fn play(&self) -> bridge_traits::error::Result<()> {
            self.record("play")
        }
        fn pause(&self) -> bridge_traits::error::Result<()> {
            self.record("pause")
        }
        fn skip_next(&self) -> bridge_traits::error::Result<()> {
            Err(BridgeError::OperationFailed("end of queue".to_string()))
        }
        fn skip_previous(&self) -> bridge_traits::error::Result<()> {
            self.record("skip_previous")
        }
        fn seek_to(&self, position_ms: u64) -> bridge_traits::error::Result<()> {
            self.record(format!("seek_to({position_ms})"))
        }
        fn on_focus_directive(&self, directive: FocusDirective) -> bridge_traits::error::Result<()> {
            self.record(format!("directive:{directive}"))
        }
        fn on_playback_gated(&self, gate: PlaybackGate) -> bridge_traits::error::Result<()> {
            self.record(format!("gated:{gate:?}"))
        }
    }

    struct Harness {
        coordinator: SessionCoordinator,
        engine: Arc<RecordingEngine>,
        policy: Arc<ImmediateAudioPolicy>,
        notifications: Arc<InMemoryNotificationService>,
        host: Arc<DesktopKeepAliveHost>,
    }

    fn harness() -> Harness {
        let engine = Arc::new(RecordingEngine::default());
        let policy = Arc::new(ImmediateAudioPolicy::new());
        let notifications = Arc::new(InMemoryNotificationService::new());
        let host = Arc::new(DesktopKeepAliveHost::new());
        let config = SessionConfig::builder()
            .engine(engine.clone())
            .audio_policy(policy.clone())
            .notification_service(notifications.clone())
            .keep_alive_host(host.clone())
            .capabilities(PlatformCapabilities {
                supports_ducking: true,
                requires_notification_channel: true,
                supports_seek: true,
            })
            .build()
            .unwrap();

        Harness {
            coordinator: SessionCoordinator::spawn(config).unwrap(),
            engine,
            policy,
            notifications,
            host,
        }
    }

    #[test]
    fn test_spawn_requires_runtime() {
        let engine = Arc::new(RecordingEngine::default());
        let config = SessionConfig::builder()
            .engine(engine)
            .audio_policy(Arc::new(ImmediateAudioPolicy::new()))
            .notification_service(Arc::new(InMemoryNotificationService::new()))
            .keep_alive_host(Arc::new(DesktopKeepAliveHost::new()))
            .build()
            .unwrap();

        let err = SessionCoordinator::spawn(config).err().unwrap();
        assert!(matches!(err, SessionError::RuntimeUnavailable(_)));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let h = harness();
        h.coordinator.start().await.unwrap();
        h.coordinator.start().await.unwrap();

        assert_eq!(h.coordinator.status().lifecycle, SessionLifecycle::Active);
        assert_eq!(h.host.acquire_count(), 1);
        assert!(h.notifications.is_session_registered());
        assert_eq!(h.notifications.channels().len(), 1);
    }

    #[tokio::test]
    async fn test_first_snapshot_starts_session() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle
            .report_state("Song", "Artist", 180_000, 1_000, true, None)
            .unwrap();
        handle.settled().await;

        let status = handle.status();
        assert_eq!(status.lifecycle, SessionLifecycle::Active);
        assert_eq!(status.focus, FocusState::Granted);
        assert!(status.is_effectively_playing());
        assert!(h.host.is_held());
        assert_eq!(
            h.notifications.session_state().unwrap().status,
            PlaybackStatus::Playing
        );
    }

    #[tokio::test]
    async fn test_position_ticks_are_not_published() {
        let h = harness();
        let handle = h.coordinator.handle();
        let mut events = handle.subscribe_events();

        for position_ms in [0, 1_000, 2_000] {
            handle
                .report_state("Song", "Artist", 180_000, position_ms, true, None)
                .unwrap();
        }
        handle
            .report_state("Song", "Artist", 180_000, 3_000, false, None)
            .unwrap();
        handle.settled().await;

        let mut applied = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let CoreEvent::Session(SessionEvent::SnapshotApplied {
                is_playing,
                position_ms,
                ..
            }) = event
            {
                applied.push((is_playing, position_ms));
            }
        }
        assert_eq!(applied, vec![(true, 0), (false, 3_000)]);
        assert_eq!(
            h.notifications.session_state().unwrap().position_ms,
            3_000
        );
    }

    #[tokio::test]
    async fn test_position_is_clamped() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle
            .report_state("Song", "Artist", 10_000, 99_000, false, None)
            .unwrap();
        handle.settled().await;

        assert_eq!(handle.status().snapshot.unwrap().position_ms, 10_000);
        assert_eq!(h.notifications.session_state().unwrap().position_ms, 10_000);
    }

    #[tokio::test]
    async fn test_pause_abandons_focus() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle.report_state("Song", "Artist", 180_000, 0, true, None).unwrap();
        handle.report_state("Song", "Artist", 180_000, 500, false, None).unwrap();
        handle.settled().await;

        assert_eq!(handle.status().focus, FocusState::None);
        assert_eq!(h.policy.request_count(), 1);
        assert_eq!(h.policy.abandon_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_loss_round_trip() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle.report_state("Song", "Artist", 180_000, 0, true, None).unwrap();
        handle.settled().await;

        assert!(h.policy.notify(FocusChange::LossTransient));
        // Engine obeys the pause directive.
        handle.report_state("Song", "Artist", 180_000, 900, false, None).unwrap();
        handle.settled().await;
        assert_eq!(handle.status().focus, FocusState::LostTransient);
        assert_eq!(h.policy.abandon_count(), 0);

        assert!(h.policy.notify(FocusChange::Gain));
        handle.settled().await;

        assert_eq!(
            h.engine.calls(),
            vec!["directive:pause".to_string(), "directive:resume".to_string()]
        );
        assert_eq!(handle.status().focus, FocusState::Granted);
    }

    #[tokio::test]
    async fn test_user_pause_cancels_auto_resume() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle.report_state("Song", "Artist", 180_000, 0, true, None).unwrap();
        handle.settled().await;

        h.policy.notify(FocusChange::LossTransient);
        handle.report_state("Song", "Artist", 180_000, 900, false, None).unwrap();
        assert!(h.notifications.press(TransportAction::Pause));
        handle.settled().await;
        assert_eq!(handle.status().focus, FocusState::None);

        // The policy dropped the listener on abandon; nothing left to resume.
        assert!(!h.policy.notify(FocusChange::Gain));
        assert!(!h.engine.calls().contains(&"directive:resume".to_string()));
    }

    #[tokio::test]
    async fn test_ducking_keeps_playing() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle.report_state("Song", "Artist", 180_000, 0, true, None).unwrap();
        handle.settled().await;

        h.policy.notify(FocusChange::LossTransientCanDuck);
        handle.settled().await;

        assert_eq!(h.engine.calls(), vec!["directive:duck".to_string()]);
        assert_eq!(
            h.notifications.session_state().unwrap().status,
            PlaybackStatus::Playing
        );
    }

    #[tokio::test]
    async fn test_transport_actions_reach_engine() {
        let h = harness();
        let handle = h.coordinator.handle();
        let mut events = handle.subscribe_events();
        handle.start().await.unwrap();

        assert!(h.notifications.press(TransportAction::SkipPrevious));
        assert!(h.notifications.press(TransportAction::SkipNext));
        handle.settled().await;

        assert_eq!(h.engine.calls(), vec!["skip_previous".to_string()]);
        let mut failed = false;
        while let Ok(event) = events.try_recv() {
            if let CoreEvent::Transport(TransportEvent::ActionFailed { action, .. }) = event {
                assert_eq!(action, "skip_next");
                failed = true;
            }
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_session() {
        let h = harness();
        let handle = h.coordinator.handle();
        let mut status = handle.watch_status();
        handle.report_state("Song", "Artist", 180_000, 0, true, None).unwrap();
        handle.report_fatal_error("decoder crashed").unwrap();

        status
            .wait_for(|status| status.lifecycle == SessionLifecycle::Stopped)
            .await
            .unwrap();

        assert!(!h.host.is_held());
        assert!(h.notifications.notification().is_none());
        assert!(matches!(
            handle.report_state("Song", "Artist", 180_000, 0, true, None),
            Err(SessionError::InvalidLifecycleState { .. })
        ));
        assert!(handle.start().await.is_err());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_terminal() {
        let h = harness();
        let handle = h.coordinator.handle();
        handle.report_state("Song", "Artist", 180_000, 0, true, None).unwrap();

        handle.stop().await.unwrap();
        handle.stop().await.unwrap();

        assert_eq!(handle.lifecycle(), SessionLifecycle::Stopped);
        assert_eq!(h.host.release_count(), 1);
        assert_eq!(h.notifications.clear_count(), 1);
        assert!(!h.notifications.is_session_registered());
        assert!(matches!(
            handle.on_user_action(TransportAction::Play),
            Err(SessionError::InvalidLifecycleState {
                state: SessionLifecycle::Stopped,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_joins_worker() {
        let h = harness();
        let handle = h.coordinator.handle();
        h.coordinator.start().await.unwrap();

        h.coordinator.shutdown("test finished").await;
        assert_eq!(handle.lifecycle(), SessionLifecycle::Stopped);
        handle.on_host_teardown();
    }

    #[tokio::test]
    async fn test_dropping_all_handles_stops_session() {
        let h = harness();
        let mut status = h.coordinator.handle().watch_status();
        h.coordinator.start().await.unwrap();

        let Harness {
            coordinator, host, ..
        } = h;
        drop(coordinator);

        status
            .wait_for(|status| status.lifecycle == SessionLifecycle::Stopped)
            .await
            .unwrap();
        assert!(!host.is_held());
    }
}
