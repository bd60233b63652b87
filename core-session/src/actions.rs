//! Transport-control routing: OS action to engine entry point.

use std::sync::Arc;

use bridge_traits::{error::Result, PlaybackEngine, TransportAction};
use tracing::debug;

/// Stateless translation table from OS transport actions to engine calls.
///
/// Each action maps to exactly one engine entry point. Seek targets pass
/// through untouched; clamping against the duration is the engine's job.
/// Calls are fire-and-forget: the engine's reaction arrives later as a new
/// snapshot.
#[derive(Clone)]
pub struct ActionBridge {
    engine: Arc<dyn PlaybackEngine>,
}

impl ActionBridge {
    pub fn new(engine: Arc<dyn PlaybackEngine>) -> Self {
        Self { engine }
    }

    pub fn dispatch(&self, action: TransportAction) -> Result<()> {
        debug!(%action, "Routing transport action");
        match action {
            TransportAction::Play => self.engine.play(),
            TransportAction::Pause => self.engine.pause(),
            TransportAction::SkipNext => self.engine.skip_next(),
            TransportAction::SkipPrevious => self.engine.skip_previous(),
            TransportAction::SeekTo { position_ms } => self.engine.seek_to(position_ms),
        }
    }
}
