//! Playback engine control surface.
//!
//! The native engine owns decoding, mixing and queue management. The session
//! core only needs a handful of entry points on it: the transport commands
//! routed from OS controls and the directives produced by audio-focus
//! arbitration. Every entry point is fire-and-forget: implementations post
//! the command to the engine and return without waiting for it to act. The
//! engine reports the outcome later as a new state snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Directive derived from an audio-focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusDirective {
    /// Stop producing audio, keep position.
    Pause,
    /// Keep playing at reduced volume.
    Duck,
    /// Undo an earlier focus-driven pause or duck.
    Resume,
}

impl fmt::Display for FocusDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FocusDirective::Pause => "pause",
            FocusDirective::Duck => "duck",
            FocusDirective::Resume => "resume",
        };
        f.write_str(label)
    }
}

/// Why the core is holding playback back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackGate {
    /// The audio policy refused focus.
    FocusDenied,
    /// Focus was requested but the grant has not arrived yet.
    FocusPending,
}

/// Engine entry points invoked by the session core.
///
/// Called from the coordinator worker; implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackEngine: PlatformSendSync {
    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn skip_next(&self) -> Result<()>;

    fn skip_previous(&self) -> Result<()>;

    /// Seek to an absolute position. Clamping against the track duration is
    /// the engine's job.
    fn seek_to(&self, position_ms: u64) -> Result<()>;

    /// Apply a focus directive.
    fn on_focus_directive(&self, directive: FocusDirective) -> Result<()>;

    /// Playback is gated by audio focus; surface it to the user.
    fn on_playback_gated(&self, gate: PlaybackGate) -> Result<()>;

    /// Whether the engine can lower its output volume instead of pausing.
    fn supports_ducking(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_display() {
        assert_eq!(FocusDirective::Duck.to_string(), "duck");
        assert_eq!(FocusDirective::Resume.to_string(), "resume");
    }

    #[test]
    fn test_mock_engine_records_seek() {
        let mut engine = MockPlaybackEngine::new();
        engine
            .expect_seek_to()
            .withf(|position| *position == 45_000)
            .times(1)
            .returning(|_| Ok(()));

        engine.seek_to(45_000).unwrap();
    }
}
