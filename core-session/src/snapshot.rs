//! Playback state values shared between the engine and the coordinator.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one coordinator instance in logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Coordinator lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionLifecycle {
    Uninitialized,
    Active,
    Stopped,
}

impl fmt::Display for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionLifecycle::Uninitialized => "uninitialized",
            SessionLifecycle::Active => "active",
            SessionLifecycle::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// What the engine currently reports.
///
/// Authored by the engine on every state change. The coordinator never edits
/// a snapshot in place; it replaces the current one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackStateSnapshot {
    pub title: String,
    pub artist: String,
    pub duration_ms: u64,
    /// Within `0..=duration_ms` once applied by the coordinator.
    pub position_ms: u64,
    pub is_playing: bool,
    /// Encoded image (any format the `image` crate decodes).
    pub artwork: Option<Bytes>,
}

impl PlaybackStateSnapshot {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_ms: u64,
        position_ms: u64,
        is_playing: bool,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration_ms,
            position_ms,
            is_playing,
            artwork: None,
        }
    }

    pub fn with_artwork(mut self, artwork: impl Into<Bytes>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    /// Clamp the position into the track when the duration is known.
    ///
    /// A zero duration means "unknown" (live streams, still loading) and
    /// leaves the position untouched.
    pub fn normalized(mut self) -> Self {
        if self.duration_ms > 0 && self.position_ms > self.duration_ms {
            self.position_ms = self.duration_ms;
        }
        self
    }

    /// Title shown on OS surfaces.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Unknown"
        } else {
            &self.title
        }
    }

    /// Artist shown on OS surfaces.
    pub fn display_artist(&self) -> &str {
        if self.artist.trim().is_empty() {
            "Unknown"
        } else {
            &self.artist
        }
    }

    /// Whether `other` differs from `self` only in playback position.
    pub fn same_except_position(&self, other: &Self) -> bool {
        self.title == other.title
            && self.artist == other.artist
            && self.duration_ms == other.duration_ms
            && self.is_playing == other.is_playing
            && self.artwork == other.artwork
    }
}
