//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the media session core:
//! - Logging and tracing infrastructure with host log forwarding
//! - Session configuration and platform capability flags
//! - Event bus system
//!
//! ## Overview
//!
//! Everything here is ambient: the coordinator in `core-session` reads its
//! bridges and limits from [`config::SessionConfig`], reports through
//! [`events::EventBus`], and logs through `tracing` as set up by
//! [`logging::init_logging`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
