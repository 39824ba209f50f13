//! Audio playback behind interchangeable backends
//!
//! [`PipelinePlayer`] drives engines that change state asynchronously and
//! must be polled until they settle. [`MediaPlayer`] drives engines whose
//! calls take effect immediately. Which one the CLI uses is decided at build
//! time through [`DefaultPlayer`].

use std::time::Duration;

pub mod media;
pub mod pipeline;
#[cfg(feature = "playback")]
pub mod rodio_engine;

pub use media::{MediaEngine, MediaPlayer, MediaState};
pub use pipeline::{PipelineEngine, PipelinePlayer, PipelineState, StateChange, MAX_POLLS};
#[cfg(feature = "playback")]
pub use rodio_engine::RodioEngine;

/// Playback controls shared by every backend
///
/// Control methods return whether the engine accepted the request.
pub trait Player {
    fn load_url(&mut self, url: &str);
    fn play(&mut self) -> bool;
    fn pause(&mut self) -> bool;
    fn unpause(&mut self) -> bool;
    fn stop(&mut self) -> bool;
    fn is_playing(&mut self) -> bool;
    /// Length of the loaded media, zero when unknown
    fn duration(&mut self) -> Duration;
    /// Current playback position, zero when unknown
    fn position(&mut self) -> Duration;
    fn set_position(&mut self, position: Duration) -> bool;
}

#[cfg(all(feature = "playback", not(feature = "media-backend")))]
pub type DefaultPlayer = PipelinePlayer<RodioEngine>;

#[cfg(feature = "media-backend")]
pub type DefaultPlayer = MediaPlayer<RodioEngine>;
