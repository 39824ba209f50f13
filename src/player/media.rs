//! Player for engines whose calls take effect immediately

use std::time::Duration;

use super::Player;

/// Engine states reported after each call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

/// An engine driven through direct calls and a state query
pub trait MediaEngine {
    fn set_media(&mut self, url: &str);
    /// Start playback; an error means the engine refused
    fn play(&mut self) -> Result<(), String>;
    /// Toggle pause
    fn pause(&mut self);
    fn stop(&mut self);
    fn state(&self) -> MediaState;
    fn length(&self) -> Option<Duration>;
    fn time(&self) -> Option<Duration>;
    fn set_time(&mut self, time: Duration);
}

/// Player that trusts the engine's immediate answers
pub struct MediaPlayer<E> {
    engine: E,
}

impl<E: MediaEngine> MediaPlayer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: MediaEngine> Player for MediaPlayer<E> {
    fn load_url(&mut self, url: &str) {
        self.engine.set_media(url);
    }

    fn play(&mut self) -> bool {
        match self.engine.play() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Playback refused: {}", e);
                false
            }
        }
    }

    fn pause(&mut self) -> bool {
        self.engine.pause();
        true
    }

    /// Pausing again toggles playback back on
    fn unpause(&mut self) -> bool {
        self.pause()
    }

    fn stop(&mut self) -> bool {
        self.engine.stop();
        true
    }

    fn is_playing(&mut self) -> bool {
        matches!(
            self.engine.state(),
            MediaState::Playing | MediaState::Opening | MediaState::Paused
        )
    }

    fn duration(&mut self) -> Duration {
        self.engine.length().unwrap_or(Duration::ZERO)
    }

    fn position(&mut self) -> Duration {
        self.engine.time().unwrap_or(Duration::ZERO)
    }

    fn set_position(&mut self, position: Duration) -> bool {
        self.engine.set_time(position);
        !matches!(
            self.engine.state(),
            MediaState::Ended | MediaState::Stopped | MediaState::Error
        )
    }
}
