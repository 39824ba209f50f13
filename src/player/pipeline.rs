//! Player for engines with asynchronous state changes

use std::time::Duration;

use tracing::debug;

use super::Player;

/// Upper bound on polls while waiting for the engine
pub const MAX_POLLS: usize = 1000;

/// How long a single state query may block
const STATE_TIMEOUT: Duration = Duration::from_millis(1);

/// Result of a state change request or query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Success,
    Async,
    NoPreroll,
    Failure,
}

/// Engine states, from torn down to running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    VoidPending,
    Null,
    Ready,
    Paused,
    Playing,
}

/// An engine that moves between states in the background
pub trait PipelineEngine {
    fn set_uri(&mut self, uri: &str);
    fn set_state(&mut self, state: PipelineState) -> StateChange;
    /// Outcome of the last state change and the current state
    fn state(&mut self, timeout: Duration) -> (StateChange, PipelineState);
    fn query_duration(&mut self) -> Option<Duration>;
    fn query_position(&mut self) -> Option<Duration>;
    fn seek(&mut self, position: Duration) -> bool;
}

/// Polling player: each request waits for the engine to settle
pub struct PipelinePlayer<E> {
    engine: E,
    url: Option<String>,
}

impl<E: PipelineEngine> PipelinePlayer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, url: None }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Poll until the pending state change resolves
    ///
    /// Gives up (unsuccessfully) after [`MAX_POLLS`] polls.
    fn wait_for_state(&mut self) -> bool {
        for _ in 0..MAX_POLLS {
            match self.engine.state(STATE_TIMEOUT).0 {
                StateChange::Async => continue,
                StateChange::Failure => return false,
                StateChange::Success | StateChange::NoPreroll => return true,
            }
        }
        debug!("Engine did not settle after {} polls", MAX_POLLS);
        false
    }

    fn change_state(&mut self, state: PipelineState) -> bool {
        if self.engine.set_state(state) == StateChange::Failure {
            return false;
        }
        self.wait_for_state()
    }

    fn poll_query(&mut self, query: impl Fn(&mut E) -> Option<Duration>) -> Duration {
        (0..MAX_POLLS)
            .find_map(|_| query(&mut self.engine))
            .unwrap_or(Duration::ZERO)
    }
}

impl<E: PipelineEngine> Player for PipelinePlayer<E> {
    fn load_url(&mut self, url: &str) {
        self.url = Some(url.to_string());
        self.engine.set_uri(url);
    }

    fn play(&mut self) -> bool {
        self.change_state(PipelineState::Playing)
    }

    fn pause(&mut self) -> bool {
        self.change_state(PipelineState::Paused)
    }

    fn unpause(&mut self) -> bool {
        self.play()
    }

    fn stop(&mut self) -> bool {
        self.change_state(PipelineState::Null)
    }

    fn is_playing(&mut self) -> bool {
        if !self.wait_for_state() {
            return false;
        }
        matches!(
            self.engine.state(STATE_TIMEOUT).1,
            PipelineState::Playing | PipelineState::Paused | PipelineState::Ready
        )
    }

    fn duration(&mut self) -> Duration {
        self.poll_query(|engine| engine.query_duration())
    }

    fn position(&mut self) -> Duration {
        self.poll_query(|engine| engine.query_position())
    }

    fn set_position(&mut self, position: Duration) -> bool {
        if !self.engine.seek(position) {
            debug!("Seek to {:?} rejected", position);
        }
        self.wait_for_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine that reports `Async` a fixed number of times per change
    #[derive(Default)]
    struct ScriptedEngine {
        uri: Option<String>,
        current: Option<PipelineState>,
        pending_polls: usize,
        async_polls: usize,
        fail: bool,
        duration_misses: usize,
        state_queries: usize,
        seeks: Vec<Duration>,
    }

    impl PipelineEngine for ScriptedEngine {
        fn set_uri(&mut self, uri: &str) {
            self.uri = Some(uri.to_string());
        }

        fn set_state(&mut self, state: PipelineState) -> StateChange {
            self.current = Some(state);
            self.pending_polls = self.async_polls;
            if self.async_polls > 0 {
                StateChange::Async
            } else {
                StateChange::Success
            }
        }

        fn state(&mut self, _timeout: Duration) -> (StateChange, PipelineState) {
            self.state_queries += 1;
            let state = self.current.unwrap_or(PipelineState::Null);
            if self.pending_polls > 0 {
                self.pending_polls -= 1;
                return (StateChange::Async, state);
            }
            if self.fail {
                return (StateChange::Failure, state);
            }
            (StateChange::Success, state)
        }

        fn query_duration(&mut self) -> Option<Duration> {
            if self.duration_misses > 0 {
                self.duration_misses -= 1;
                return None;
            }
            Some(Duration::from_secs(180))
        }

        fn query_position(&mut self) -> Option<Duration> {
            None
        }

        fn seek(&mut self, position: Duration) -> bool {
            self.seeks.push(position);
            self.pending_polls = self.async_polls;
            true
        }
    }

    #[test]
    fn test_play_waits_for_async_change() {
        let mut player = PipelinePlayer::new(ScriptedEngine {
            async_polls: 5,
            ..Default::default()
        });
        player.load_url("http://stream/1");

        assert!(player.play());
        assert_eq!(player.engine().uri.as_deref(), Some("http://stream/1"));
        assert_eq!(player.engine().state_queries, 6);
        assert!(player.is_playing());
    }

    #[test]
    fn test_failure_is_reported() {
        let mut player = PipelinePlayer::new(ScriptedEngine {
            fail: true,
            ..Default::default()
        });
        assert!(!player.play());
        assert!(!player.is_playing());
    }

    #[test]
    fn test_polling_is_bounded() {
        let mut player = PipelinePlayer::new(ScriptedEngine {
            async_polls: MAX_POLLS + 10,
            ..Default::default()
        });
        assert!(!player.pause());
        assert_eq!(player.engine().state_queries, MAX_POLLS);
    }

    #[test]
    fn test_is_playing_by_state() {
        let mut player = PipelinePlayer::new(ScriptedEngine::default());
        assert!(!player.is_playing());

        assert!(player.pause());
        assert!(player.is_playing());

        assert!(player.unpause());
        assert!(player.is_playing());

        assert!(player.stop());
        assert!(!player.is_playing());
    }

    #[test]
    fn test_queries_retry_then_fall_back() {
        let mut player = PipelinePlayer::new(ScriptedEngine {
            duration_misses: 3,
            ..Default::default()
        });
        assert_eq!(player.duration(), Duration::from_secs(180));
        assert_eq!(player.position(), Duration::ZERO);
    }

    #[test]
    fn test_set_position_waits_after_seek() {
        let mut player = PipelinePlayer::new(ScriptedEngine {
            async_polls: 2,
            ..Default::default()
        });
        assert!(player.set_position(Duration::from_secs(42)));
        assert_eq!(player.engine().seeks, vec![Duration::from_secs(42)]);
        assert_eq!(player.engine().state_queries, 3);
    }
}
