//! rodio output behind both engine traits

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use super::{MediaEngine, MediaState, PipelineEngine, PipelineState, StateChange};

/// Plays a single URL or local file on the default output device
///
/// Media is fetched and decoded in full when playback first starts, so
/// calls block. Use from a blocking context.
pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    uri: Option<String>,
    length: Option<Duration>,
    state: PipelineState,
    stopped: bool,
}

impl RodioEngine {
    pub fn new() -> Result<Self> {
        let mut stream =
            OutputStreamBuilder::open_default_stream().context("No audio output device")?;
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            uri: None,
            length: None,
            state: PipelineState::Null,
            stopped: false,
        })
    }

    fn load(&mut self) -> Result<&Sink> {
        if self.sink.is_none() {
            let uri = self.uri.as_deref().context("No media loaded")?;
            let data = read_media(uri)?;
            let decoder = Decoder::new(Cursor::new(data))
                .with_context(|| format!("Failed to decode {}", uri))?;

            self.length = decoder.total_duration();
            let sink = Sink::connect_new(self.stream.mixer());
            sink.pause();
            sink.append(decoder);
            debug!("Loaded {} ({:?})", uri, self.length);
            self.sink = Some(sink);
        }
        self.sink.as_ref().context("No media loaded")
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }
}

fn read_media(uri: &str) -> Result<Vec<u8>> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let response = reqwest::blocking::get(uri)
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", uri))?;
        return Ok(response.bytes().context("Failed to read stream")?.to_vec());
    }

    let path = if uri.starts_with("file://") {
        url::Url::parse(uri)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .with_context(|| format!("Invalid file URL: {}", uri))?
    } else {
        PathBuf::from(uri)
    };
    std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
}

impl PipelineEngine for RodioEngine {
    fn set_uri(&mut self, uri: &str) {
        self.unload();
        self.uri = Some(uri.to_string());
        self.length = None;
        self.state = PipelineState::Null;
    }

    fn set_state(&mut self, state: PipelineState) -> StateChange {
        match state {
            PipelineState::Playing | PipelineState::Paused => match self.load() {
                Ok(sink) => {
                    if state == PipelineState::Playing {
                        sink.play();
                    } else {
                        sink.pause();
                    }
                }
                Err(e) => {
                    warn!("{:#}", e);
                    return StateChange::Failure;
                }
            },
            PipelineState::Ready | PipelineState::Null | PipelineState::VoidPending => {
                self.unload()
            }
        }
        self.state = state;
        StateChange::Success
    }

    fn state(&mut self, _timeout: Duration) -> (StateChange, PipelineState) {
        if self.state == PipelineState::Playing && self.finished() {
            self.state = PipelineState::Null;
        }
        (StateChange::Success, self.state)
    }

    fn query_duration(&mut self) -> Option<Duration> {
        self.length
    }

    fn query_position(&mut self) -> Option<Duration> {
        self.sink.as_ref().map(Sink::get_pos)
    }

    fn seek(&mut self, position: Duration) -> bool {
        match &self.sink {
            Some(sink) => sink.try_seek(position).is_ok(),
            None => false,
        }
    }
}

impl MediaEngine for RodioEngine {
    fn set_media(&mut self, url: &str) {
        self.set_uri(url);
        self.stopped = false;
    }

    fn play(&mut self) -> Result<(), String> {
        self.stopped = false;
        self.load().map(Sink::play).map_err(|e| format!("{:#}", e))
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            if sink.is_paused() {
                sink.play();
            } else {
                sink.pause();
            }
        }
    }

    fn stop(&mut self) {
        self.unload();
        self.stopped = true;
    }

    fn state(&self) -> MediaState {
        match &self.sink {
            _ if self.stopped => MediaState::Stopped,
            None => MediaState::NothingSpecial,
            Some(sink) if sink.empty() => MediaState::Ended,
            Some(sink) if sink.is_paused() => MediaState::Paused,
            Some(_) => MediaState::Playing,
        }
    }

    fn length(&self) -> Option<Duration> {
        self.length
    }

    fn time(&self) -> Option<Duration> {
        self.sink.as_ref().map(Sink::get_pos)
    }

    fn set_time(&mut self, time: Duration) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_seek(time) {
                warn!("Seek failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_media_from_path_and_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        std::fs::write(&path, b"bytes").unwrap();

        assert_eq!(read_media(path.to_str().unwrap()).unwrap(), b"bytes");

        let file_url = url::Url::from_file_path(&path).unwrap();
        assert_eq!(read_media(file_url.as_str()).unwrap(), b"bytes");
    }

    #[test]
    fn test_read_media_missing_file() {
        assert!(read_media("/nonexistent/tunedl/a.mp3").is_err());
    }
}
