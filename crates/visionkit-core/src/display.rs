use crate::config::DetectionConfig;
use crate::frame::{Frame, FrameError};
use crate::streaming::AppState;
use bytes::Bytes;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;

pub const QUIT_KEY: char = 'q';

const JPEG_QUALITY: u8 = 60;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Could not write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A place frames get shown, plus the keyboard that goes with it.
pub trait FrameSink {
    /// Replaces whatever `window` currently shows.
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), SinkError>;

    /// Waits up to `timeout` (forever on `None`) for a key press.
    fn wait_key(&mut self, timeout: Option<Duration>) -> Option<char>;

    // Detection settings edited while running, if the sink offers any.
    fn detection(&self) -> Option<DetectionConfig> {
        None
    }
}

/// Publishes every window as an MJPEG stream on the dashboard.
pub struct DashboardSink {
    state: AppState,
    keys: mpsc::Receiver<char>,
}

impl DashboardSink {
    pub fn new(state: AppState, keys: mpsc::Receiver<char>) -> Self {
        Self { state, keys }
    }
}

impl FrameSink for DashboardSink {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), SinkError> {
        let jpeg = frame.to_jpeg(JPEG_QUALITY)?;
        self.state.blocking_publish(window, Bytes::from(jpeg));
        Ok(())
    }

    fn wait_key(&mut self, timeout: Option<Duration>) -> Option<char> {
        match timeout {
            Some(t) => self.keys.recv_timeout(t).ok(),
            None => self.keys.recv().ok(),
        }
    }

    fn detection(&self) -> Option<DetectionConfig> {
        Some(self.state.blocking_detection())
    }
}

/// Writes each window to `<dir>/<window>.png`.
///
/// There is no keyboard here: `wait_key` replays scripted keys and answers
/// the quit key once they run out, so loops end after their scripted frames.
pub struct DirectorySink {
    dir: PathBuf,
    script: VecDeque<char>,
    shown: u64,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| SinkError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            script: VecDeque::new(),
            shown: 0,
        })
    }

    pub fn with_keys<I: IntoIterator<Item = char>>(mut self, keys: I) -> Self {
        self.script.extend(keys);
        self
    }

    pub fn window_path(&self, window: &str) -> PathBuf {
        let file: String = window
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.png"))
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl FrameSink for DirectorySink {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), SinkError> {
        let path = self.window_path(window);
        frame.save(&path)?;
        self.shown += 1;
        tracing::debug!(window, path = %path.display(), "frame written");
        Ok(())
    }

    fn wait_key(&mut self, _timeout: Option<Duration>) -> Option<char> {
        Some(self.script.pop_front().unwrap_or(QUIT_KEY))
    }
}
