use crate::config::{Config, DetectionConfig};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use tokio::sync::{watch, RwLock};

pub type JpegFrame = Bytes;

/// Latest frame of one window.
///
/// New subscribers see the current frame straight away, so a window that was
/// published once (a still lesson) is still there for a late browser.
#[derive(Clone)]
pub struct FrameHub {
    tx: Arc<watch::Sender<Option<JpegFrame>>>,
}

impl FrameHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }
    pub fn subscribe(&self) -> watch::Receiver<Option<JpegFrame>> {
        self.tx.subscribe()
    }
    pub fn publish(&self, frame: JpegFrame) {
        self.tx.send_replace(Some(frame));
    }
    pub fn latest(&self) -> Option<JpegFrame> {
        self.tx.borrow().clone()
    }
}

impl Default for FrameHub {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub windows: Arc<RwLock<BTreeMap<String, FrameHub>>>,
    pub config: Arc<RwLock<Config>>,
    pub keys: mpsc::Sender<char>,
}

impl AppState {
    // The receiver gets every key posted to the dashboard.
    pub fn new(config: Config) -> (Self, mpsc::Receiver<char>) {
        let (keys, key_rx) = mpsc::channel();
        let state = Self {
            windows: Arc::new(RwLock::new(BTreeMap::new())),
            config: Arc::new(RwLock::new(config)),
            keys,
        };
        (state, key_rx)
    }

    pub async fn get_detection(&self) -> DetectionConfig {
        self.config.read().await.detection.clone()
    }

    pub async fn window(&self, name: &str) -> Option<FrameHub> {
        self.windows.read().await.get(name).cloned()
    }

    pub async fn window_names(&self) -> Vec<String> {
        self.windows.read().await.keys().cloned().collect()
    }

    // Only for threads outside the async runtime.
    pub fn blocking_publish(&self, name: &str, frame: JpegFrame) {
        let hub = {
            let mut windows = self.windows.blocking_write();
            windows.entry(name.to_string()).or_default().clone()
        };
        hub.publish(frame);
    }

    pub fn blocking_detection(&self) -> DetectionConfig {
        self.config.blocking_read().detection.clone()
    }
}
