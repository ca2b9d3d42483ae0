use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use visionkit_detection::{Bgr, ColorRange};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub system: SystemConfig,
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub web: WebConfig,
    pub lessons: LessonsConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SystemConfig {
    pub log_level: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CameraConfig {
    pub device_id: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DetectionConfig {
    pub color_lower: [u8; 3],
    pub color_upper: [u8; 3],
    // BGR sample the color-detection lesson and the tuner start from.
    pub target_bgr: [u8; 3],
    pub min_area: f32,
    pub threshold: u8,
    pub contour_threshold: u8,
}

impl DetectionConfig {
    pub fn color_range(&self) -> ColorRange {
        ColorRange {
            lower: self.color_lower,
            upper: self.color_upper,
        }
    }

    pub fn target(&self) -> Bgr {
        Bgr::from(self.target_bgr)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct WebConfig {
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LessonsConfig {
    pub image: PathBuf,
    pub large_image: PathBuf,
    pub document: PathBuf,
    pub whiteboard: PathBuf,
    pub birds: PathBuf,
}

impl Config {
    // Load config from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    // Load default config
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file(DEFAULT_CONFIG_PATH)
    }
}

impl Default for Config {
    // Default config in memory if file doesn't exist
    fn default() -> Self {
        Config {
            system: SystemConfig {
                log_level: "info".to_string(),
            },
            camera: CameraConfig {
                device_id: 0,
                width: 640,
                height: 480,
                fps: 30,
            },
            detection: DetectionConfig {
                color_lower: [52, 52, 72],
                color_upper: [102, 255, 255],
                target_bgr: [0, 255, 255],
                min_area: 200.0,
                threshold: 80,
                contour_threshold: 120,
            },
            web: WebConfig { port: 8080 },
            lessons: LessonsConfig {
                image: PathBuf::from("assets/cat1.png"),
                large_image: PathBuf::from("assets/cat2.png"),
                document: PathBuf::from("assets/note.webp"),
                whiteboard: PathBuf::from("assets/wb.png"),
                birds: PathBuf::from("assets/birds.jpg"),
            },
        }
    }
}
