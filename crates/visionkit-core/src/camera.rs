use crate::frame::{Frame, FrameError};
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not decode image: {0}")]
    Decode(#[from] FrameError),

    #[error("Camera error: {0}")]
    Camera(String),
}

/// Something that yields frames one at a time.
///
/// `Ok(None)` means no frame was available this time round. Callers skip the
/// iteration and try again.
pub trait FrameSource {
    fn read(&mut self) -> Result<Option<Frame>, SourceError>;
}

/// Serves the same decoded still image on every read.
pub struct StillImageSource {
    frame: Frame,
}

impl StillImageSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let frame = Frame::load(path.as_ref())?;
        tracing::debug!(
            path = %path.as_ref().display(),
            width = frame.width(),
            height = frame.height(),
            "decoded still image"
        );
        Ok(Self { frame })
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self { frame }
    }
}

impl FrameSource for StillImageSource {
    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        Ok(Some(self.frame.clone()))
    }
}

// Replays a fixed list of reads; `None` entries stand in for dropped frames.
pub struct SequenceSource {
    frames: VecDeque<Option<Frame>>,
}

impl SequenceSource {
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Option<Frame>>,
    {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for SequenceSource {
    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        Ok(self.frames.pop_front().flatten())
    }
}

#[cfg(feature = "camera")]
pub use device::CameraSource;

#[cfg(feature = "camera")]
mod device {
    use super::{FrameSource, SourceError};
    use crate::config::CameraConfig;
    use crate::frame::{Frame, FrameConfig, PixelFormat};
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;

    /// Live camera frames through nokhwa, decoded to BGR.
    pub struct CameraSource {
        camera: Camera,
    }

    impl CameraSource {
        pub fn open(cfg: &CameraConfig) -> Result<Self, SourceError> {
            let index = CameraIndex::Index(cfg.device_id);
            let requested = RequestedFormat::new::<RgbFormat>(requested_format(cfg));

            let mut camera =
                Camera::new(index, requested).map_err(|e| SourceError::Camera(e.to_string()))?;
            camera
                .open_stream()
                .map_err(|e| SourceError::Camera(e.to_string()))?;
            let format = camera.camera_format();
            tracing::info!(
                device_id = cfg.device_id,
                width = format.width(),
                height = format.height(),
                fps = format.frame_rate(),
                "camera stream opened"
            );
            Ok(Self { camera })
        }
    }

    // The device picks whatever it supports nearest to the configured mode.
    pub(super) fn requested_format(cfg: &CameraConfig) -> RequestedFormatType {
        RequestedFormatType::Closest(CameraFormat::new_from(
            cfg.width,
            cfg.height,
            FrameFormat::MJPEG,
            cfg.fps,
        ))
    }

    impl FrameSource for CameraSource {
        fn read(&mut self) -> Result<Option<Frame>, SourceError> {
            let buffer = match self.camera.frame() {
                Ok(buffer) => buffer,
                Err(e) => {
                    tracing::warn!("camera returned no frame: {}", e);
                    return Ok(None);
                }
            };
            let decoded = match buffer.decode_image::<RgbFormat>() {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::warn!("could not decode camera frame: {}", e);
                    return Ok(None);
                }
            };
            let width = decoded.width();
            let height = decoded.height();
            let rgb = Frame::new(FrameConfig {
                data: decoded.into_raw(),
                width,
                height,
                format: PixelFormat::RGB8,
            })?;
            Ok(Some(rgb.to_bgr8()))
        }
    }

    impl Drop for CameraSource {
        fn drop(&mut self) {
            if let Err(e) = self.camera.stop_stream() {
                tracing::warn!("could not stop camera stream: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameConfig, PixelFormat};

    fn gray(value: u8) -> Frame {
        Frame::new(FrameConfig {
            data: vec![value; 4],
            width: 2,
            height: 2,
            format: PixelFormat::GRAY8,
        })
        .unwrap()
    }

    #[test]
    fn sequence_reports_gaps_then_runs_dry() {
        let mut source = SequenceSource::new(vec![Some(gray(1)), None, Some(gray(3))]);
        assert_eq!(source.read().unwrap(), Some(gray(1)));
        assert_eq!(source.read().unwrap(), None);
        assert_eq!(source.read().unwrap(), Some(gray(3)));
        assert_eq!(source.read().unwrap(), None);
    }

    #[cfg(feature = "camera")]
    #[test]
    fn camera_asks_for_the_configured_mode() {
        use nokhwa::utils::{CameraFormat, FrameFormat, RequestedFormatType};

        let cfg = crate::config::Config::default().camera;
        assert_eq!(
            device::requested_format(&cfg),
            RequestedFormatType::Closest(CameraFormat::new_from(640, 480, FrameFormat::MJPEG, 30))
        );
    }

    #[test]
    fn still_image_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        gray(200).save(&path).unwrap();

        let mut source = StillImageSource::open(&path).unwrap();
        let first = source.read().unwrap().unwrap();
        let second = source.read().unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.format(), PixelFormat::BGR8);
        assert_eq!(first.get_pixel(1, 1), Some(&[200u8, 200, 200][..]));
    }

    #[test]
    fn missing_still_image_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StillImageSource::open(dir.path().join("absent.png")).err().unwrap();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
