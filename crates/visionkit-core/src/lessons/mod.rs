//! The lessons: each turns an input image or a stream of frames into a set of
//! named windows.
//!
//! Every lesson is split into a pure step (input frame in, windows out) and a
//! loop that drives it against a [`FrameSource`] and a [`FrameSink`].

mod live;
mod stills;

pub use live::{
    color_detection_step, hands_step, masking_step, run_live, webcam_step, HAND_HIGHLIGHT,
};
pub use stills::{
    adaptive_threshold_step, blur_step, color_space_step, contours_step, crop_step, drawing_step,
    images_step, object_boxes_step, resize_step, threshold_step, CROP_REGION,
};

use crate::camera::{FrameSource, SourceError, StillImageSource};
use crate::config::Config;
use crate::display::{FrameSink, SinkError};
use crate::frame::{Frame, FrameError};
use std::path::Path;
use thiserror::Error;
use visionkit_detection::blur::FilterError;
use visionkit_detection::draw::InvalidFont;
use visionkit_detection::hand::{HandDetector, NullDetector};

pub type Windows = Vec<(&'static str, Frame)>;

#[derive(Debug, Error)]
pub enum LessonError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Could not load caption font: {0}")]
    Font(#[from] InvalidFont),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lesson {
    Images,
    Crop,
    Resize,
    Blur,
    ColorSpace,
    Threshold,
    AdaptiveThreshold,
    Drawing,
    Contours,
    ObjectBoxes,
    Webcam,
    Masking,
    ColorDetection,
    Hands,
}

impl Lesson {
    pub const ALL: [Lesson; 14] = [
        Lesson::Images,
        Lesson::Crop,
        Lesson::Resize,
        Lesson::Blur,
        Lesson::ColorSpace,
        Lesson::Threshold,
        Lesson::AdaptiveThreshold,
        Lesson::Drawing,
        Lesson::Contours,
        Lesson::ObjectBoxes,
        Lesson::Webcam,
        Lesson::Masking,
        Lesson::ColorDetection,
        Lesson::Hands,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Lesson::Images => "images",
            Lesson::Crop => "crop",
            Lesson::Resize => "resize",
            Lesson::Blur => "blur",
            Lesson::ColorSpace => "color-space",
            Lesson::Threshold => "threshold",
            Lesson::AdaptiveThreshold => "adaptive-threshold",
            Lesson::Drawing => "drawing",
            Lesson::Contours => "contours",
            Lesson::ObjectBoxes => "object-boxes",
            Lesson::Webcam => "webcam",
            Lesson::Masking => "masking",
            Lesson::ColorDetection => "color-detection",
            Lesson::Hands => "hands",
        }
    }

    // Live lessons loop over a frame source until the quit key.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Lesson::Webcam | Lesson::Masking | Lesson::ColorDetection | Lesson::Hands
        )
    }

    // Still image a lesson reads when no other input is given.
    pub fn default_image(self, config: &Config) -> &Path {
        let lessons = &config.lessons;
        match self {
            Lesson::Resize => &lessons.large_image,
            Lesson::AdaptiveThreshold => &lessons.document,
            Lesson::Drawing => &lessons.whiteboard,
            Lesson::Contours | Lesson::ObjectBoxes => &lessons.birds,
            _ => &lessons.image,
        }
    }
}

/// Shows every window, then blocks until a key arrives.
pub fn present(sink: &mut dyn FrameSink, windows: &Windows) -> Result<Option<char>, LessonError> {
    for (name, frame) in windows {
        sink.show(name, frame)?;
    }
    Ok(sink.wait_key(None))
}

// One-shot lessons on a single decoded image.
pub fn still_step(lesson: Lesson, config: &Config, image: &Frame) -> Result<Windows, LessonError> {
    let detection = &config.detection;
    match lesson {
        Lesson::Images => Ok(images_step(image)),
        Lesson::Crop => crop_step(image),
        Lesson::Resize => resize_step(image),
        Lesson::Blur => blur_step(image),
        Lesson::ColorSpace => color_space_step(image),
        Lesson::Threshold => threshold_step(image, detection.threshold),
        Lesson::AdaptiveThreshold => adaptive_threshold_step(image),
        Lesson::Drawing => drawing_step(image),
        Lesson::Contours => contours_step(image, detection.contour_threshold),
        Lesson::ObjectBoxes => object_boxes_step(image, detection.contour_threshold, detection.min_area),
        // Live lessons run their step once on a still.
        Lesson::Webcam => Ok(webcam_step(image)),
        Lesson::Masking => masking_step(image, detection),
        Lesson::ColorDetection => color_detection_step(image, detection),
        Lesson::Hands => hands_step(image, &mut NullDetector),
    }
}

/// Runs `lesson` to completion.
///
/// Still lessons read `source` once and wait for any key. Live lessons loop
/// until the quit key; frames the source fails to deliver are skipped.
pub fn run(
    lesson: Lesson,
    config: &Config,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    detector: &mut dyn HandDetector,
) -> Result<(), LessonError> {
    tracing::info!(lesson = lesson.name(), "starting lesson");
    if !lesson.is_live() {
        let Some(image) = source.read()? else {
            tracing::warn!(lesson = lesson.name(), "no image to work on");
            return Ok(());
        };
        let windows = still_step(lesson, config, &image)?;
        let key = present(sink, &windows)?;
        tracing::debug!(?key, "lesson closed");
        return Ok(());
    }

    let base = &config.detection;
    let frames = match lesson {
        Lesson::Webcam => run_live(source, sink, base, |frame, _| Ok(webcam_step(frame)))?,
        Lesson::Masking => run_live(source, sink, base, masking_step)?,
        Lesson::ColorDetection => run_live(source, sink, base, color_detection_step)?,
        _ => run_live(source, sink, base, |frame, _| hands_step(frame, &mut *detector))?,
    };
    tracing::info!(lesson = lesson.name(), frames, "lesson finished");
    Ok(())
}

/// Runs a lesson against the image at `path`.
pub fn run_on_image(
    lesson: Lesson,
    config: &Config,
    path: &Path,
    sink: &mut dyn FrameSink,
) -> Result<(), LessonError> {
    let mut source = StillImageSource::open(path)?;
    run(lesson, config, &mut source, sink, &mut NullDetector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_kebab_case() {
        let mut names: Vec<&str> = Lesson::ALL.iter().map(|l| l.name()).collect();
        assert!(names.iter().all(|n| n.chars().all(|c| c.is_ascii_lowercase() || c == '-')));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Lesson::ALL.len());
    }

    #[test]
    fn lessons_pick_their_assets() {
        let cfg = Config::default();
        assert_eq!(Lesson::Resize.default_image(&cfg), cfg.lessons.large_image.as_path());
        assert_eq!(Lesson::AdaptiveThreshold.default_image(&cfg), cfg.lessons.document.as_path());
        assert_eq!(Lesson::ObjectBoxes.default_image(&cfg), cfg.lessons.birds.as_path());
        assert_eq!(Lesson::Crop.default_image(&cfg), cfg.lessons.image.as_path());
        assert_eq!(Lesson::ALL.iter().filter(|l| l.is_live()).count(), 4);
    }
}
