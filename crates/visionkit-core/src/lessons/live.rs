use super::{LessonError, Windows};
use crate::camera::FrameSource;
use crate::config::DetectionConfig;
use crate::detection::{detect_color, run_color_mask};
use crate::display::{FrameSink, QUIT_KEY};
use crate::fps::FpsMeter;
use crate::frame::Frame;
use std::time::Duration;
use visionkit_detection::draw::{draw_circle, draw_rectangle, Thickness};
use visionkit_detection::hand::{draw_hand, landmark_positions, HandDetector, HandLandmark};
use visionkit_detection::palette;

const KEY_POLL: Duration = Duration::from_millis(1);
const LOG_EVERY: Duration = Duration::from_secs(1);

/// Fingertips the hands lesson marks: index and middle.
pub const HAND_HIGHLIGHT: [HandLandmark; 2] = [HandLandmark::IndexTip, HandLandmark::MiddleTip];
const HIGHLIGHT_RADIUS: u32 = 40;
const BOX_THICKNESS: u32 = 4;

/// Read, step, show, poll for `q`.
///
/// Settings come from the sink when it offers live ones, from `base`
/// otherwise. Returns how many frames were processed.
pub fn run_live<F>(
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    base: &DetectionConfig,
    mut step: F,
) -> Result<u64, LessonError>
where
    F: FnMut(&Frame, &DetectionConfig) -> Result<Windows, LessonError>,
{
    let mut fps = FpsMeter::new();
    let mut processed = 0u64;
    let mut rate = 0.0;

    loop {
        match source.read()? {
            Some(frame) => {
                let detection = sink.detection().unwrap_or_else(|| base.clone());
                for (name, out) in step(&frame, &detection)? {
                    sink.show(name, &out)?;
                }
                processed += 1;
                rate = fps.tick();
            }
            None => tracing::debug!("no frame from source, skipping"),
        }

        if let Some(frames) = fps.report_due(LOG_EVERY) {
            tracing::info!(frames_in_window = frames, fps = rate);
        }

        if sink.wait_key(Some(KEY_POLL)) == Some(QUIT_KEY) {
            break;
        }
    }
    Ok(processed)
}

// Mirrored like a selfie camera.
pub fn webcam_step(frame: &Frame) -> Windows {
    vec![("webcam", frame.flip_horizontal())]
}

// Masks the configured HSV band.
pub fn masking_step(frame: &Frame, detection: &DetectionConfig) -> Result<Windows, LessonError> {
    let mask = run_color_mask(frame, &detection.color_range());
    Ok(vec![("webcam", Frame::from_plane(mask)?)])
}

pub fn color_detection_step(frame: &Frame, detection: &DetectionConfig) -> Result<Windows, LessonError> {
    let mut shown = frame.flip_horizontal().to_bgr8();
    let found = detect_color(&shown, detection.target());
    if let Some(bbox) = found.bbox {
        tracing::trace!(?bbox, "target color found");
        // Right and bottom are one past the last masked pixel.
        draw_rectangle(
            &mut shown.view_mut(),
            (bbox.x as i32, bbox.y as i32),
            (bbox.right() as i32, bbox.bottom() as i32),
            palette::GREEN,
            Thickness::Stroke(BOX_THICKNESS),
        );
    }
    Ok(vec![("webcam", shown), ("mask", Frame::from_plane(found.mask)?)])
}

pub fn hands_step(frame: &Frame, detector: &mut dyn HandDetector) -> Result<Windows, LessonError> {
    let mut shown = frame.to_bgr8();
    let rgb = frame.to_rgb8();
    let hands = match detector.detect(rgb.view()) {
        Ok(hands) => hands,
        Err(e) => {
            tracing::warn!("hand detection failed: {}", e);
            Vec::new()
        }
    };

    let (width, height) = (shown.width(), shown.height());
    let ids = HAND_HIGHLIGHT.map(HandLandmark::index);
    for hand in &hands {
        for pos in landmark_positions(hand, &ids, width, height) {
            draw_circle(
                &mut shown.view_mut(),
                (pos.x, pos.y),
                HIGHLIGHT_RADIUS,
                palette::CYAN,
                Thickness::Filled,
            );
        }
        draw_hand(&mut shown.view_mut(), hand, palette::RED, palette::WHITE);

        let tracked = [
            HandLandmark::ThumbTip.index(),
            HandLandmark::IndexTip.index(),
            HandLandmark::Wrist.index(),
        ];
        tracing::debug!(positions = ?landmark_positions(hand, &tracked, width, height));
    }
    Ok(vec![("webcam", shown)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SequenceSource;
    use crate::config::Config;
    use crate::display::DirectorySink;
    use crate::frame::PixelFormat;
    use ndarray::Array3;
    use visionkit_detection::hand::{DetectorError, Hand, Landmark, NullDetector, LANDMARK_COUNT};

    fn frame(width: usize, height: usize) -> Frame {
        Frame::from_array(Array3::zeros((height, width, 3)), PixelFormat::BGR8).unwrap()
    }

    struct OneHand;

    impl HandDetector for OneHand {
        fn detect(&mut self, _rgb: ndarray::ArrayView3<u8>) -> Result<Vec<Hand>, DetectorError> {
            let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
            landmarks[HandLandmark::IndexTip.index()] = Landmark { x: 0.25, y: 0.5, z: 0.0 };
            landmarks[HandLandmark::MiddleTip.index()] = Landmark { x: 0.75, y: 0.5, z: 0.0 };
            Ok(vec![Hand { landmarks }])
        }
    }

    // Off-frame and non-finite points, as a confused model might report.
    struct Wild;

    impl HandDetector for Wild {
        fn detect(&mut self, _rgb: ndarray::ArrayView3<u8>) -> Result<Vec<Hand>, DetectorError> {
            let mut landmarks = [Landmark { x: 0.5, y: 0.5, z: 0.0 }; LANDMARK_COUNT];
            landmarks[HandLandmark::Wrist.index()].x = f32::NEG_INFINITY;
            landmarks[HandLandmark::ThumbTip.index()].y = f32::NAN;
            landmarks[HandLandmark::IndexTip.index()].x = 3.0e9;
            landmarks[HandLandmark::PinkyTip.index()] = Landmark { x: 1.5, y: -0.5, z: 0.0 };
            Ok(vec![Hand { landmarks }])
        }
    }

    struct Broken;

    impl HandDetector for Broken {
        fn detect(&mut self, _rgb: ndarray::ArrayView3<u8>) -> Result<Vec<Hand>, DetectorError> {
            Err(DetectorError::Backend("model not loaded".into()))
        }
    }

    #[test]
    fn loop_skips_missing_frames_and_stops_on_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SequenceSource::new(vec![Some(frame(4, 4)), None, Some(frame(4, 4))]);
        let mut sink = DirectorySink::new(dir.path()).unwrap().with_keys(['x', 'y']);
        let base = Config::default().detection;

        let processed = run_live(&mut source, &mut sink, &base, |f, _| Ok(webcam_step(f))).unwrap();
        assert_eq!(processed, 2);
        assert_eq!(sink.frames_shown(), 2);
        assert!(dir.path().join("webcam.png").exists());
    }

    #[test]
    fn step_errors_end_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SequenceSource::new(vec![Some(frame(4, 4))]);
        let mut sink = DirectorySink::new(dir.path()).unwrap();
        let base = Config::default().detection;
        let result = run_live(&mut source, &mut sink, &base, |_, _| {
            Err(LessonError::Frame(crate::frame::FrameError::ZeroDimensions))
        });
        assert!(result.is_err());
    }

    #[test]
    fn masking_keeps_green_only() {
        let mut data = Array3::<u8>::zeros((2, 2, 3));
        data[(0, 0, 1)] = 200;
        data[(1, 1, 2)] = 200;
        let f = Frame::from_array(data, PixelFormat::BGR8).unwrap();
        let windows = masking_step(&f, &Config::default().detection).unwrap();
        let mask = &windows[0].1;
        assert_eq!(mask.format(), PixelFormat::GRAY8);
        assert_eq!(mask.as_bytes(), &[255, 0, 0, 0]);
    }

    #[test]
    fn masking_follows_the_configured_band() {
        let yellow = Frame::from_array(Array3::from_shape_fn((2, 2, 3), |(_, _, c)| [0, 255, 255][c]), PixelFormat::BGR8)
            .unwrap();
        let mut detection = Config::default().detection;
        let windows = masking_step(&yellow, &detection).unwrap();
        assert_eq!(windows[0].1.as_bytes(), &[0, 0, 0, 0]);

        detection.color_lower = [20, 100, 100];
        detection.color_upper = [40, 255, 255];
        let windows = masking_step(&yellow, &detection).unwrap();
        assert_eq!(windows[0].1.as_bytes(), &[255, 255, 255, 255]);
    }

    #[test]
    fn color_detection_boxes_the_target_in_green() {
        let mut data = Array3::<u8>::zeros((40, 40, 3));
        for y in 10..20 {
            for x in 5..15 {
                data[(y, x, 1)] = 255;
                data[(y, x, 2)] = 255;
            }
        }
        let f = Frame::from_array(data, PixelFormat::BGR8).unwrap();
        let windows = color_detection_step(&f, &Config::default().detection).unwrap();
        let (name, shown) = &windows[0];
        assert_eq!(*name, "webcam");
        // Mirrored: columns 5..15 land on 25..35, box corner sits at (25, 10).
        assert_eq!(shown.get_pixel(25, 10), Some(&palette::GREEN.to_array()[..]));
        assert_eq!(windows[1].0, "mask");
    }

    #[test]
    fn hands_mark_index_and_middle_tips() {
        let f = frame(100, 80);
        let windows = hands_step(&f, &mut OneHand).unwrap();
        let shown = &windows[0].1;
        // Centre of each tip circle is covered by its joint dot; check the rim.
        assert_eq!(shown.get_pixel(25, 40 - 30), Some(&palette::CYAN.to_array()[..]));
        assert_eq!(shown.get_pixel(75, 40 + 30), Some(&palette::CYAN.to_array()[..]));
    }

    #[test]
    fn wild_landmarks_are_drawn_without_panicking() {
        let f = frame(64, 48);
        let windows = hands_step(&f, &mut Wild).unwrap();
        let shown = &windows[0].1;
        // The middle fingertip still gets its highlight at the frame centre.
        assert_eq!(shown.get_pixel(32, 24 - 20), Some(&palette::CYAN.to_array()[..]));
    }

    #[test]
    fn detector_failures_leave_the_frame_alone() {
        let f = frame(10, 10);
        let windows = hands_step(&f, &mut Broken).unwrap();
        assert_eq!(windows[0].1, f);
        let windows = hands_step(&f, &mut NullDetector).unwrap();
        assert_eq!(windows[0].1, f);
    }
}
