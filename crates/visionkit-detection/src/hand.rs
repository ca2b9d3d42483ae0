//! Hand landmarks as produced by an external pose model.
//!
//! The model itself is not part of this crate. Anything that can turn an RGB
//! frame into [`Hand`]s plugs in through [`HandDetector`].

use crate::color::Bgr;
use crate::draw::{draw_circle, draw_line, Thickness};
use ndarray::{ArrayView3, ArrayViewMut3};
use thiserror::Error;

pub const LANDMARK_COUNT: usize = 21;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bones of the hand skeleton as landmark index pairs.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

/// Point normalized to the frame: `x`, `y` in `0.0..=1.0`, `z` relative depth.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

// Landmarks further than this from the frame, in frame sizes, are noise.
const LANDMARK_REACH: f32 = 1.0;

impl Landmark {
    /// Truncates like an integer cast; points just outside the frame stay outside.
    ///
    /// `None` for coordinates that are not finite or lie more than a frame
    /// size beyond any edge.
    pub fn to_pixel(&self, width: u32, height: u32) -> Option<(i32, i32)> {
        let plausible = |v: f32| v.is_finite() && (-LANDMARK_REACH..=1.0 + LANDMARK_REACH).contains(&v);
        if !plausible(self.x) || !plausible(self.y) {
            return None;
        }
        Some(((self.x * width as f32) as i32, (self.y * height as f32) as i32))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl Hand {
    pub fn landmark(&self, which: HandLandmark) -> Landmark {
        self.landmarks[which.index()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandmarkPosition {
    pub id: usize,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Hand detector expects 3-channel RGB input, got {channels} channels")]
    UnsupportedChannels { channels: usize },

    #[error("Hand detector backend failed: {0}")]
    Backend(String),
}

pub trait HandDetector {
    /// Finds zero or more hands in an RGB frame laid out `(height, width, 3)`.
    fn detect(&mut self, rgb: ArrayView3<u8>) -> Result<Vec<Hand>, DetectorError>;
}

/// Detector for setups without a model: never sees a hand.
#[derive(Debug, Default)]
pub struct NullDetector;

impl HandDetector for NullDetector {
    fn detect(&mut self, rgb: ArrayView3<u8>) -> Result<Vec<Hand>, DetectorError> {
        let channels = rgb.dim().2;
        if channels != 3 {
            return Err(DetectorError::UnsupportedChannels { channels });
        }
        Ok(Vec::new())
    }
}

/// Pixel positions of the requested landmark ids.
///
/// Unknown ids and landmarks without a usable position are skipped.
pub fn landmark_positions(hand: &Hand, ids: &[usize], width: u32, height: u32) -> Vec<LandmarkPosition> {
    ids.iter()
        .filter_map(|&id| {
            let (x, y) = hand.landmarks.get(id)?.to_pixel(width, height)?;
            Some(LandmarkPosition { id, x, y })
        })
        .collect()
}

/// Draws the skeleton: bones as lines, joints as small dots.
///
/// Bones touching an unusable landmark are left out.
pub fn draw_hand(img: &mut ArrayViewMut3<u8>, hand: &Hand, joint: Bgr, bone: Bgr) {
    let (height, width, _) = img.dim();
    let px: Vec<Option<(i32, i32)>> = hand
        .landmarks
        .iter()
        .map(|lm| lm.to_pixel(width as u32, height as u32))
        .collect();
    for &(a, b) in HAND_CONNECTIONS.iter() {
        if let (Some(from), Some(to)) = (px[a], px[b]) {
            draw_line(img, from, to, bone, 2);
        }
    }
    for p in px.into_iter().flatten() {
        draw_circle(img, p, 3, joint, Thickness::Filled);
    }
}
