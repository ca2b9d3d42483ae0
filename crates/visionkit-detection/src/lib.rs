//! Pixel-level building blocks for the visionkit lessons.
//!
//! Everything here works on `ndarray` views laid out `(height, width)` for
//! single planes and `(height, width, channels)` for color images.

pub mod blur;
pub mod color;
pub mod contour;
pub mod draw;
pub mod geometry;
pub mod hand;
pub mod palette;
pub mod resize;
pub mod threshold;

pub use color::{color_limits, hue_bounds, Bgr, ColorRange};
pub use geometry::Rect;
