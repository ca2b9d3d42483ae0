//! Named colors in BGR channel order, the order frames use after decoding.

use crate::color::Bgr;

pub const BLACK: Bgr = Bgr::new(0, 0, 0);
pub const WHITE: Bgr = Bgr::new(255, 255, 255);
pub const RED: Bgr = Bgr::new(0, 0, 255);
pub const GREEN: Bgr = Bgr::new(0, 255, 0);
pub const BLUE: Bgr = Bgr::new(255, 0, 0);
pub const YELLOW: Bgr = Bgr::new(0, 255, 255);
pub const CYAN: Bgr = Bgr::new(255, 255, 0);
pub const MAGENTA: Bgr = Bgr::new(255, 0, 255);
pub const ORANGE: Bgr = Bgr::new(0, 165, 255);
