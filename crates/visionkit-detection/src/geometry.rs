/// Axis-aligned rectangle in pixel coordinates. `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    // Builds a rect from two corners; `x2`/`y2` are exclusive.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        Self::new(left, top, right - left, bottom - top)
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the rect lies entirely inside a `width` x `height` image.
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x <= width
            && self.y <= height
            && self.width <= width - self.x
            && self.height <= height - self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalized() {
        let r = Rect::from_corners(40, 30, 10, 5);
        assert_eq!(r, Rect::new(10, 5, 30, 25));
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 30);
    }

    #[test]
    fn fits_within_rejects_overflowing_rects() {
        assert!(Rect::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(!Rect::new(5, 0, 6, 10).fits_within(10, 10));
        assert!(!Rect::new(11, 0, 0, 0).fits_within(10, 10));
    }
}
