use ndarray::{Array2, ArrayView3};

/// Hue is stored in half-degrees so it fits a byte: the circle spans `0..180`.
pub const HUE_RANGE: u8 = 180;

const HUE_HALF_WINDOW: u8 = 10;
const HUE_HIGH_EDGE: u8 = 165;
const HUE_LOW_EDGE: u8 = 15;
const SAT_FLOOR: u8 = 100;
const VAL_FLOOR: u8 = 100;

/// A color sample in the device channel order (blue, green, red).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bgr {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

impl From<[u8; 3]> for Bgr {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Inclusive HSV bounds, `[h, s, v]` each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn in_range(&self, h: u8, s: u8, v: u8) -> bool {
        h >= self.lower[0]
            && h <= self.upper[0]
            && s >= self.lower[1]
            && s <= self.upper[1]
            && v >= self.lower[2]
            && v <= self.upper[2]
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.in_range(hsv[0], hsv[1], hsv[2])
    }
}

// 8-bit HSV is computed in fixed point with this many fractional bits.
const HSV_SHIFT: u32 = 12;

// Reciprocal tables as rounded fixed-point integers. Rounding is half to even,
// which makes exact ties such as hue 2.5 come out as 2.
fn sat_divisor(v: i32) -> i32 {
    if v == 0 {
        return 0;
    }
    (f64::from(255 << HSV_SHIFT) / f64::from(v)).round_ties_even() as i32
}

fn hue_divisor(diff: i32) -> i32 {
    if diff == 0 {
        return 0;
    }
    (f64::from((HUE_RANGE as i32) << HSV_SHIFT) / (6.0 * f64::from(diff))).round_ties_even() as i32
}

/// Converts a BGR sample to `[h, s, v]` with h in `0..180` and s, v in `0..=255`.
///
/// Integer arithmetic throughout, so results match the usual 8-bit
/// BGR-to-HSV conversion bit for bit.
pub fn bgr_to_hsv(color: Bgr) -> [u8; 3] {
    let (b, g, r) = (i32::from(color.b), i32::from(color.g), i32::from(color.r));
    let half = 1 << (HSV_SHIFT - 1);

    let v = b.max(g).max(r);
    let diff = v - b.min(g).min(r);
    let s = (diff * sat_divisor(v) + half) >> HSV_SHIFT;

    // Red wins ties with green, green wins ties with blue.
    let sector = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (sector * hue_divisor(diff) + half) >> HSV_SHIFT;
    if h < 0 {
        h += HUE_RANGE as i32;
    }

    [h as u8, s as u8, v as u8]
}

/// Inverse of [`bgr_to_hsv`], up to rounding.
pub fn hsv_to_bgr(h: u8, s: u8, v: u8) -> Bgr {
    let h = (h % HUE_RANGE) as f32 * 2.0;
    let s = s as f32 / 255.0;
    let v = v as f32 / 255.0;

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h as i32) / 60 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Bgr::new(to_byte(b), to_byte(g), to_byte(r))
}

/// Lower and upper hue bounds for a `+/-10` window around `hue`.
///
/// The window is clamped at both ends of the hue circle instead of wrapping:
/// hues at or above 165 get an upper bound of 180, hues at or below 15 get a
/// lower bound of 0. Reds that straddle the seam therefore lose the part of
/// their window on the far side.
pub fn hue_bounds(hue: u8) -> (u8, u8) {
    if hue >= HUE_HIGH_EDGE {
        (hue - HUE_HALF_WINDOW, HUE_RANGE)
    } else if hue <= HUE_LOW_EDGE {
        (0, hue + HUE_HALF_WINDOW)
    } else {
        (hue - HUE_HALF_WINDOW, hue + HUE_HALF_WINDOW)
    }
}

/// HSV range for masking pixels that look like `color`.
///
/// Saturation and value are fixed to `100..=255`; only the hue follows the
/// sample, see [`hue_bounds`].
pub fn color_limits(color: Bgr) -> ColorRange {
    let [hue, _, _] = bgr_to_hsv(color);
    let (low, high) = hue_bounds(hue);
    ColorRange {
        lower: [low, SAT_FLOOR, VAL_FLOOR],
        upper: [high, 255, 255],
    }
}

/// Binary mask of an HSV image: 255 where the pixel lies inside `range`, 0 elsewhere.
pub fn in_range(hsv: ArrayView3<u8>, range: &ColorRange) -> Array2<u8> {
    let (height, width, _) = hsv.dim();
    Array2::from_shape_fn((height, width), |(y, x)| {
        let px = [hsv[(y, x, 0)], hsv[(y, x, 1)], hsv[(y, x, 2)]];
        if range.contains(px) {
            255
        } else {
            0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette;
    use ndarray::Array3;

    fn hues(range: &ColorRange) -> (u8, u8) {
        (range.lower[0], range.upper[0])
    }

    #[test]
    fn primaries_map_to_half_degree_hues() {
        assert_eq!(bgr_to_hsv(palette::RED), [0, 255, 255]);
        assert_eq!(bgr_to_hsv(palette::YELLOW), [30, 255, 255]);
        assert_eq!(bgr_to_hsv(palette::GREEN), [60, 255, 255]);
        assert_eq!(bgr_to_hsv(palette::CYAN), [90, 255, 255]);
        assert_eq!(bgr_to_hsv(palette::BLUE), [120, 255, 255]);
        assert_eq!(bgr_to_hsv(palette::MAGENTA), [150, 255, 255]);
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(bgr_to_hsv(palette::BLACK), [0, 0, 0]);
        assert_eq!(bgr_to_hsv(Bgr::new(128, 128, 128)), [0, 0, 128]);
        assert_eq!(bgr_to_hsv(palette::WHITE), [0, 0, 255]);
    }

    #[test]
    fn hue_just_below_red_wraps_to_top_of_circle() {
        // r is max, b slightly above g: negative hue folds back near 180.
        let [h, _, _] = bgr_to_hsv(Bgr::new(40, 0, 255));
        assert_eq!(h, 175);
    }

    #[test]
    fn exact_hue_ties_round_down() {
        // 30 * 3 / 36 = 2.5 and 30 * 9 / 36 = 7.5 both land on the lower hue.
        assert_eq!(bgr_to_hsv(Bgr::new(0, 3, 36))[0], 2);
        assert_eq!(bgr_to_hsv(Bgr::new(0, 9, 36))[0], 7);
        assert_eq!(bgr_to_hsv(Bgr::new(0, 10, 200))[0], 1);
        assert_eq!(hues(&color_limits(Bgr::new(0, 3, 36))), (0, 12));
    }

    #[test]
    fn saturation_is_scaled_by_value() {
        assert_eq!(bgr_to_hsv(Bgr::new(0, 3, 36)), [2, 255, 36]);
        assert_eq!(bgr_to_hsv(Bgr::new(100, 100, 200)), [0, 127, 200]);
    }

    #[test]
    fn middle_hues_get_symmetric_window() {
        for h in 16..=164u8 {
            assert_eq!(hue_bounds(h), (h - 10, h + 10), "hue {h}");
        }
    }

    #[test]
    fn edge_hues_clamp_instead_of_wrapping() {
        assert_eq!(hue_bounds(0), (0, 10));
        assert_eq!(hue_bounds(15), (0, 25));
        assert_eq!(hue_bounds(16), (6, 26));
        assert_eq!(hue_bounds(165), (155, 180));
        assert_eq!(hue_bounds(179), (169, 180));
    }

    #[test]
    fn bounds_are_ordered_and_on_the_circle() {
        for h in 0..HUE_RANGE {
            let (low, high) = hue_bounds(h);
            assert!(low <= high, "hue {h}");
            assert!(high <= HUE_RANGE, "hue {h}");
        }
    }

    #[test]
    fn limits_fix_saturation_and_value_bands() {
        let range = color_limits(palette::YELLOW);
        assert_eq!(range.lower, [20, 100, 100]);
        assert_eq!(range.upper, [40, 255, 255]);
        assert_eq!(hues(&color_limits(palette::RED)), (0, 10));
        assert_eq!(hues(&color_limits(palette::MAGENTA)), (140, 160));
    }

    #[test]
    fn limits_are_repeatable() {
        let sample = Bgr::new(12, 200, 77);
        assert_eq!(color_limits(sample), color_limits(sample));
    }

    #[test]
    fn hsv_round_trips_primaries() {
        for c in [palette::RED, palette::GREEN, palette::BLUE, palette::YELLOW] {
            let [h, s, v] = bgr_to_hsv(c);
            assert_eq!(hsv_to_bgr(h, s, v), c);
        }
    }

    #[test]
    fn in_range_marks_matching_pixels() {
        let mut hsv = Array3::<u8>::zeros((1, 3, 3));
        for (x, px) in [[30u8, 200, 200], [30, 50, 200], [90, 200, 200]]
            .iter()
            .enumerate()
        {
            for c in 0..3 {
                hsv[(0, x, c)] = px[c];
            }
        }
        let mask = in_range(hsv.view(), &color_limits(palette::YELLOW));
        assert_eq!(mask.row(0).to_vec(), vec![255, 0, 0]);
    }
}
