//! Shapes and text drawn straight into frame arrays with `imageproc`.

use crate::color::Bgr;
use crate::contour::Contour;
use crate::geometry::Rect;
pub use ab_glyph::{FontRef, InvalidFont};
use ab_glyph::PxScale;
use image::Rgb;
use imageproc::drawing::{self, Canvas};
use imageproc::point::Point;
use imageproc::rect::Rect as PixelRect;
use ndarray::ArrayViewMut3;

static DEFAULT_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Thickness {
    Stroke(u32),
    Filled,
}

// imageproc canvas over an `(height, width, channels)` array. The `Rgb`
// pixel carries channels in array order, so BGR frames take BGR colors.
// Gray images take the first channel of the color.
struct ArrayCanvas<'a, 'b> {
    img: &'a mut ArrayViewMut3<'b, u8>,
}

impl Canvas for ArrayCanvas<'_, '_> {
    type Pixel = Rgb<u8>;

    fn dimensions(&self) -> (u32, u32) {
        let (height, width, _) = self.img.dim();
        (width as u32, height as u32)
    }

    fn get_pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        let last = self.img.dim().2 - 1;
        let (x, y) = (x as usize, y as usize);
        Rgb(std::array::from_fn(|ch| self.img[(y, x, ch.min(last))]))
    }

    fn draw_pixel(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        let channels = self.img.dim().2;
        for ch in 0..channels {
            self.img[(y as usize, x as usize, ch)] = color.0[ch % 3];
        }
    }
}

fn pixel(color: Bgr) -> Rgb<u8> {
    Rgb(color.to_array())
}

// Inclusive corners, clipped to the canvas before imageproc sees them.
fn fill_rect(canvas: &mut ArrayCanvas, left: i64, top: i64, right: i64, bottom: i64, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    let (left, top) = (left.max(0), top.max(0));
    let right = right.min(i64::from(width) - 1);
    let bottom = bottom.min(i64::from(height) - 1);
    if left > right || top > bottom {
        return;
    }
    let rect = PixelRect::at(left as i32, top as i32)
        .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
    drawing::draw_filled_rect_mut(canvas, rect, color);
}

// imageproc rejects polygons that repeat their first point at the end.
fn fill_polygon(canvas: &mut ArrayCanvas, points: &[(i32, i32)], color: Rgb<u8>) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x, y);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    match poly.as_slice() {
        [] => {}
        [p] => {
            let (x, y) = (i64::from(p.x), i64::from(p.y));
            fill_rect(canvas, x, y, x, y, color);
        }
        _ => drawing::draw_polygon_mut(canvas, &poly, color),
    }
}

// Liang-Barsky: the part of the segment inside `[min, max]` on both axes.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

// A wide segment is a quad between two round caps.
fn thick_segment(canvas: &mut ArrayCanvas, a: (f64, f64), b: (f64, f64), thickness: u32, color: Rgb<u8>) {
    let half = f64::from(thickness) / 2.0;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    if len >= 1.0 {
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let corners = [
            (a.0 + nx, a.1 + ny),
            (b.0 + nx, b.1 + ny),
            (b.0 - nx, b.1 - ny),
            (a.0 - nx, a.1 - ny),
        ]
        .map(|(x, y)| (x.round() as i32, y.round() as i32));
        fill_polygon(canvas, &corners, color);
    }
    let cap = (thickness / 2) as i32;
    for end in [a, b] {
        drawing::draw_filled_circle_mut(canvas, (end.0.round() as i32, end.1.round() as i32), cap, color);
    }
}

/// Line between two points, widened with round caps.
///
/// The segment is clipped to the image first, so far-away endpoints cost
/// nothing extra.
pub fn draw_line(
    img: &mut ArrayViewMut3<u8>,
    from: (i32, i32),
    to: (i32, i32),
    color: Bgr,
    thickness: u32,
) {
    let (height, width, _) = img.dim();
    let margin = f64::from(thickness.max(1));
    let Some((a, b)) = clip_segment(
        (f64::from(from.0), f64::from(from.1)),
        (f64::from(to.0), f64::from(to.1)),
        (-margin, -margin),
        (width as f64 - 1.0 + margin, height as f64 - 1.0 + margin),
    ) else {
        return;
    };

    let mut canvas = ArrayCanvas { img };
    if thickness <= 1 {
        drawing::draw_line_segment_mut(
            &mut canvas,
            (a.0 as f32, a.1 as f32),
            (b.0 as f32, b.1 as f32),
            pixel(color),
        );
    } else {
        thick_segment(&mut canvas, a, b, thickness, pixel(color));
    }
}

/// Rectangle with corners `pt1` and `pt2`, both inclusive.
///
/// Strokes are centered on the edges; corners stay square.
pub fn draw_rectangle(
    img: &mut ArrayViewMut3<u8>,
    pt1: (i32, i32),
    pt2: (i32, i32),
    color: Bgr,
    thickness: Thickness,
) {
    let (left, right) = (i64::from(pt1.0.min(pt2.0)), i64::from(pt1.0.max(pt2.0)));
    let (top, bottom) = (i64::from(pt1.1.min(pt2.1)), i64::from(pt1.1.max(pt2.1)));
    let color = pixel(color);
    let mut canvas = ArrayCanvas { img };
    match thickness {
        Thickness::Filled => fill_rect(&mut canvas, left, top, right, bottom, color),
        Thickness::Stroke(t) => {
            let t = i64::from(t.max(1));
            let (outer, inner) = (t / 2, (t - 1) / 2);
            fill_rect(&mut canvas, left - outer, top - outer, right + outer, top + inner, color);
            fill_rect(&mut canvas, left - outer, bottom - inner, right + outer, bottom + outer, color);
            fill_rect(&mut canvas, left - outer, top, left + inner, bottom, color);
            fill_rect(&mut canvas, right - inner, top, right + outer, bottom, color);
        }
    }
}

/// Outlines `rect`, whose right and bottom edges are exclusive.
pub fn draw_rect(img: &mut ArrayViewMut3<u8>, rect: Rect, color: Bgr, thickness: Thickness) {
    if rect.is_empty() {
        return;
    }
    draw_rectangle(
        img,
        (rect.x as i32, rect.y as i32),
        (rect.right() as i32 - 1, rect.bottom() as i32 - 1),
        color,
        thickness,
    );
}

pub fn draw_circle(
    img: &mut ArrayViewMut3<u8>,
    center: (i32, i32),
    radius: u32,
    color: Bgr,
    thickness: Thickness,
) {
    let r = radius.min(i32::MAX as u32 / 4) as i32;
    let (inner, outer) = match thickness {
        Thickness::Filled => (0, r),
        Thickness::Stroke(t) => {
            let t = t.max(1).min(r as u32 + 1) as i32;
            ((r - (t - 1) / 2).max(0), r + t / 2)
        }
    };

    let (height, width, _) = img.dim();
    let (cx, cy) = (i64::from(center.0), i64::from(center.1));
    let reach = i64::from(outer);
    if cx + reach < 0 || cy + reach < 0 || cx - reach >= width as i64 || cy - reach >= height as i64 {
        return;
    }

    let color = pixel(color);
    let mut canvas = ArrayCanvas { img };
    match thickness {
        Thickness::Filled if r == 0 => fill_rect(&mut canvas, cx, cy, cx, cy, color),
        Thickness::Filled => drawing::draw_filled_circle_mut(&mut canvas, center, r, color),
        Thickness::Stroke(_) => {
            for rr in inner..=outer {
                drawing::draw_hollow_circle_mut(&mut canvas, center, rr, color);
            }
        }
    }
}

pub fn draw_polyline(
    img: &mut ArrayViewMut3<u8>,
    points: &[(i32, i32)],
    closed: bool,
    color: Bgr,
    thickness: u32,
) {
    match points {
        [] => {}
        [only] => draw_circle(img, *only, thickness / 2, color, Thickness::Filled),
        _ => {
            for pair in points.windows(2) {
                draw_line(img, pair[0], pair[1], color, thickness);
            }
            if closed {
                if let (Some(&last), Some(&first)) = (points.last(), points.first()) {
                    draw_line(img, last, first, color, thickness);
                }
            }
        }
    }
}

pub fn draw_contours(img: &mut ArrayViewMut3<u8>, contours: &[Contour], color: Bgr, thickness: Thickness) {
    for contour in contours {
        match thickness {
            Thickness::Filled => fill_polygon(&mut ArrayCanvas { img: &mut *img }, &contour.points, pixel(color)),
            Thickness::Stroke(t) => draw_polyline(img, &contour.points, true, color, t),
        }
    }
}

/// The bundled sans-serif face used for captions.
pub fn default_font() -> Result<FontRef<'static>, InvalidFont> {
    FontRef::try_from_slice(DEFAULT_FONT)
}

/// Writes `text` with its baseline-left corner at `origin`, glyphs `height` pixels tall.
pub fn draw_text(
    img: &mut ArrayViewMut3<u8>,
    text: &str,
    origin: (i32, i32),
    height: f32,
    color: Bgr,
    font: &FontRef<'_>,
) {
    let scale = PxScale::from(height);
    let (_, text_height) = drawing::text_size(scale, font, text);
    let top = origin.1.saturating_sub(text_height as i32);
    drawing::draw_text_mut(&mut ArrayCanvas { img }, pixel(color), origin.0, top, scale, font, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette;
    use ndarray::Array3;

    fn count(img: &Array3<u8>, color: Bgr) -> usize {
        let (h, w, _) = img.dim();
        let c = color.to_array();
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (y, x)))
            .filter(|&(y, x)| (0..3).all(|ch| img[(y, x, ch)] == c[ch]))
            .count()
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut img = Array3::<u8>::zeros((10, 10, 3));
        draw_line(&mut img.view_mut(), (1, 1), (8, 5), palette::MAGENTA, 1);
        assert_eq!(img[(1, 1, 0)], 255);
        assert_eq!(img[(5, 8, 2)], 255);
        assert_eq!(count(&img, palette::MAGENTA), 8);
    }

    #[test]
    fn thick_lines_cover_their_width() {
        let mut img = Array3::<u8>::zeros((20, 20, 3));
        draw_line(&mut img.view_mut(), (2, 10), (17, 10), palette::GREEN, 6);
        assert_eq!(img[(8, 10, 1)], 255);
        assert_eq!(img[(12, 10, 1)], 255);
        assert_eq!(img[(3, 10, 1)], 0);
    }

    #[test]
    fn filled_rectangle_is_inclusive() {
        let mut img = Array3::<u8>::zeros((10, 10, 3));
        draw_rectangle(&mut img.view_mut(), (2, 3), (4, 5), palette::RED, Thickness::Filled);
        assert_eq!(count(&img, palette::RED), 9);
    }

    #[test]
    fn stroked_rect_leaves_inside_empty() {
        let mut img = Array3::<u8>::zeros((10, 10, 3));
        draw_rect(&mut img.view_mut(), Rect::new(1, 1, 5, 5), palette::GREEN, Thickness::Stroke(1));
        assert_eq!(count(&img, palette::GREEN), 16);
        assert_eq!(img[(3, 3, 1)], 0);
    }

    #[test]
    fn drawing_clips_at_edges() {
        let mut img = Array3::<u8>::zeros((5, 5, 3));
        draw_circle(&mut img.view_mut(), (0, 0), 3, palette::BLUE, Thickness::Filled);
        draw_line(&mut img.view_mut(), (-10, 2), (20, 2), palette::BLUE, 1);
        assert_eq!(img[(0, 0, 0)], 255);
        assert_eq!(img[(2, 4, 0)], 255);
    }

    #[test]
    fn far_away_endpoints_are_clipped() {
        let mut img = Array3::<u8>::zeros((8, 8, 3));
        draw_line(&mut img.view_mut(), (i32::MIN, 4), (i32::MAX, 4), palette::WHITE, 2);
        draw_line(&mut img.view_mut(), (i32::MIN, i32::MIN), (i32::MIN, i32::MAX), palette::RED, 3);
        draw_circle(&mut img.view_mut(), (i32::MAX, 0), 40, palette::RED, Thickness::Filled);
        assert_eq!(img[(4, 0, 0)], 255);
        assert_eq!(img[(4, 7, 2)], 255);
        assert_eq!(count(&img, palette::RED), 0);
    }

    #[test]
    fn filled_contour_paints_interior() {
        let square = Contour::new(vec![(1, 1), (6, 1), (6, 6), (1, 6)], false);
        let mut img = Array3::<u8>::zeros((8, 8, 3));
        draw_contours(&mut img.view_mut(), &[square], palette::YELLOW, Thickness::Filled);
        assert_eq!(count(&img, palette::YELLOW), 36);
    }

    #[test]
    fn gray_images_take_first_channel() {
        let mut img = Array3::<u8>::zeros((3, 3, 1));
        draw_circle(&mut img.view_mut(), (1, 1), 0, Bgr::new(200, 0, 0), Thickness::Filled);
        assert_eq!(img[(1, 1, 0)], 200);
    }

    #[test]
    fn text_darkens_pixels_above_the_origin() {
        let font = default_font().unwrap();
        let mut img = Array3::<u8>::from_elem((60, 200, 3), 255);
        draw_text(&mut img.view_mut(), "This is a text", (5, 50), 30.0, palette::BLACK, &font);
        let dark = img
            .indexed_iter()
            .filter(|&((y, _, _), &v)| v < 100 && y < 55)
            .count();
        assert!(dark > 0);
        assert!(img.slice(ndarray::s![..5, .., ..]).iter().all(|&v| v == 255));
    }
}
