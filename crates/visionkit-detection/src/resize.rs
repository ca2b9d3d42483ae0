use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
    /// Pixel-area averaging. Best for shrinking; enlarging falls back to `Linear`.
    Area,
}

fn resize_nearest(src: ArrayView2<u8>, width: usize, height: usize) -> Array2<u8> {
    let (src_h, src_w) = src.dim();
    let sx = src_w as f32 / width as f32;
    let sy = src_h as f32 / height as f32;
    Array2::from_shape_fn((height, width), |(y, x)| {
        let ix = ((x as f32 * sx) as usize).min(src_w - 1);
        let iy = ((y as f32 * sy) as usize).min(src_h - 1);
        src[(iy, ix)]
    })
}

fn resize_linear(src: ArrayView2<u8>, width: usize, height: usize) -> Array2<u8> {
    let (src_h, src_w) = src.dim();
    let sx = src_w as f32 / width as f32;
    let sy = src_h as f32 / height as f32;

    // Pixel centers line up: dst (x + 0.5) maps to src (x + 0.5) * scale.
    let sample = |pos: f32, len: usize| -> (usize, usize, f32) {
        let p = pos.max(0.0);
        let i0 = (p.floor() as usize).min(len - 1);
        let i1 = (i0 + 1).min(len - 1);
        (i0, i1, p - i0 as f32)
    };

    Array2::from_shape_fn((height, width), |(y, x)| {
        let (x0, x1, fx) = sample((x as f32 + 0.5) * sx - 0.5, src_w);
        let (y0, y1, fy) = sample((y as f32 + 0.5) * sy - 0.5, src_h);
        let fx = fx.clamp(0.0, 1.0);
        let fy = fy.clamp(0.0, 1.0);
        let top = src[(y0, x0)] as f32 * (1.0 - fx) + src[(y0, x1)] as f32 * fx;
        let bottom = src[(y1, x0)] as f32 * (1.0 - fx) + src[(y1, x1)] as f32 * fx;
        (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
    })
}

// Weighted mean of the source pixels covered by each destination cell.
fn resize_area(src: ArrayView2<u8>, width: usize, height: usize) -> Array2<u8> {
    let (src_h, src_w) = src.dim();
    let sx = src_w as f64 / width as f64;
    let sy = src_h as f64 / height as f64;

    let spans = |start: f64, end: f64, len: usize| -> Vec<(usize, f64)> {
        let mut out = Vec::new();
        let mut i = start.floor() as usize;
        while (i as f64) < end && i < len {
            let lo = start.max(i as f64);
            let hi = end.min(i as f64 + 1.0);
            if hi > lo {
                out.push((i, hi - lo));
            }
            i += 1;
        }
        out
    };

    let columns: Vec<Vec<(usize, f64)>> = (0..width)
        .map(|x| spans(x as f64 * sx, (x + 1) as f64 * sx, src_w))
        .collect();

    Array2::from_shape_fn((height, width), |(y, x)| {
        let rows = spans(y as f64 * sy, (y + 1) as f64 * sy, src_h);
        let mut acc = 0.0;
        let mut total = 0.0;
        for &(iy, wy) in &rows {
            for &(ix, wx) in &columns[x] {
                let w = wx * wy;
                acc += src[(iy, ix)] as f64 * w;
                total += w;
            }
        }
        if total == 0.0 {
            0
        } else {
            (acc / total).round().clamp(0.0, 255.0) as u8
        }
    })
}

/// Resizes one plane to `width` x `height`.
///
/// A zero target dimension or empty source gives an empty plane.
pub fn resize_plane(src: ArrayView2<u8>, width: usize, height: usize, interp: Interpolation) -> Array2<u8> {
    let (src_h, src_w) = src.dim();
    if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
        return Array2::zeros((height, width));
    }
    if (src_w, src_h) == (width, height) {
        return src.to_owned();
    }
    match interp {
        Interpolation::Nearest => resize_nearest(src, width, height),
        Interpolation::Linear => resize_linear(src, width, height),
        Interpolation::Area if width <= src_w && height <= src_h => resize_area(src, width, height),
        Interpolation::Area => resize_linear(src, width, height),
    }
}

pub fn resize(src: ArrayView3<u8>, width: usize, height: usize, interp: Interpolation) -> Array3<u8> {
    let channels = src.dim().2;
    if channels == 0 {
        return Array3::zeros((height, width, 0));
    }
    let (src_h, src_w, _) = src.dim();
    if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
        return Array3::zeros((height, width, channels));
    }
    let mut out = Array3::<u8>::zeros((height, width, channels));
    for (c, plane) in src.axis_iter(Axis(2)).enumerate() {
        out.index_axis_mut(Axis(2), c)
            .assign(&resize_plane(plane, width, height, interp));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn area_shrink_averages_blocks() {
        let src = array![
            [0u8, 100, 200, 200],
            [100, 200, 200, 200],
        ];
        let out = resize_plane(src.view(), 2, 1, Interpolation::Area);
        assert_eq!(out, array![[100u8, 200]]);
    }

    #[test]
    fn area_handles_fractional_coverage() {
        let src = array![[0u8, 90, 180]];
        let out = resize_plane(src.view(), 2, 1, Interpolation::Area);
        // Each output covers 1.5 source pixels.
        assert_eq!(out, array![[30u8, 150]]);
    }

    #[test]
    fn nearest_enlarge_repeats_pixels() {
        let src = array![[1u8, 2], [3, 4]];
        let out = resize_plane(src.view(), 4, 4, Interpolation::Nearest);
        assert_eq!(out.row(0).to_vec(), vec![1, 1, 2, 2]);
        assert_eq!(out.row(3).to_vec(), vec![3, 3, 4, 4]);
    }

    #[test]
    fn linear_keeps_constant_images() {
        let src = Array2::<u8>::from_elem((5, 7), 42);
        let out = resize_plane(src.view(), 13, 3, Interpolation::Linear);
        assert_eq!(out.dim(), (3, 13));
        assert!(out.iter().all(|&v| v == 42));
    }

    #[test]
    fn color_resize_keeps_channels() {
        let src = Array3::<u8>::from_elem((10, 20, 3), 9);
        let out = resize(src.view(), 650, 650, Interpolation::Area);
        assert_eq!(out.dim(), (650, 650, 3));
        assert!(out.iter().all(|&v| v == 9));
    }
}
