use crate::frame::Frame;
use ndarray::Array2;
use visionkit_detection::blur::{gaussian_blur_plane, FilterError};
use visionkit_detection::color::{color_limits, in_range, Bgr, ColorRange};
use visionkit_detection::contour::{find_contours, mask_bbox, ChainApprox, Contour, RetrievalMode};
use visionkit_detection::threshold::{threshold, ThresholdType};
use visionkit_detection::Rect;

// 255 where the frame's HSV value lies inside `range`.
pub fn run_color_mask(frame: &Frame, range: &ColorRange) -> Array2<u8> {
    let hsv = frame.to_hsv();
    in_range(hsv.view(), range)
}

pub struct ColorDetection {
    pub range: ColorRange,
    pub mask: Array2<u8>,
    pub bbox: Option<Rect>,
}

/// Masks everything close in hue to `target` and boxes it.
pub fn detect_color(frame: &Frame, target: Bgr) -> ColorDetection {
    let range = color_limits(target);
    let mask = run_color_mask(frame, &range);
    let bbox = mask_bbox(mask.view());
    ColorDetection { range, mask, bbox }
}

/// Contour preparation: gray, global threshold, smoothing, then tracing.
#[derive(Clone, Copy, Debug)]
pub struct ContourPipeline {
    pub thresh: u8,
    pub typ: ThresholdType,
    pub blur_size: usize,
    pub blur_sigma: f64,
    pub mode: RetrievalMode,
}

impl ContourPipeline {
    pub fn run(&self, frame: &Frame) -> Result<(Array2<u8>, Vec<Contour>), FilterError> {
        let gray = frame.to_grayscale();
        let binary = threshold(gray.plane(), self.thresh, 255, self.typ);
        let smoothed = gaussian_blur_plane(binary.view(), self.blur_size, self.blur_size, self.blur_sigma)?;
        let contours = find_contours(smoothed.view(), self.mode, ChainApprox::Simple);
        tracing::debug!(count = contours.len(), thresh = self.thresh, "contours found");
        Ok((smoothed, contours))
    }
}

// Contours whose enclosed area is strictly above `min_area`.
pub fn large_contours(contours: &[Contour], min_area: f32) -> Vec<&Contour> {
    contours.iter().filter(|c| c.area > min_area).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;
    use ndarray::{s, Array3};
    use visionkit_detection::palette;

    fn canvas_with_patch(fill: Bgr, patch: Bgr, rect: Rect) -> Frame {
        let mut data = Array3::<u8>::zeros((60, 80, 3));
        for (c, v) in fill.to_array().into_iter().enumerate() {
            data.slice_mut(s![.., .., c]).fill(v);
        }
        for (c, v) in patch.to_array().into_iter().enumerate() {
            data.slice_mut(s![
                rect.y as usize..rect.bottom() as usize,
                rect.x as usize..rect.right() as usize,
                c
            ])
            .fill(v);
        }
        Frame::from_array(data, PixelFormat::BGR8).unwrap()
    }

    #[test]
    fn yellow_patch_is_boxed() {
        let rect = Rect::new(10, 20, 30, 15);
        let frame = canvas_with_patch(palette::BLUE, palette::YELLOW, rect);
        let found = detect_color(&frame, palette::YELLOW);
        assert_eq!(found.bbox, Some(rect));
        assert_eq!(found.range.lower, [20, 100, 100]);
        assert_eq!(found.mask.iter().filter(|&&v| v == 255).count(), 30 * 15);
    }

    #[test]
    fn nothing_to_find_gives_no_box() {
        let frame = canvas_with_patch(palette::BLACK, palette::WHITE, Rect::new(0, 0, 5, 5));
        assert!(detect_color(&frame, palette::GREEN).bbox.is_none());
    }

    #[test]
    fn dark_shapes_on_light_ground_become_contours() {
        let frame = canvas_with_patch(palette::WHITE, palette::BLACK, Rect::new(20, 10, 30, 30));
        let pipeline = ContourPipeline {
            thresh: 120,
            typ: ThresholdType::BinaryInv,
            blur_size: 5,
            blur_sigma: 1.0,
            mode: RetrievalMode::External,
        };
        let (mask, contours) = pipeline.run(&frame).unwrap();
        assert_eq!(mask.dim(), (60, 80));
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_rect();
        assert!(bbox.x <= 20 && bbox.right() >= 50);
        assert_eq!(large_contours(&contours, 200.0).len(), 1);
        assert!(large_contours(&contours, 10_000.0).is_empty());
    }
}
