use super::{LessonError, Windows};
use crate::detection::{large_contours, ContourPipeline};
use crate::frame::{Frame, PixelFormat};
use visionkit_detection::blur::{box_blur, gaussian_blur, median_blur, median_blur_plane};
use visionkit_detection::contour::RetrievalMode;
use visionkit_detection::draw::{
    default_font, draw_circle, draw_contours, draw_line, draw_rect, draw_rectangle, draw_text,
    Thickness,
};
use visionkit_detection::palette;
use visionkit_detection::resize::Interpolation;
use visionkit_detection::threshold::{adaptive_threshold, threshold, AdaptiveMethod, ThresholdType};
use visionkit_detection::Rect;

/// Rows 200..300, columns 100..500.
pub const CROP_REGION: Rect = Rect::new(100, 200, 400, 100);

const RESIZE_TARGET: (u32, u32) = (650, 650);
const RESCALE_FACTOR: f32 = 0.75;
const BLUR_KERNEL: usize = 7;
const GAUSSIAN_SIGMA: f64 = 10.0;
const MEDIAN_KERNEL: usize = 7;
const ADAPTIVE_BLOCK: usize = 21;
const ADAPTIVE_C: f32 = 30.0;
const OUTLINE: u32 = 3;
const CAPTION: &str = "This is a text";
const CAPTION_HEIGHT: f32 = 44.0;

pub fn images_step(image: &Frame) -> Windows {
    vec![("Cat1", image.clone())]
}

pub fn crop_step(image: &Frame) -> Result<Windows, LessonError> {
    tracing::info!(
        height = image.height(),
        width = image.width(),
        channels = image.format().bytes_per_pixel(),
        "image shape"
    );
    let cropped = image.crop(CROP_REGION)?;
    Ok(vec![("Original Image", image.clone()), ("Cropped Image", cropped)])
}

pub fn resize_step(image: &Frame) -> Result<Windows, LessonError> {
    let (w, h) = RESIZE_TARGET;
    let resized = image.resize(w, h, Interpolation::Linear)?;
    let rescaled = image.rescale(RESCALE_FACTOR)?;
    tracing::info!(
        original = ?(image.width(), image.height()),
        resized = ?(resized.width(), resized.height()),
        rescaled = ?(rescaled.width(), rescaled.height()),
        "image shapes"
    );
    Ok(vec![
        ("Original Image", image.clone()),
        ("Resized Image", resized),
        ("Rescaled Image", rescaled),
    ])
}

pub fn blur_step(image: &Frame) -> Result<Windows, LessonError> {
    let view = image.view();
    let simple = image.with_data(box_blur(view, BLUR_KERNEL, BLUR_KERNEL)?)?;
    let gaussian = image.with_data(gaussian_blur(view, BLUR_KERNEL, BLUR_KERNEL, GAUSSIAN_SIGMA)?)?;
    let median = image.with_data(median_blur(view, MEDIAN_KERNEL)?)?;
    Ok(vec![
        ("Simple Blur", simple),
        ("Gaussian Blur", gaussian),
        ("Median Blur", median),
    ])
}

// RGB and HSV bytes are shown as if they were BGR, so red and blue trade
// places and HSV shows up in false colors.
pub fn color_space_step(image: &Frame) -> Result<Windows, LessonError> {
    Ok(vec![
        ("Original (BGR)", image.to_bgr8()),
        ("RGB Image", image.to_rgb8().reinterpret(PixelFormat::BGR8)?),
        ("Grayscale Image", image.to_grayscale()),
        ("HSV Image", image.to_hsv().reinterpret(PixelFormat::BGR8)?),
    ])
}

pub fn threshold_step(image: &Frame, thresh: u8) -> Result<Windows, LessonError> {
    let gray = image.to_grayscale();
    let binary = threshold(gray.plane(), thresh, 255, ThresholdType::Binary);
    let cleaned = median_blur_plane(binary.view(), MEDIAN_KERNEL)?;
    Ok(vec![
        ("Thresholded Image", Frame::from_plane(binary)?),
        ("Blurred Image", Frame::from_plane(cleaned)?),
    ])
}

pub fn adaptive_threshold_step(image: &Frame) -> Result<Windows, LessonError> {
    let gray = image.to_grayscale();
    let binary = adaptive_threshold(
        gray.plane(),
        255,
        AdaptiveMethod::GaussianC,
        ThresholdType::Binary,
        ADAPTIVE_BLOCK,
        ADAPTIVE_C,
    )?;
    Ok(vec![("Thresholded Image", Frame::from_plane(binary)?)])
}

// Shapes on a half-size copy of the board.
pub fn drawing_step(image: &Frame) -> Result<Windows, LessonError> {
    let mut board = image
        .to_bgr8()
        .resize(image.width() / 2, image.height() / 2, Interpolation::Linear)?;
    tracing::info!(width = board.width(), height = board.height(), "board shape");
    {
        let mut canvas = board.view_mut();
        draw_line(&mut canvas, (500, 300), (1000, 500), palette::MAGENTA, 6);
        draw_rectangle(&mut canvas, (200, 300), (300, 450), palette::RED, Thickness::Filled);
        draw_circle(&mut canvas, (400, 400), 30, palette::BLUE, Thickness::Filled);
        draw_text(&mut canvas, CAPTION, (200, 250), CAPTION_HEIGHT, palette::BLACK, &default_font()?);
    }
    Ok(vec![("Drawings on Image", board)])
}

pub fn contours_step(image: &Frame, thresh: u8) -> Result<Windows, LessonError> {
    let (w, h) = RESIZE_TARGET;
    let original = image.to_bgr8().resize(w, h, Interpolation::Linear)?;
    let pipeline = ContourPipeline {
        thresh,
        typ: ThresholdType::BinaryInv,
        blur_size: 5,
        blur_sigma: 1.0,
        mode: RetrievalMode::List,
    };
    let (_, contours) = pipeline.run(&original)?;
    let mut outlined = original.clone();
    draw_contours(
        &mut outlined.view_mut(),
        &contours,
        palette::BLUE,
        Thickness::Stroke(OUTLINE),
    );
    Ok(vec![("Original Image", original), ("Contours", outlined)])
}

// Every contour above `min_area` gets outlined and boxed.
pub fn object_boxes_step(image: &Frame, thresh: u8, min_area: f32) -> Result<Windows, LessonError> {
    let mut shown = image.to_bgr8();
    let pipeline = ContourPipeline {
        thresh,
        typ: ThresholdType::Binary,
        blur_size: 5,
        blur_sigma: 0.0,
        mode: RetrievalMode::List,
    };
    let (_, contours) = pipeline.run(&shown)?;
    let objects = large_contours(&contours, min_area);
    tracing::info!(found = contours.len(), kept = objects.len(), min_area, "objects");
    {
        let mut canvas = shown.view_mut();
        for contour in objects {
            draw_contours(
                &mut canvas,
                std::slice::from_ref(contour),
                palette::YELLOW,
                Thickness::Stroke(OUTLINE),
            );
            draw_rect(&mut canvas, contour.bounding_rect(), palette::YELLOW, Thickness::Stroke(OUTLINE));
        }
    }
    Ok(vec![("Detected Birds", shown)])
}
