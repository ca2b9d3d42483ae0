use image::{ExtendedColorType, GrayImage, ImageBuffer, RgbImage};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis};
use std::path::Path;
use thiserror::Error;
use visionkit_detection::color::{bgr_to_hsv, hsv_to_bgr, Bgr};
use visionkit_detection::resize::{resize, Interpolation};
use visionkit_detection::Rect;

#[derive(Clone, Debug, PartialEq)]
// An image frame: pixels laid out (height, width, channels) plus how to read them.
pub struct Frame {
    data: Array3<u8>,
    format: PixelFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
// Describes how pixels are laid out and how many bytes each uses.
pub enum PixelFormat {
    RGB8,  // 3 bytes per pixel (R, G, B)
    RGBA8, // 4 bytes per pixel (R, G, B, A)
    BGR8,  // 3 bytes per pixel (B, G, R)
    GRAY8, // 1 byte per pixel (grayscale)
    HSV,   // 3 bytes per pixel (H in 0..180, S, V)
}

impl PixelFormat {
    // Returns how many bytes each pixel uses for this format.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::GRAY8 => 1,
            PixelFormat::RGB8 | PixelFormat::BGR8 | PixelFormat::HSV => 3,
            PixelFormat::RGBA8 => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Buffer size doesn't match: expected {expected} bytes, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },

    #[error("Provided dimensions are zero")]
    ZeroDimensions,

    #[error("{format:?} frames have {expected} channels, array has {actual}")]
    ChannelMismatch {
        format: PixelFormat,
        expected: usize,
        actual: usize,
    },

    #[error("Crop {rect:?} falls outside a {width}x{height} frame")]
    CropOutOfBounds { rect: Rect, width: u32, height: u32 },

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
}

pub struct FrameConfig {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Frame {
    // Validates buffer size against dimensions and constructs a frame.
    pub fn new(config: FrameConfig) -> Result<Self, FrameError> {
        if config.width == 0 || config.height == 0 {
            return Err(FrameError::ZeroDimensions);
        }

        let bpp = config.format.bytes_per_pixel() as usize;
        let expected = config.width as usize * config.height as usize * bpp;
        if config.data.len() != expected {
            return Err(FrameError::InvalidDimensions {
                expected,
                actual: config.data.len(),
            });
        }

        let shape = (config.height as usize, config.width as usize, bpp);
        let actual = config.data.len();
        let data = Array3::from_shape_vec(shape, config.data)
            .map_err(|_| FrameError::InvalidDimensions { expected, actual })?;
        Ok(Self {
            data,
            format: config.format,
        })
    }

    // Wraps an array whose last axis holds the channels of `format`.
    pub fn from_array(data: Array3<u8>, format: PixelFormat) -> Result<Self, FrameError> {
        let (height, width, channels) = data.dim();
        if height == 0 || width == 0 {
            return Err(FrameError::ZeroDimensions);
        }
        let expected = format.bytes_per_pixel() as usize;
        if channels != expected {
            return Err(FrameError::ChannelMismatch {
                format,
                expected,
                actual: channels,
            });
        }
        // Keep the standard layout so pixels stay contiguous.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data, format })
    }

    // Single-channel frame from a plane such as a mask.
    pub fn from_plane(plane: Array2<u8>) -> Result<Self, FrameError> {
        Self::from_array(plane.insert_axis(Axis(2)), PixelFormat::GRAY8)
    }

    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        self.data.view_mut()
    }

    // First channel as a plane; the whole image for GRAY8 frames.
    pub fn plane(&self) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(2), 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice().unwrap_or(&[])
    }

    // Returns the pixel bytes at (x, y) if inside bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let bpp = self.format.bytes_per_pixel() as usize;
        let index = (y as usize * self.width() as usize + x as usize) * bpp;
        self.as_bytes().get(index..index + bpp)
    }

    fn map_pixels<F>(&self, format: PixelFormat, f: F) -> Frame
    where
        F: Fn(&[u8]) -> [u8; 3],
    {
        let (height, width, channels) = self.data.dim();
        let data: Vec<u8> = self
            .as_bytes()
            .chunks_exact(channels)
            .flat_map(&f)
            .collect();
        Frame {
            data: Array3::from_shape_vec((height, width, 3), data)
                .unwrap_or_else(|_| Array3::zeros((height, width, 3))),
            format,
        }
    }

    // Normalizes a pixel into (b, g, r) ordering regardless of source format.
    fn extract_bgr(&self, pixel: &[u8]) -> Bgr {
        match self.format {
            PixelFormat::RGB8 | PixelFormat::RGBA8 => Bgr::new(pixel[2], pixel[1], pixel[0]),
            PixelFormat::BGR8 => Bgr::new(pixel[0], pixel[1], pixel[2]),
            PixelFormat::GRAY8 => Bgr::new(pixel[0], pixel[0], pixel[0]),
            PixelFormat::HSV => hsv_to_bgr(pixel[0], pixel[1], pixel[2]),
        }
    }

    // Converts the frame into an 8-bit BGR frame.
    pub fn to_bgr8(&self) -> Frame {
        if self.format == PixelFormat::BGR8 {
            return self.clone();
        }
        self.map_pixels(PixelFormat::BGR8, |p| self.extract_bgr(p).to_array())
    }

    // Converts the frame into an 8-bit RGB frame.
    pub fn to_rgb8(&self) -> Frame {
        if self.format == PixelFormat::RGB8 {
            return self.clone();
        }
        self.map_pixels(PixelFormat::RGB8, |p| {
            let c = self.extract_bgr(p);
            [c.r, c.g, c.b]
        })
    }

    // Converts the frame into HSV pixel format.
    pub fn to_hsv(&self) -> Frame {
        if self.format == PixelFormat::HSV {
            return self.clone();
        }
        self.map_pixels(PixelFormat::HSV, |p| bgr_to_hsv(self.extract_bgr(p)))
    }

    // Converts the frame into an 8-bit grayscale frame.
    pub fn to_grayscale(&self) -> Frame {
        if self.format == PixelFormat::GRAY8 {
            return self.clone();
        }
        let (height, width, channels) = self.data.dim();
        let values: Vec<u8> = self
            .as_bytes()
            .chunks_exact(channels)
            .map(|px| match self.format {
                // V channel
                PixelFormat::HSV => px[2],
                _ => Frame::bgr_to_gray(self.extract_bgr(px)),
            })
            .collect();
        let gray = Array2::from_shape_vec((height, width), values)
            .unwrap_or_else(|_| Array2::zeros((height, width)));
        Frame {
            data: gray.insert_axis(Axis(2)),
            format: PixelFormat::GRAY8,
        }
    }

    // Converts a BGR triple to a single luminance value.
    fn bgr_to_gray(c: Bgr) -> u8 {
        (0.299 * c.r as f32 + 0.587 * c.g as f32 + 0.114 * c.b as f32)
            .round()
            .min(255.0) as u8
    }

    // Copies the rows and columns covered by `rect`.
    pub fn crop(&self, rect: Rect) -> Result<Frame, FrameError> {
        if rect.is_empty() {
            return Err(FrameError::ZeroDimensions);
        }
        if !rect.fits_within(self.width(), self.height()) {
            return Err(FrameError::CropOutOfBounds {
                rect,
                width: self.width(),
                height: self.height(),
            });
        }
        let view = self.data.slice(s![
            rect.y as usize..rect.bottom() as usize,
            rect.x as usize..rect.right() as usize,
            ..
        ]);
        Ok(Frame {
            data: view.as_standard_layout().into_owned(),
            format: self.format,
        })
    }

    pub fn resize(&self, width: u32, height: u32, interp: Interpolation) -> Result<Frame, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimensions);
        }
        let data = resize(self.view(), width as usize, height as usize, interp);
        Ok(Frame {
            data,
            format: self.format,
        })
    }

    // Scales both sides by `scale`, truncating, with area averaging.
    pub fn rescale(&self, scale: f32) -> Result<Frame, FrameError> {
        let width = (self.width() as f32 * scale) as u32;
        let height = (self.height() as f32 * scale) as u32;
        self.resize(width, height, Interpolation::Area)
    }

    // Mirror image around the vertical axis.
    pub fn flip_horizontal(&self) -> Frame {
        Frame {
            data: self.data.slice(s![.., ..;-1, ..]).as_standard_layout().into_owned(),
            format: self.format,
        }
    }

    // New pixels in this frame's format. Channel counts must agree.
    pub fn with_data(&self, data: Array3<u8>) -> Result<Frame, FrameError> {
        Frame::from_array(data, self.format)
    }

    /// Keeps the bytes and changes only how they are read.
    ///
    /// Showing RGB or HSV bytes tagged as BGR is how a display that assumes
    /// BGR would render them.
    pub fn reinterpret(self, format: PixelFormat) -> Result<Frame, FrameError> {
        Frame::from_array(self.data, format)
    }

    // Decodes a still image from disk into a BGR frame.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Frame, FrameError> {
        let rgb = image::open(path.as_ref())?.to_rgb8();
        Frame::from_rgb_image(&rgb)
    }

    pub fn from_rgb_image(img: &RgbImage) -> Result<Frame, FrameError> {
        let rgb = Frame::new(FrameConfig {
            data: img.as_raw().clone(),
            width: img.width(),
            height: img.height(),
            format: PixelFormat::RGB8,
        })?;
        Ok(rgb.to_bgr8())
    }

    // Writes the frame to disk; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FrameError> {
        match self.format {
            PixelFormat::GRAY8 => {
                let img: GrayImage = ImageBuffer::from_raw(self.width(), self.height(), self.as_bytes().to_vec())
                    .ok_or(FrameError::ZeroDimensions)?;
                img.save(path)?;
            }
            _ => {
                let rgb = self.to_rgb8();
                let img: RgbImage = ImageBuffer::from_raw(rgb.width(), rgb.height(), rgb.as_bytes().to_vec())
                    .ok_or(FrameError::ZeroDimensions)?;
                img.save(path)?;
            }
        }
        Ok(())
    }

    // Encodes to JPEG bytes for streaming.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, FrameError> {
        let mut buf = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
        match self.format {
            PixelFormat::GRAY8 => {
                encoder.encode(self.as_bytes(), self.width(), self.height(), ExtendedColorType::L8)?
            }
            _ => {
                let rgb = self.to_rgb8();
                encoder.encode(rgb.as_bytes(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?
            }
        }
        Ok(buf)
    }
}
