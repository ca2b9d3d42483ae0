use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Kernel size must be positive")]
    ZeroKernel,

    #[error("Kernel size {size} must be odd")]
    EvenKernel { size: usize },
}

fn check_odd(size: usize) -> Result<(), FilterError> {
    if size == 0 {
        return Err(FilterError::ZeroKernel);
    }
    if size % 2 == 0 {
        return Err(FilterError::EvenKernel { size });
    }
    Ok(())
}

// Applies `f` to every channel plane and stacks the results back together.
pub(crate) fn map_planes<F>(src: ArrayView3<u8>, mut f: F) -> Array3<u8>
where
    F: FnMut(ArrayView2<u8>) -> Array2<u8>,
{
    let (height, width, channels) = src.dim();
    let mut dst = Array3::<u8>::zeros((height, width, channels));
    for c in 0..channels {
        let plane = f(src.index_axis(Axis(2), c));
        dst.index_axis_mut(Axis(2), c).assign(&plane);
    }
    dst
}

// Separable correlation through imageproc, edge pixels replicated. Sums are
// kept in f32 and rounded back to bytes once.
pub(crate) fn convolve_separable(src: ArrayView2<u8>, kx: &[f32], ky: &[f32]) -> Array2<u8> {
    let (height, width) = src.dim();
    let plane: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            Luma([f32::from(src[(y as usize, x as usize)])])
        });
    let filtered = filter::separable_filter(&plane, kx, ky);
    Array2::from_shape_fn((height, width), |(y, x)| {
        filtered.get_pixel(x as u32, y as u32)[0].round().clamp(0.0, 255.0) as u8
    })
}

/// One-dimensional normalized Gaussian kernel.
///
/// A non-positive `sigma` is derived from the kernel size.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f32> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size as f64 - 1.0) / 2.0;
    let scale = -0.5 / (sigma * sigma);

    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Normalized mean over a `kw` x `kh` neighbourhood of a single plane.
pub fn box_blur_plane(src: ArrayView2<u8>, kw: usize, kh: usize) -> Result<Array2<u8>, FilterError> {
    if kw == 0 || kh == 0 {
        return Err(FilterError::ZeroKernel);
    }
    let kx = vec![1.0 / kw as f32; kw];
    let ky = vec![1.0 / kh as f32; kh];
    Ok(convolve_separable(src, &kx, &ky))
}

pub fn box_blur(src: ArrayView3<u8>, kw: usize, kh: usize) -> Result<Array3<u8>, FilterError> {
    if kw == 0 || kh == 0 {
        return Err(FilterError::ZeroKernel);
    }
    let kx = vec![1.0 / kw as f32; kw];
    let ky = vec![1.0 / kh as f32; kh];
    Ok(map_planes(src, |plane| convolve_separable(plane, &kx, &ky)))
}

pub fn gaussian_blur_plane(
    src: ArrayView2<u8>,
    kw: usize,
    kh: usize,
    sigma: f64,
) -> Result<Array2<u8>, FilterError> {
    check_odd(kw)?;
    check_odd(kh)?;
    Ok(convolve_separable(
        src,
        &gaussian_kernel(kw, sigma),
        &gaussian_kernel(kh, sigma),
    ))
}

pub fn gaussian_blur(
    src: ArrayView3<u8>,
    kw: usize,
    kh: usize,
    sigma: f64,
) -> Result<Array3<u8>, FilterError> {
    check_odd(kw)?;
    check_odd(kh)?;
    let kx = gaussian_kernel(kw, sigma);
    let ky = gaussian_kernel(kh, sigma);
    Ok(map_planes(src, |plane| convolve_separable(plane, &kx, &ky)))
}

/// Median of each `size` x `size` window. Edge pixels are replicated.
pub fn median_blur_plane(src: ArrayView2<u8>, size: usize) -> Result<Array2<u8>, FilterError> {
    check_odd(size)?;
    let (height, width) = src.dim();
    let plane = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([src[(y as usize, x as usize)]])
    });
    let radius = (size / 2) as u32;
    let filtered = filter::median_filter(&plane, radius, radius);
    Ok(Array2::from_shape_fn((height, width), |(y, x)| {
        filtered.get_pixel(x as u32, y as u32)[0]
    }))
}

pub fn median_blur(src: ArrayView3<u8>, size: usize) -> Result<Array3<u8>, FilterError> {
    check_odd(size)?;
    let mut err = None;
    let out = map_planes(src, |plane| match median_blur_plane(plane, size) {
        Ok(p) => p,
        Err(e) => {
            err = Some(e);
            Array2::zeros(plane.dim())
        }
    });
    match err {
        Some(e) => Err(e),
        None => Ok(out),
    }
}
