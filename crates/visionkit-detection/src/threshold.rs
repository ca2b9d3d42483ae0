use crate::blur::{convolve_separable, gaussian_kernel, FilterError};
use ndarray::{Array2, ArrayView2, Zip};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    Binary,
    BinaryInv,
    Trunc,
    ToZero,
    ToZeroInv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    MeanC,
    GaussianC,
}

fn apply_threshold(value: u8, thresh: u8, max_value: u8, typ: ThresholdType) -> u8 {
    let above = value > thresh;
    match typ {
        ThresholdType::Binary => {
            if above {
                max_value
            } else {
                0
            }
        }
        ThresholdType::BinaryInv => {
            if above {
                0
            } else {
                max_value
            }
        }
        ThresholdType::Trunc => value.min(thresh),
        ThresholdType::ToZero => {
            if above {
                value
            } else {
                0
            }
        }
        ThresholdType::ToZeroInv => {
            if above {
                0
            } else {
                value
            }
        }
    }
}

/// Global threshold of a gray plane. Pixels strictly above `thresh` count as "above".
pub fn threshold(src: ArrayView2<u8>, thresh: u8, max_value: u8, typ: ThresholdType) -> Array2<u8> {
    src.mapv(|v| apply_threshold(v, thresh, max_value, typ))
}

// Local (weighted) mean with replicated borders, rounded back to bytes.
fn local_mean(src: ArrayView2<u8>, block_size: usize, method: AdaptiveMethod) -> Array2<u8> {
    let kernel = match method {
        AdaptiveMethod::MeanC => vec![1.0 / block_size as f32; block_size],
        AdaptiveMethod::GaussianC => gaussian_kernel(block_size, 0.0),
    };
    convolve_separable(src, &kernel, &kernel)
}

/// Threshold each pixel against the mean of its `block_size` neighbourhood minus `c`.
///
/// Only [`ThresholdType::Binary`] and [`ThresholdType::BinaryInv`] make sense
/// here; the other types behave like `Binary`.
pub fn adaptive_threshold(
    src: ArrayView2<u8>,
    max_value: u8,
    method: AdaptiveMethod,
    typ: ThresholdType,
    block_size: usize,
    c: f32,
) -> Result<Array2<u8>, FilterError> {
    if block_size < 3 {
        return Err(FilterError::ZeroKernel);
    }
    if block_size % 2 == 0 {
        return Err(FilterError::EvenKernel { size: block_size });
    }

    let mean = local_mean(src, block_size, method);
    let mut dst = Array2::<u8>::zeros(src.dim());
    Zip::from(&mut dst)
        .and(src)
        .and(&mean)
        .for_each(|out, &value, &m| {
            let above = value as f32 > m as f32 - c;
            *out = match (typ, above) {
                (ThresholdType::BinaryInv, true) => 0,
                (ThresholdType::BinaryInv, false) => max_value,
                (_, true) => max_value,
                (_, false) => 0,
            };
        });
    Ok(dst)
}
