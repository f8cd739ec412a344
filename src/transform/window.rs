//! Transformers applied to single [C, W] windows after windowing.
//!
//! A bare window carries no sampling rate, so filters over windows take it
//! as a constructor argument.
use anyhow::Result;
use ndarray::Array2;

use super::Transform;
use crate::filter::{apply_fir_zero_phase, design_filter};
use crate::normalize::zscore_channels_inplace;

/// Zero-phase FIR filter over every channel of a window.
///
/// The kernel is designed once, at construction. For short windows the
/// kernel is usually longer than the window; the edges are then zero-padded
/// (and a warning is logged), as MNE does.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWindowTransformer {
    sfreq: f32,
    l_freq: Option<f32>,
    h_freq: Option<f32>,
    kernel: Vec<f32>,
}

impl FilterWindowTransformer {
    pub fn new(sfreq: f32, l_freq: Option<f32>, h_freq: Option<f32>) -> Result<Self> {
        let kernel = design_filter(l_freq, h_freq, sfreq)?;
        Ok(Self { sfreq, l_freq, h_freq, kernel })
    }

    pub fn sfreq(&self) -> f32 {
        self.sfreq
    }

    pub fn l_freq(&self) -> Option<f32> {
        self.l_freq
    }

    pub fn h_freq(&self) -> Option<f32> {
        self.h_freq
    }

    /// Number of FIR taps.
    pub fn n_taps(&self) -> usize {
        self.kernel.len()
    }
}

impl Transform<Array2<f32>> for FilterWindowTransformer {
    fn transform(&self, mut x: Array2<f32>) -> Result<Array2<f32>> {
        apply_fir_zero_phase(&mut x, &self.kernel)?;
        Ok(x)
    }
}

/// Channel-wise z-score over a single window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZscoreWindowTransformer;

impl Transform<Array2<f32>> for ZscoreWindowTransformer {
    fn transform(&self, mut x: Array2<f32>) -> Result<Array2<f32>> {
        zscore_channels_inplace(&mut x);
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn kernel_designed_up_front() {
        let f = FilterWindowTransformer::new(250.0, Some(8.0), Some(12.0)).unwrap();
        assert_eq!(f.n_taps(), 413);
        assert_eq!(f.sfreq(), 250.0);
    }

    #[test]
    fn invalid_cutoffs_fail_at_construction() {
        let err = FilterWindowTransformer::new(250.0, Some(12.0), Some(8.0)).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidFilter(_))));
    }

    #[test]
    fn filter_is_deterministic() {
        let f = FilterWindowTransformer::new(250.0, Some(8.0), Some(12.0)).unwrap();
        let x = Array2::from_shape_fn((4, 200), |(c, t)| ((c * 31 + t * 7) as f32).sin());
        let a = f.transform(x.clone()).unwrap();
        let b = f.transform(x).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dim(), (4, 200));
    }

    #[test]
    fn zscore_window_rows() {
        let x = Array2::from_shape_fn((2, 200), |(c, t)| c as f32 * 100.0 + t as f32);
        let y = ZscoreWindowTransformer.transform(x).unwrap();
        for row in y.rows() {
            approx::assert_abs_diff_eq!(row.mean().unwrap(), 0.0, epsilon = 1e-4_f32);
        }
    }
}
