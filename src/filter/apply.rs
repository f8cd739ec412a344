//! Overlap-add zero-phase FIR convolution.
//!
//! Matches MNE's `_overlap_add_filter` + `_1d_overlap_filter`.
//!
//! Zero-phase is achieved by shifting the output left by `(N-1)/2` samples,
//! NOT by running filtfilt. The edge transient is suppressed by
//! reflect-limited padding of `N-1` samples on each side.
//!
//! The FFT plans and the kernel spectrum depend only on the kernel and the
//! signal length, so [`OverlapAdd`] builds them once and reuses them for
//! every channel of a [C, T] array.
use anyhow::Result;
use log::warn;
use ndarray::{Array2, ArrayView1};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::Error;

/// Apply a zero-phase FIR filter to each channel of `data` ([C, T]) in-place.
///
/// `h` must have odd length (guaranteed by the `design_*` functions).
pub fn apply_fir_zero_phase(data: &mut Array2<f32>, h: &[f32]) -> Result<()> {
    let n_t = data.ncols();
    if n_t == 0 {
        return Ok(());
    }
    if h.len() > n_t {
        warn!(
            "filter length ({} taps) is longer than the signal ({n_t} samples); \
             edges are zero-padded and the result may be inaccurate",
            h.len()
        );
    }
    let ola = OverlapAdd::new(h, n_t)?;
    for mut row in data.rows_mut() {
        let x = row.to_vec();
        let y = ola.filter(&x);
        row.assign(&ArrayView1::from(&y));
    }
    Ok(())
}

/// Filter a single 1-D signal with the overlap-add algorithm.
///
/// Returns a vector of the same length as `x`.
pub fn filter_1d(x: &[f32], h: &[f32]) -> Result<Vec<f32>> {
    if x.is_empty() {
        return Ok(vec![]);
    }
    Ok(OverlapAdd::new(h, x.len())?.filter(x))
}

/// Precomputed overlap-add state for one kernel and one signal length.
pub struct OverlapAdd {
    n_x: usize,
    n_h: usize,
    n_fft: usize,
    h_fft: Vec<Complex<f32>>,
    fwd: Arc<dyn Fft<f32>>,
    inv: Arc<dyn Fft<f32>>,
}

impl OverlapAdd {
    pub fn new(h: &[f32], n_x: usize) -> Result<Self> {
        if h.len() % 2 == 0 {
            return Err(Error::InvalidFilter(format!(
                "zero-phase FIR needs an odd number of taps, got {}",
                h.len()
            ))
            .into());
        }
        let n_h = h.len();
        // Padded length: N-1 edge samples on each side.
        let n_ext = n_x + 2 * (n_h - 1);
        let n_fft = choose_fft_len(n_h, n_ext);

        let mut planner: FftPlanner<f32> = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft = zero_padded(h, n_fft);
        fwd.process(&mut h_fft);

        Ok(Self { n_x, n_h, n_fft, h_fft, fwd, inv })
    }

    /// Filter `x`, which must have the length this plan was built for.
    pub fn filter(&self, x: &[f32]) -> Vec<f32> {
        debug_assert_eq!(x.len(), self.n_x);
        let (n_h, n_fft) = (self.n_h, self.n_fft);
        // Shift for zero-phase: (N-1)/2  (N is odd).
        let shift = (n_h - 1) / 2;
        let n_edge = n_h - 1;

        let x_ext = reflect_limited_pad(x, n_edge, n_edge);
        let n_ext = x_ext.len();

        let n_seg = n_fft - n_h + 1;
        let n_segments = n_ext.div_ceil(n_seg);
        let mut x_filtered = vec![0.0_f32; n_ext];
        let inv_scale = 1.0 / n_fft as f32;

        for seg_idx in 0..n_segments {
            let start = seg_idx * n_seg;
            let stop = (start + n_seg).min(n_ext);

            let mut buf = zero_padded(&x_ext[start..stop], n_fft);
            self.fwd.process(&mut buf);
            for (b, &hf) in buf.iter_mut().zip(self.h_fft.iter()) {
                *b *= hf;
            }
            self.inv.process(&mut buf);

            // Accumulate, accounting for the zero-phase shift.
            let out_start = start.saturating_sub(shift);
            let out_end = (out_start + n_fft).min(n_ext);
            let prod_start = shift.saturating_sub(start);

            for (o, p) in (out_start..out_end).zip(prod_start..) {
                if p < buf.len() {
                    x_filtered[o] += buf[p].re * inv_scale;
                }
            }
        }

        x_filtered[n_edge..n_edge + x.len()].to_vec()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn zero_padded(x: &[f32], n: usize) -> Vec<Complex<f32>> {
    x.iter()
        .map(|&v| Complex { re: v, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n)
        .collect()
}

/// Reflect-limited padding (matches MNE's `_smart_pad`).
///
/// Left:  `pad[i] = 2*x[0] - x[n_l-i]`  for i in 1..=n_l
/// Right: `pad[i] = 2*x[-1] - x[-(i+1)]` for i in 1..=n_r
///
/// Padding beyond what the signal can reflect is filled with zeros.
fn reflect_limited_pad(x: &[f32], n_l: usize, n_r: usize) -> Vec<f32> {
    let n = x.len();
    let actual_l = n_l.min(n - 1);
    let actual_r = n_r.min(n - 1);

    let mut out = Vec::with_capacity(n_l + n + n_r);
    out.extend(std::iter::repeat(0.0).take(n_l - actual_l));
    out.extend((1..=actual_l).rev().map(|i| 2.0 * x[0] - x[i]));
    out.extend_from_slice(x);
    let last = x[n - 1];
    out.extend((1..=actual_r).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_r - actual_r));
    out
}

/// Choose the optimal FFT block size (power of 2 minimising operation count).
///
/// Matches MNE's cost function:
///   `cost = ceil(n_x / (N - n_h + 1)) * N * (log2(N) + 1) + 4e-5 * N * n_x`
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let max_pow = (n_x as f64).log2().ceil() as u32 + 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;

    let mut best_n = 1_usize << max_pow.max(min_pow);
    let mut best_cost = f64::INFINITY;

    for pow in min_pow..=max_pow {
        let n = 1_usize << pow;
        if n < min_fft { continue; }
        let n_seg = (n - n_h + 1) as f64;
        let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
            + 4e-5 * n as f64 * n_x as f64;
        if cost < best_cost {
            best_cost = cost;
            best_n = n;
        }
    }
    best_n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::design::{design_bandpass, design_highpass};
    use std::f32::consts::PI;

    fn sine(freq: f32, sfreq: f32, n: usize) -> Vec<f32> {
        (0..n).map(|i| (2.0 * PI * freq * i as f32 / sfreq).sin()).collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn filter_preserves_length() {
        let x: Vec<f32> = (0..1024).map(|i| (i as f32 / 1024.0).sin()).collect();
        let h = design_highpass(0.5, 256.0);
        let y = filter_1d(&x, &h).unwrap();
        assert_eq!(y.len(), x.len());
    }

    #[test]
    fn filter_removes_dc() {
        let x = vec![1.0_f32; 4096];
        let h = design_highpass(0.5, 256.0);
        let y = filter_1d(&x, &h).unwrap();
        let n_h = h.len();
        let interior = &y[n_h..y.len() - n_h];
        let max_val: f32 = interior.iter().map(|v| v.abs()).fold(0.0_f32, f32::max);
        assert!(max_val < 1e-3, "DC not removed: max={max_val}");
    }

    #[test]
    fn bandpass_keeps_in_band_and_rejects_out_of_band() {
        let h = design_bandpass(8.0, 12.0, 250.0);
        let n = 5000;
        let alpha = filter_1d(&sine(10.0, 250.0, n), &h).unwrap();
        let beta = filter_1d(&sine(30.0, 250.0, n), &h).unwrap();
        let mid = n / 4..3 * n / 4;
        let keep = rms(&alpha[mid.clone()]) / rms(&sine(10.0, 250.0, n)[mid.clone()]);
        approx::assert_abs_diff_eq!(keep, 1.0, epsilon = 2e-2_f32);
        assert!(rms(&beta[mid]) < 1e-2, "30 Hz leaked through an 8–12 Hz bandpass");
    }

    #[test]
    fn kernel_longer_than_signal_keeps_length() {
        let h = design_bandpass(8.0, 12.0, 250.0);
        assert!(h.len() > 200);
        let y = filter_1d(&sine(10.0, 250.0, 200), &h).unwrap();
        assert_eq!(y.len(), 200);
        assert!(y.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn even_kernel_rejected() {
        let err = filter_1d(&[1.0, 2.0, 3.0], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidFilter(_))));
    }

    #[test]
    fn rows_filtered_independently() {
        let h = design_highpass(1.0, 250.0);
        let mut data = Array2::from_shape_fn((2, 2000), |(c, t)| {
            if c == 0 { 5.0 } else { (2.0 * PI * 20.0 * t as f32 / 250.0).sin() }
        });
        apply_fir_zero_phase(&mut data, &h).unwrap();
        let row1 = filter_1d(&sine(20.0, 250.0, 2000), &h).unwrap();
        for (a, b) in data.row(1).iter().zip(row1.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-6_f32);
        }
        assert!(data[[0, 1000]].abs() < 1e-3);
    }

    #[test]
    fn reflect_limited_left_pad() {
        let x = [1.0_f32, 2.0, 3.0, 4.0, 5.0];
        let padded = reflect_limited_pad(&x, 3, 0);
        // left pad: 2*1 - x[3]=4 → -2, 2*1 - x[2]=3 → -1, 2*1 - x[1]=2 → 0
        assert_eq!(&padded[..3], &[-2.0_f32, -1.0, 0.0]);
        assert_eq!(&padded[3..], &x[..]);
    }

    #[test]
    fn reflect_limited_pad_zero_fills_beyond_signal() {
        let x = [1.0_f32, 2.0, 3.0];
        let padded = reflect_limited_pad(&x, 4, 4);
        assert_eq!(padded.len(), 11);
        assert_eq!(&padded[..4], &[0.0_f32, 0.0, -1.0, 0.0]);
        assert_eq!(&padded[7..], &[4.0_f32, 5.0, 0.0, 0.0]);
    }
}
