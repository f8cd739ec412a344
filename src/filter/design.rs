//! FIR filter design matching MNE / `scipy.signal.firwin`.
//!
//! For cut-offs `l_freq` / `h_freq` Hz at sampling rate `sfreq`:
//!   • high-pass transition = min(max(0.25 * l_freq, 2.0), l_freq)
//!   • low-pass transition  = min(max(0.25 * h_freq, 2.0), sfreq/2 - h_freq)
//!   • filter length N      = ceil(3.3 / narrowest_transition * sfreq), rounded to odd
//!   • windowed-sinc design (Hamming window), cut-off at the middle of each
//!     transition band
use anyhow::Result;
use std::f64::consts::PI;

use crate::error::Error;

/// Compute MNE-compatible transition bandwidth for a highpass edge.
///
/// Rule: `min(max(0.25 * l_freq, 2.0), l_freq)`
pub fn auto_trans_bandwidth(l_freq: f32) -> f32 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Transition bandwidth for a lowpass edge.
///
/// Rule: `min(max(0.25 * h_freq, 2.0), sfreq / 2 - h_freq)`
pub fn auto_trans_bandwidth_low(h_freq: f32, sfreq: f32) -> f32 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Compute the number of FIR taps for a given transition bandwidth.
/// Returns an odd integer (required for zero-phase linear-phase FIR).
///
/// Formula: `ceil(3.3 / trans_bw * sfreq)` rounded up to odd.
pub fn auto_filter_length(trans_bw: f32, sfreq: f32) -> usize {
    let n_raw = (3.3 / trans_bw * sfreq).ceil() as usize;
    if n_raw % 2 == 0 { n_raw + 1 } else { n_raw }
}

/// Check that the cut-offs describe a realisable filter at `sfreq`.
pub fn check_cutoffs(l_freq: Option<f32>, h_freq: Option<f32>, sfreq: f32) -> Result<(), Error> {
    if !(sfreq > 0.0) {
        return Err(Error::InvalidFilter(format!("sfreq must be positive, got {sfreq}")));
    }
    let nyq = sfreq / 2.0;
    for (name, f) in [("l_freq", l_freq), ("h_freq", h_freq)] {
        if let Some(f) = f {
            if !(f > 0.0 && f < nyq) {
                return Err(Error::InvalidFilter(format!(
                    "{name}={f} Hz must lie in (0, {nyq}) for sfreq={sfreq} Hz"
                )));
            }
        }
    }
    match (l_freq, h_freq) {
        (None, None) => Err(Error::InvalidFilter("at least one of l_freq / h_freq is required".into())),
        (Some(l), Some(h)) if l >= h => Err(Error::InvalidFilter(format!(
            "l_freq={l} Hz must be below h_freq={h} Hz"
        ))),
        _ => Ok(()),
    }
}

/// Design a zero-phase FIR filter from optional cut-offs.
///
/// | `l_freq` | `h_freq` | result    |
/// |----------|----------|-----------|
/// | `Some`   | `Some`   | band-pass |
/// | `Some`   | `None`   | high-pass |
/// | `None`   | `Some`   | low-pass  |
///
/// Matches `mne.filter.create_filter(data, sfreq, l_freq, h_freq,
///   filter_length='auto', fir_window='hamming', fir_design='firwin', phase='zero')`.
pub fn design_filter(l_freq: Option<f32>, h_freq: Option<f32>, sfreq: f32) -> Result<Vec<f32>> {
    check_cutoffs(l_freq, h_freq, sfreq)?;
    let h = match (l_freq, h_freq) {
        (Some(l), Some(h)) => design_bandpass(l, h, sfreq),
        (Some(l), None) => design_highpass(l, sfreq),
        (None, Some(h)) => design_lowpass(h, sfreq),
        (None, None) => return Err(Error::InvalidFilter("no cut-off given".into()).into()),
    };
    Ok(h)
}

/// Design a zero-phase highpass FIR filter using a Hamming-windowed sinc.
///
/// Returns the impulse response `h[N]` as `Vec<f32>`.
pub fn design_highpass(l_freq: f32, sfreq: f32) -> Vec<f32> {
    let trans_bw = auto_trans_bandwidth(l_freq);
    let n = auto_filter_length(trans_bw, sfreq);
    let cutoff_hz = l_freq - trans_bw / 2.0;
    to_f32(firwin(n, cutoff_hz, sfreq, false))
}

/// Design a zero-phase lowpass FIR filter (unit DC gain).
pub fn design_lowpass(h_freq: f32, sfreq: f32) -> Vec<f32> {
    let trans_bw = auto_trans_bandwidth_low(h_freq, sfreq);
    let n = auto_filter_length(trans_bw, sfreq);
    let cutoff_hz = h_freq + trans_bw / 2.0;
    to_f32(firwin(n, cutoff_hz, sfreq, true))
}

/// Design a zero-phase bandpass FIR filter.
///
/// The length is driven by the narrower of the two transition bands; the
/// gain is normalised to 1 at the centre of the pass band.
pub fn design_bandpass(l_freq: f32, h_freq: f32, sfreq: f32) -> Vec<f32> {
    let l_trans = auto_trans_bandwidth(l_freq);
    let h_trans = auto_trans_bandwidth_low(h_freq, sfreq);
    let n = auto_filter_length(l_trans.min(h_trans), sfreq);
    let l_cut = l_freq - l_trans / 2.0;
    let h_cut = h_freq + h_trans / 2.0;
    to_f32(firwin_bandpass(n, l_cut, h_cut, sfreq))
}

/// Design a lowpass FIR filter using a Hamming-windowed sinc.
///
/// `pass_zero=true` means the DC component passes (lowpass); `false` gives
/// the spectral inversion (highpass). `cutoff_hz` is the -6 dB point.
pub(crate) fn firwin(n: usize, cutoff_hz: f32, sfreq: f32, pass_zero: bool) -> Vec<f64> {
    debug_assert!(n % 2 == 1, "odd N required for a linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz as f64 / (sfreq as f64 / 2.0);   // normalised [0, 1]

    let win = hamming(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| sinc_lowpass(fc, i as f64 - alpha) * win[i])
        .collect();

    // Normalise so sum = 1 (unit DC gain for lowpass).
    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);

    if !pass_zero {
        h.iter_mut().for_each(|v| *v = -*v);
        h[n / 2] += 1.0;
    }
    h
}

/// Bandpass counterpart of [`firwin`]: difference of two windowed sincs,
/// scaled to unit gain at the centre frequency (scipy's `scale=True`).
pub(crate) fn firwin_bandpass(n: usize, l_cut_hz: f32, h_cut_hz: f32, sfreq: f32) -> Vec<f64> {
    debug_assert!(n % 2 == 1, "odd N required for a linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let nyq = sfreq as f64 / 2.0;
    let (fl, fh) = (l_cut_hz as f64 / nyq, h_cut_hz as f64 / nyq);

    let win = hamming(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            (sinc_lowpass(fh, x) - sinc_lowpass(fl, x)) * win[i]
        })
        .collect();

    let f_center = (fl + fh) / 2.0;
    let s: f64 = h
        .iter()
        .enumerate()
        .map(|(i, &v)| v * (PI * (i as f64 - alpha) * f_center).cos())
        .sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub(crate) fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// f(x) = sin(π·fc·x) / (π·x);  lim_{x→0} f(x) = fc
fn sinc_lowpass(fc: f64, x: f64) -> f64 {
    if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) }
}

fn to_f32(h: Vec<f64>) -> Vec<f32> {
    h.into_iter().map(|v| v as f32).collect()
}
