/// Shared helpers: synthetic signals and small comparisons.
use epochset::{Event, RawRecording, SyntheticSource};
use ndarray::Array2;
use std::f32::consts::PI;

#[allow(unused)]
/// `n` samples of a unit sine at `freq` Hz.
pub fn sine(freq: f32, sfreq: f32, n: usize) -> Vec<f32> {
    (0..n).map(|t| (2.0 * PI * freq * t as f32 / sfreq).sin()).collect()
}

#[allow(unused)]
pub fn rms(x: &[f32]) -> f32 {
    (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
}

#[allow(unused)]
pub fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    assert_eq!(a.dim(), b.dim(), "shape mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0_f32, f32::max)
}

#[allow(unused)]
/// Small synthetic source: 4 channels, 2 trials per class, one run.
pub fn small_source() -> SyntheticSource {
    SyntheticSource { n_channels: 4, n_repetitions: 2, ..SyntheticSource::default() }
}

#[allow(unused)]
/// `n_ch` channels of `freqs[c]` Hz sines, with the given events.
pub fn multi_sine(freqs: &[f32], sfreq: f32, n_t: usize, events: Vec<Event>) -> RawRecording {
    let data = Array2::from_shape_fn((freqs.len(), n_t), |(c, t)| {
        (2.0 * PI * freqs[c] * t as f32 / sfreq).sin()
    });
    RawRecording::new(data, sfreq).with_events(events)
}
