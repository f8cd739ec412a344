mod common;
use common::sine;
use epochset::normalize::zscore_channels_inplace;
use ndarray::Array2;

#[test]
fn zscore_postconditions_per_channel() {
    let n = 1000;
    let mut data = Array2::from_shape_fn((3, n), |(c, t)| {
        let s = sine(5.0 + c as f32, 250.0, n)[t];
        (c as f32 + 1.0) * 40.0 * s + 100.0 * c as f32
    });
    let stats = zscore_channels_inplace(&mut data);
    assert_eq!(stats.len(), 3);
    approx::assert_abs_diff_eq!(stats[2].0, 200.0, epsilon = 1e-2);

    for row in data.rows() {
        let m = row.sum() / n as f32;
        let sd = (row.iter().map(|v| (v - m).powi(2)).sum::<f32>() / n as f32).sqrt();
        assert!(m.abs() < 1e-4, "post-zscore mean = {m:.2e}");
        approx::assert_abs_diff_eq!(sd, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn flat_channel_left_unchanged() {
    let mut data = Array2::from_shape_fn((2, 100), |(c, t)| if c == 0 { 7.0 } else { t as f32 });
    let stats = zscore_channels_inplace(&mut data);
    assert_eq!(stats[0], (7.0, 0.0));
    assert!(data.row(0).iter().all(|&v| v == 7.0));
    assert!(data.row(1).iter().all(|v| v.is_finite()));
}

#[test]
fn zscore_is_idempotent() {
    let mut once = Array2::from_shape_fn((4, 300), |(c, t)| ((c * 31 + t * 7) % 17) as f32);
    zscore_channels_inplace(&mut once);
    let mut twice = once.clone();
    zscore_channels_inplace(&mut twice);
    for (a, b) in once.iter().zip(twice.iter()) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-5);
    }
}
