//! Channel-wise z-score normalisation.
//!
//! For each row of a [C, T] array:
//!   μ = mean(data[c, :]),  σ = std(data[c, :]) (ddof=0)
//!   data[c, :] = (data[c, :] - μ) / σ
//!
//! Statistics are accumulated in `f64`. Rows with σ = 0 are left untouched.
use ndarray::{Array2, ArrayViewMut1};

/// Z-score every channel of `data` ([C, T]) in place.
/// Returns the `(mean, std)` pair used for each channel.
pub fn zscore_channels_inplace(data: &mut Array2<f32>) -> Vec<(f32, f32)> {
    data.rows_mut().into_iter().map(zscore_row_inplace).collect()
}

fn zscore_row_inplace(mut row: ArrayViewMut1<'_, f32>) -> (f32, f32) {
    let n = row.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = n as f64;
    let mean = row.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = row.iter().map(|&v| {
        let d = v as f64 - mean; d * d
    }).sum::<f64>() / n;
    let std = var.sqrt();

    if std > 0.0 {
        row.mapv_inplace(|v| ((v as f64 - mean) / std) as f32);
    }
    (mean as f32, std as f32)
}
