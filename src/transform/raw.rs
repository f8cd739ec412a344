//! Transformers applied to continuous recordings before windowing.
use anyhow::Result;
use log::debug;

use super::Transform;
use crate::filter::{apply_fir_zero_phase, design_filter};
use crate::normalize::zscore_channels_inplace;
use crate::raw::RawRecording;

/// Zero-phase FIR filter over every channel of a recording.
///
/// The kernel is designed at apply time from the recording's own sampling
/// rate, so one transformer can serve recordings with different rates.
/// `l_freq` only → high-pass, `h_freq` only → low-pass, both → band-pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterRawTransformer {
    pub l_freq: Option<f32>,
    pub h_freq: Option<f32>,
}

impl FilterRawTransformer {
    pub fn new(l_freq: Option<f32>, h_freq: Option<f32>) -> Self {
        Self { l_freq, h_freq }
    }

    pub fn bandpass(l_freq: f32, h_freq: f32) -> Self {
        Self::new(Some(l_freq), Some(h_freq))
    }
}

impl Transform<RawRecording> for FilterRawTransformer {
    fn transform(&self, mut raw: RawRecording) -> Result<RawRecording> {
        let h = design_filter(self.l_freq, self.h_freq, raw.sfreq)?;
        debug!(
            "filtering {} ch × {} samples: l_freq={:?} h_freq={:?} ({} taps)",
            raw.n_channels(), raw.n_times(), self.l_freq, self.h_freq, h.len()
        );
        apply_fir_zero_phase(&mut raw.data, &h)?;
        Ok(raw)
    }
}

/// Channel-wise z-score over the whole recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZscoreRawTransformer;

impl Transform<RawRecording> for ZscoreRawTransformer {
    fn transform(&self, mut raw: RawRecording) -> Result<RawRecording> {
        zscore_channels_inplace(&mut raw.data);
        Ok(raw)
    }
}
