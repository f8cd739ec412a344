//! Dataset configuration.
//!
//! [`DatasetConfig`] describes a complete pipeline (raw chain, windower,
//! window chain, dataset options) and can be read from TOML. The default
//! reproduces the classic motor-imagery preprocessing example:
//!
//! ```toml
//! subject = 2
//! transform_online = true
//! update_path = true
//! raw_zscore = true
//! window_zscore = true
//!
//! [raw_filter]
//! l_freq = 1.0
//! h_freq = 80.0
//!
//! [windower]
//! window_size_samples = 200
//! tmin_samples = 0
//! chunk_duration_samples = 200
//!
//! [windower.mapping]
//! 1 = "Left hand"
//! 2 = "Right hand"
//! 3 = "Foot"
//! 4 = "Tongue"
//!
//! [window_filter]
//! sfreq = 250.0
//! l_freq = 8.0
//! h_freq = 12.0
//! ```
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::dataset::{DatasetBuilder, WindowsDataset};
use crate::transform::raw::{FilterRawTransformer, ZscoreRawTransformer};
use crate::transform::window::{FilterWindowTransformer, ZscoreWindowTransformer};
use crate::transform::{RawPipeline, WindowPipeline};
use crate::windower::{EventWindower, LabelMapping, UnmappedEvent};

/// Full dataset configuration.
///
/// Missing keys fall back to [`DatasetConfig::default()`]. An empty
/// `[raw_filter]` / `[window_filter]` table (no cut-off given) disables that
/// filter step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Subject identifier passed to the recording source.
    ///
    /// Default: `2`.
    pub subject: u32,

    /// Apply window transformers at access time (`true`) or once while
    /// building (`false`).
    ///
    /// Default: `true`.
    pub transform_online: bool,

    /// Let the source store the data location in its config file.
    ///
    /// Default: `true`.
    pub update_path: bool,

    /// Band-pass applied to continuous data, step name `bandpass_filter`.
    ///
    /// Default: 1–80 Hz.
    pub raw_filter: Option<RawFilterConfig>,

    /// Channel-wise z-score of continuous data, step name `zscorer`.
    ///
    /// Default: `true`.
    pub raw_zscore: bool,

    pub windower: WindowerConfig,

    /// FIR filter over each window, step name `FIR_filter`.
    ///
    /// Default: 8–12 Hz at 250 Hz.
    pub window_filter: Option<WindowFilterConfig>,

    /// Channel-wise z-score of each window, step name `zscorer`.
    ///
    /// Default: `true`.
    pub window_zscore: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFilterConfig {
    pub l_freq: Option<f32>,
    pub h_freq: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowFilterConfig {
    /// Sampling rate of the windows, in Hz.
    pub sfreq: f32,
    pub l_freq: Option<f32>,
    pub h_freq: Option<f32>,
}

/// [`EventWindower`] parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowerConfig {
    /// Default: `200`.
    pub window_size_samples: usize,
    /// Default: `0`.
    pub tmin_samples: i64,
    /// Default: `200`.
    pub chunk_duration_samples: usize,
    /// Fixed trial length; `None` uses each event's own duration.
    pub trial_duration_samples: Option<usize>,
    /// Default: `ignore`.
    pub on_unmapped: UnmappedEvent,
    /// Event code (as a string key) → class name.
    ///
    /// Default: the four motor-imagery classes.
    pub mapping: BTreeMap<String, String>,
}

impl Default for WindowerConfig {
    fn default() -> Self {
        Self {
            window_size_samples: 200,
            tmin_samples: 0,
            chunk_duration_samples: 200,
            trial_duration_samples: None,
            on_unmapped: UnmappedEvent::Ignore,
            mapping: LabelMapping::motor_imagery()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            subject: 2,
            transform_online: true,
            update_path: true,
            raw_filter: Some(RawFilterConfig { l_freq: Some(1.0), h_freq: Some(80.0) }),
            raw_zscore: true,
            windower: WindowerConfig::default(),
            window_filter: Some(WindowFilterConfig { sfreq: 250.0, l_freq: Some(8.0), h_freq: Some(12.0) }),
            window_zscore: true,
        }
    }
}

impl DatasetConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid dataset configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Raw-stage chain, or `None` when no raw step is enabled.
    pub fn raw_pipeline(&self) -> Result<Option<RawPipeline>> {
        let mut p = RawPipeline::empty();
        if let Some(f) = self.raw_filter.filter(|f| f.l_freq.is_some() || f.h_freq.is_some()) {
            p = p.step("bandpass_filter", FilterRawTransformer::new(f.l_freq, f.h_freq))?;
        }
        if self.raw_zscore {
            p = p.step("zscorer", ZscoreRawTransformer)?;
        }
        Ok((!p.is_empty()).then_some(p))
    }

    /// Window-stage chain, or `None` when no window step is enabled.
    pub fn window_pipeline(&self) -> Result<Option<WindowPipeline>> {
        let mut p = WindowPipeline::empty();
        if let Some(f) = self.window_filter.filter(|f| f.l_freq.is_some() || f.h_freq.is_some()) {
            p = p.step("FIR_filter", FilterWindowTransformer::new(f.sfreq, f.l_freq, f.h_freq)?)?;
        }
        if self.window_zscore {
            p = p.step("zscorer", ZscoreWindowTransformer)?;
        }
        Ok((!p.is_empty()).then_some(p))
    }

    pub fn event_windower(&self) -> Result<EventWindower> {
        let w = &self.windower;
        let mapping = LabelMapping::from_string_keys(&w.mapping)?;
        let mut windower = EventWindower::new(
            w.window_size_samples,
            w.tmin_samples,
            w.chunk_duration_samples,
            mapping,
        )?
        .with_unmapped(w.on_unmapped);
        if let Some(n) = w.trial_duration_samples {
            windower = windower.with_trial_duration(n);
        }
        Ok(windower)
    }

    /// A [`DatasetBuilder`] with every option of this configuration applied.
    pub fn builder(&self) -> Result<DatasetBuilder> {
        let mut b = WindowsDataset::builder(self.subject)
            .windower(self.event_windower()?)
            .transform_online(self.transform_online)
            .update_path(self.update_path);
        if let Some(p) = self.raw_pipeline()? {
            b = b.raw_transformer(p);
        }
        if let Some(p) = self.window_pipeline()? {
            b = b.window_transformer(p);
        }
        Ok(b)
    }
}
