//! # epochset: windowed EEG datasets from composable pipelines
//!
//! `epochset` turns continuous EEG recordings into an indexable dataset of
//! `(window, label)` pairs ready for a machine-learning model. Preprocessing
//! is expressed as two chains of named steps around a windower:
//!
//! ```text
//! RecordingSource::load_subject()      continuous [C, T] recordings + events
//!   │
//!   ├─ raw pipeline          e.g. bandpass 1–80 Hz → channel z-score
//!   ├─ windower              event-locked windows, labels from a LabelMapping
//!   ├─ window pipeline       e.g. FIR 8–12 Hz → channel z-score
//!   │                        (at access time, or precomputed once)
//!   └─→ WindowsDataset       len(), get(i) → ([C, W] f32, label)
//! ```
//!
//! The DSP steps follow MNE-Python: Hamming-windowed FIR design with
//! automatic transition bandwidth and overlap-add zero-phase convolution.
//!
//! ## Quick start
//!
//! ```no_run
//! use epochset::{DatasetConfig, SyntheticSource};
//!
//! // Default config: 1–80 Hz + z-score on raw, 200-sample windows,
//! // 8–12 Hz FIR + z-score on windows, four motor-imagery classes.
//! let cfg = DatasetConfig::default();
//! let dataset = cfg.builder()?.build(&SyntheticSource::default())?;
//!
//! // 12 repetitions × 4 classes × 5 windows per trial
//! assert_eq!(dataset.len(), 240);
//!
//! let (x, y) = dataset.get(0)?;
//! println!("first window {:?}, label {y}", x.dim()); // (22, 200)
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Building pipelines by hand
//!
//! See [`transform`] for the [`Transform`] trait and [`Pipeline`], and
//! [`dataset`] for [`WindowsDataset::builder`].

pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod io;
pub mod normalize;
pub mod raw;
pub mod source;
pub mod transform;
pub mod windower;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{DatasetConfig, RawFilterConfig, WindowFilterConfig, WindowerConfig};

// dataset
pub use dataset::{DatasetBuilder, WindowsDataset};

// error
pub use error::Error;

// filter: design helpers + convolution
pub use filter::{
    auto_trans_bandwidth, auto_trans_bandwidth_low, auto_filter_length,
    design_filter, design_highpass, design_lowpass, design_bandpass,
    apply_fir_zero_phase, filter_1d,
};

// io: safetensors helpers
pub use io::{StWriter, write_windows, read_window_labels};

// normalize
pub use normalize::zscore_channels_inplace;

// raw
pub use raw::{Event, RawRecording};

// source
pub use source::{LocalSource, RecordingSource, SyntheticSource};

// transform
pub use transform::{Pipeline, RawPipeline, Transform, WindowPipeline};
pub use transform::raw::{FilterRawTransformer, ZscoreRawTransformer};
pub use transform::window::{FilterWindowTransformer, ZscoreWindowTransformer};

// windower
pub use windower::{
    EventWindower, FixedLengthWindower, LabelMapping, UnmappedEvent, Window, Windower,
};
