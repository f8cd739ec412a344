//! Windowed dataset: raw chain → windower → window chain, indexed access.
//!
//! ```no_run
//! use epochset::{
//!     EventWindower, LabelMapping, SyntheticSource, WindowsDataset,
//!     transform::{RawPipeline, WindowPipeline},
//!     transform::raw::{FilterRawTransformer, ZscoreRawTransformer},
//!     transform::window::{FilterWindowTransformer, ZscoreWindowTransformer},
//! };
//!
//! let raw_chain = RawPipeline::empty()
//!     .step("bandpass_filter", FilterRawTransformer::bandpass(1.0, 80.0))?
//!     .step("zscorer", ZscoreRawTransformer)?;
//! let window_chain = WindowPipeline::empty()
//!     .step("FIR_filter", FilterWindowTransformer::new(250.0, Some(8.0), Some(12.0))?)?
//!     .step("zscorer", ZscoreWindowTransformer)?;
//!
//! let dataset = WindowsDataset::builder(2)
//!     .raw_transformer(raw_chain)
//!     .windower(EventWindower::new(200, 0, 200, LabelMapping::motor_imagery())?)
//!     .window_transformer(window_chain)
//!     .transform_online(true)
//!     .build(&SyntheticSource::default())?;
//!
//! assert_eq!(dataset.len(), 240);
//! let (x, y) = dataset.get(0)?;
//! println!("first window {:?} labelled {y}", x.dim());
//! # Ok::<(), anyhow::Error>(())
//! ```
use anyhow::Result;
use log::{debug, info};
use ndarray::Array2;

use crate::error::Error;
use crate::source::RecordingSource;
use crate::transform::{RawPipeline, Transform, WindowPipeline};
use crate::windower::{Window, Windower};

/// Options for [`WindowsDataset`]; obtained from [`WindowsDataset::builder`].
pub struct DatasetBuilder {
    subject: u32,
    raw_transformer: Option<RawPipeline>,
    windower: Option<Box<dyn Windower>>,
    window_transformer: Option<WindowPipeline>,
    transform_online: bool,
    update_path: bool,
}

impl DatasetBuilder {
    /// Chain applied to every continuous recording before windowing.
    pub fn raw_transformer(mut self, pipeline: RawPipeline) -> Self {
        self.raw_transformer = Some(pipeline);
        self
    }

    pub fn windower(mut self, windower: impl Windower + 'static) -> Self {
        self.windower = Some(Box::new(windower));
        self
    }

    pub fn boxed_windower(mut self, windower: Box<dyn Windower>) -> Self {
        self.windower = Some(windower);
        self
    }

    /// Chain applied to every window.
    pub fn window_transformer(mut self, pipeline: WindowPipeline) -> Self {
        self.window_transformer = Some(pipeline);
        self
    }

    /// `true` (default): apply the window chain on every [`WindowsDataset::get`].
    /// `false`: apply it once to every window while building.
    pub fn transform_online(mut self, online: bool) -> Self {
        self.transform_online = online;
        self
    }

    /// Let the source record where it found the data (default `false`).
    pub fn update_path(mut self, update: bool) -> Self {
        self.update_path = update;
        self
    }

    /// Load every recording of the subject and run the pipeline.
    ///
    /// Errors from the source, any transform step or the windower are
    /// returned unchanged.
    pub fn build(self, source: &dyn RecordingSource) -> Result<WindowsDataset> {
        let windower = self.windower.ok_or(Error::MissingWindower)?;
        let recordings = source.load_subject(self.subject, self.update_path)?;
        info!(
            "{}: subject {} → {} recording(s)",
            source.code(), self.subject, recordings.len()
        );

        let mut windows: Vec<Window> = Vec::new();
        for (i, raw) in recordings.into_iter().enumerate() {
            let raw = match &self.raw_transformer {
                Some(chain) => chain.transform(raw)?,
                None => raw,
            };
            let w = windower.windows(&raw)?;
            debug!("recording {i}: {} ch × {} samples → {} windows", raw.n_channels(), raw.n_times(), w.len());
            windows.extend(w);
        }

        if !self.transform_online {
            if let Some(chain) = &self.window_transformer {
                windows = windows
                    .into_iter()
                    .map(|w| -> Result<Window> { Ok(Window { data: chain.transform(w.data)?, label: w.label }) })
                    .collect::<Result<_>>()?;
            }
        }

        info!(
            "subject {}: {} windows (window transforms {})",
            self.subject,
            windows.len(),
            if self.transform_online { "online" } else { "precomputed" }
        );
        Ok(WindowsDataset {
            subject: self.subject,
            windows,
            raw_transformer: self.raw_transformer,
            windower,
            window_transformer: self.window_transformer,
            transform_online: self.transform_online,
        })
    }
}

/// Indexed `(window, label)` pairs for one subject.
///
/// The dataset keeps the raw chain, windower and window chain it was built
/// with for as long as it lives.
pub struct WindowsDataset {
    subject: u32,
    windows: Vec<Window>,
    raw_transformer: Option<RawPipeline>,
    windower: Box<dyn Windower>,
    window_transformer: Option<WindowPipeline>,
    transform_online: bool,
}

impl WindowsDataset {
    /// Start configuring a dataset for `subject`.
    pub fn builder(subject: u32) -> DatasetBuilder {
        DatasetBuilder {
            subject,
            raw_transformer: None,
            windower: None,
            window_transformer: None,
            transform_online: true,
            update_path: false,
        }
    }

    pub fn subject(&self) -> u32 {
        self.subject
    }

    pub fn transform_online(&self) -> bool {
        self.transform_online
    }

    pub fn raw_transformer(&self) -> Option<&RawPipeline> {
        self.raw_transformer.as_ref()
    }

    pub fn windower(&self) -> &dyn Windower {
        self.windower.as_ref()
    }

    pub fn window_transformer(&self) -> Option<&WindowPipeline> {
        self.window_transformer.as_ref()
    }

    /// Total number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Label of every window, in index order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.windows.iter().map(|w| w.label.as_str())
    }

    /// The window at `index` with its label.
    ///
    /// In online mode the window chain runs on a copy of the stored window
    /// at every call; the stored window itself never changes.
    pub fn get(&self, index: usize) -> Result<(Array2<f32>, &str)> {
        let w = self
            .windows
            .get(index)
            .ok_or(Error::IndexOutOfRange { index, len: self.windows.len() })?;
        let x = match (&self.window_transformer, self.transform_online) {
            (Some(chain), true) => chain.transform(w.data.clone())?,
            _ => w.data.clone(),
        };
        Ok((x, w.label.as_str()))
    }

    /// Iterate over `get(0)`, `get(1)`, …
    pub fn iter(&self) -> impl Iterator<Item = Result<(Array2<f32>, &str)>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

impl std::fmt::Debug for WindowsDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsDataset")
            .field("subject", &self.subject)
            .field("n_windows", &self.windows.len())
            .field("raw_transformer", &self.raw_transformer)
            .field("window_transformer", &self.window_transformer)
            .field("transform_online", &self.transform_online)
            .finish()
    }
}
