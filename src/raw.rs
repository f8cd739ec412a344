//! Continuous (unsegmented) recordings and their event markers.
use ndarray::Array2;

/// An event marker on the recording timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Sample index of the event onset.
    pub onset: usize,
    /// Duration in samples (`0` for instantaneous markers).
    pub duration: usize,
    /// Integer event code, looked up in a [`LabelMapping`](crate::LabelMapping).
    pub code: i32,
}

impl Event {
    pub fn new(onset: usize, duration: usize, code: i32) -> Self {
        Self { onset, duration, code }
    }
}

/// A continuous multi-channel recording.
///
/// `data` is `[C, T]` in whatever units the source delivered. Raw-stage
/// transformers take a recording by value and hand back a (possibly) modified
/// one; `sfreq`, channel names and events travel along untouched unless a
/// transformer explicitly changes them.
#[derive(Debug, Clone)]
pub struct RawRecording {
    /// [C, T] signal.
    pub data: Array2<f32>,
    /// Sampling rate in Hz.
    pub sfreq: f32,
    /// Channel names, empty when the source has none.
    pub ch_names: Vec<String>,
    /// Event markers, sorted by onset.
    pub events: Vec<Event>,
}

impl RawRecording {
    pub fn new(data: Array2<f32>, sfreq: f32) -> Self {
        Self { data, sfreq, ch_names: vec![], events: vec![] }
    }

    pub fn with_ch_names(mut self, ch_names: Vec<String>) -> Self {
        self.ch_names = ch_names;
        self
    }

    /// Attach events, sorting them by onset.
    pub fn with_events(mut self, mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.onset);
        self.events = events;
        self
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.n_times() as f32 / self.sfreq
    }
}
