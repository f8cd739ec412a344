//! Cutting continuous recordings into fixed-length labelled windows.
//!
//! Two windowers are provided:
//!
//! - [`EventWindower`]: windows locked to event markers, labelled through a
//!   [`LabelMapping`]. Each mapped event defines a trial span; the span is
//!   tiled with windows of `window_size_samples`, one every
//!   `chunk_duration_samples`.
//! - [`FixedLengthWindower`]: tiles the whole recording, every window
//!   carrying the same recording-level label.
//!
//! Windowers materialise every window of a recording at once.
//!
//! ```text
//! onset+tmin                                  span end
//!    │◄──────────────── trial span ───────────────►│
//!    ├──── w ────┤
//!    │   chunk   ├──── w ────┤
//!    │           │   chunk   ├──── w ────┤  …
//! ```
use anyhow::Result;
use log::debug;
use ndarray::{s, Array2};
use std::collections::BTreeMap;

use crate::error::Error;
use crate::raw::{Event, RawRecording};

// ── Label mapping ────────────────────────────────────────────────────────────

/// Event code → class name.
///
/// Keys are unique; iteration is in ascending code order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMapping(BTreeMap<i32, String>);

impl LabelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four BCI Competition IV 2a motor-imagery classes:
    /// `{1: "Left hand", 2: "Right hand", 3: "Foot", 4: "Tongue"}`.
    pub fn motor_imagery() -> Self {
        [(1, "Left hand"), (2, "Right hand"), (3, "Foot"), (4, "Tongue")]
            .into_iter()
            .collect()
    }

    /// Parse a string-keyed table (as read from TOML/JSON) into a mapping.
    ///
    /// Two keys naming the same code (`"1"` and `"01"`) are rejected.
    pub fn from_string_keys(table: &BTreeMap<String, String>) -> Result<Self> {
        let mut out = BTreeMap::new();
        for (k, v) in table {
            let code: i32 = k
                .trim()
                .parse()
                .map_err(|_| Error::InvalidLabelCode(k.clone()))?;
            if out.insert(code, v.clone()).is_some() {
                return Err(Error::DuplicateLabelCode(code).into());
            }
        }
        Ok(Self(out))
    }

    /// Insert or replace the name for `code`.
    pub fn insert(&mut self, code: i32, name: impl Into<String>) -> Option<String> {
        self.0.insert(code, name.into())
    }

    pub fn get(&self, code: i32) -> Option<&str> {
        self.0.get(&code).map(String::as_str)
    }

    pub fn contains(&self, code: i32) -> bool {
        self.0.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.0.iter().map(|(&k, v)| (k, v.as_str()))
    }

    /// Class names in code order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(i32, S)> for LabelMapping {
    fn from_iter<I: IntoIterator<Item = (i32, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<BTreeMap<i32, String>> for LabelMapping {
    fn from(map: BTreeMap<i32, String>) -> Self {
        Self(map)
    }
}

// ── Windows ──────────────────────────────────────────────────────────────────

/// One labelled window: `data` is [C, window_size_samples].
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub data: Array2<f32>,
    pub label: String,
}

/// Turns a continuous recording into labelled windows.
pub trait Windower: Send + Sync {
    fn windows(&self, raw: &RawRecording) -> Result<Vec<Window>>;
}

/// What to do with an event whose code has no entry in the mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedEvent {
    /// Skip the event.
    #[default]
    Ignore,
    /// Fail with [`Error::UnmappedEvent`].
    Error,
}

// ── Event-locked windows ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct EventWindower {
    window_size_samples: usize,
    tmin_samples: i64,
    chunk_duration_samples: usize,
    trial_duration_samples: Option<usize>,
    mapping: LabelMapping,
    on_unmapped: UnmappedEvent,
}

impl EventWindower {
    /// * `window_size_samples` – columns of every window.
    /// * `tmin_samples` – offset of the trial span relative to the event onset
    ///   (negative starts before the event).
    /// * `chunk_duration_samples` – distance between consecutive window starts.
    /// * `mapping` – events whose code is a key produce windows labelled with
    ///   the corresponding value.
    ///
    /// The trial span length defaults to the event's own duration (at least
    /// one window); see [`with_trial_duration`](Self::with_trial_duration).
    pub fn new(
        window_size_samples: usize,
        tmin_samples: i64,
        chunk_duration_samples: usize,
        mapping: LabelMapping,
    ) -> Result<Self> {
        if window_size_samples == 0 {
            return Err(Error::InvalidWindower("window_size_samples must be > 0".into()).into());
        }
        if chunk_duration_samples == 0 {
            return Err(Error::InvalidWindower("chunk_duration_samples must be > 0".into()).into());
        }
        if mapping.is_empty() {
            return Err(Error::InvalidWindower("label mapping is empty".into()).into());
        }
        Ok(Self {
            window_size_samples,
            tmin_samples,
            chunk_duration_samples,
            trial_duration_samples: None,
            mapping,
            on_unmapped: UnmappedEvent::default(),
        })
    }

    /// Use a fixed trial span length instead of each event's duration.
    pub fn with_trial_duration(mut self, samples: usize) -> Self {
        self.trial_duration_samples = Some(samples);
        self
    }

    pub fn with_unmapped(mut self, policy: UnmappedEvent) -> Self {
        self.on_unmapped = policy;
        self
    }

    pub fn window_size_samples(&self) -> usize {
        self.window_size_samples
    }

    pub fn mapping(&self) -> &LabelMapping {
        &self.mapping
    }

    /// Trial span `[start, end)` for `ev`, in (possibly negative) samples.
    fn span(&self, ev: &Event) -> (i64, i64) {
        let len = self
            .trial_duration_samples
            .unwrap_or_else(|| ev.duration.max(self.window_size_samples));
        let start = ev.onset as i64 + self.tmin_samples;
        (start, start + len as i64)
    }
}

impl Windower for EventWindower {
    fn windows(&self, raw: &RawRecording) -> Result<Vec<Window>> {
        let n_t = raw.n_times() as i64;
        let w = self.window_size_samples as i64;
        let step = self.chunk_duration_samples as i64;

        let mut out = Vec::new();
        let mut dropped = 0_usize;
        for ev in &raw.events {
            let Some(label) = self.mapping.get(ev.code) else {
                match self.on_unmapped {
                    UnmappedEvent::Ignore => {
                        debug!("skipping unmapped event code {} at sample {}", ev.code, ev.onset);
                        continue;
                    }
                    UnmappedEvent::Error => {
                        return Err(Error::UnmappedEvent { code: ev.code, onset: ev.onset }.into());
                    }
                }
            };

            let (span_start, span_end) = self.span(ev);
            let mut start = span_start;
            while start + w <= span_end {
                if start < 0 || start + w > n_t {
                    dropped += 1;
                } else {
                    let (a, b) = (start as usize, (start + w) as usize);
                    out.push(Window {
                        data: raw.data.slice(s![.., a..b]).to_owned(),
                        label: label.to_string(),
                    });
                }
                start += step;
            }
        }
        if dropped > 0 {
            debug!("dropped {dropped} windows extending past the recording ({n_t} samples)");
        }
        Ok(out)
    }
}

// ── Fixed-length windows ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FixedLengthWindower {
    window_size_samples: Option<usize>,
    overlap_size_samples: usize,
    label: String,
}

impl FixedLengthWindower {
    /// `window_size_samples = None` produces one window spanning the whole
    /// recording. Consecutive windows overlap by `overlap_size_samples`.
    pub fn new(
        window_size_samples: Option<usize>,
        overlap_size_samples: usize,
        label: impl Into<String>,
    ) -> Result<Self> {
        match window_size_samples {
            Some(0) => {
                return Err(Error::InvalidWindower("window_size_samples must be > 0".into()).into())
            }
            Some(w) if overlap_size_samples >= w => {
                return Err(Error::InvalidWindower(format!(
                    "overlap ({overlap_size_samples}) must be smaller than the window ({w})"
                ))
                .into())
            }
            None if overlap_size_samples > 0 => {
                return Err(Error::InvalidWindower(
                    "overlap requires an explicit window size".into(),
                )
                .into())
            }
            _ => {}
        }
        Ok(Self { window_size_samples, overlap_size_samples, label: label.into() })
    }
}

impl Windower for FixedLengthWindower {
    fn windows(&self, raw: &RawRecording) -> Result<Vec<Window>> {
        let n_t = raw.n_times();
        let w = self.window_size_samples.unwrap_or(n_t);
        if w == 0 || w > n_t {
            return Ok(vec![]);
        }
        let step = w - self.overlap_size_samples;
        let n_windows = (n_t - w) / step + 1;
        Ok((0..n_windows)
            .map(|i| {
                let a = i * step;
                Window {
                    data: raw.data.slice(s![.., a..a + w]).to_owned(),
                    label: self.label.clone(),
                }
            })
            .collect())
    }
}
