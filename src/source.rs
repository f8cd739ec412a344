//! Where recordings come from.
//!
//! A [`RecordingSource`] hands the dataset every continuous recording of one
//! subject. Two sources ship with the crate:
//!
//! - [`LocalSource`]: safetensors recordings laid out as
//!   `<root>/subject_NN/*.safetensors` (see [`crate::io`] for the file layout).
//! - [`SyntheticSource`]: deterministic motor-imagery-like recordings shaped
//!   like BCI Competition IV 2a (22 channels, 250 Hz, four classes, 4 s
//!   trials), for demos, tests and benchmarks.
use anyhow::{bail, Context, Result};
use log::{debug, info};
use ndarray::Array2;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::raw::{Event, RawRecording};

pub trait RecordingSource {
    /// Short identifier, used in logs and in config keys.
    fn code(&self) -> &str;

    /// Every recording of `subject`, in a stable order.
    ///
    /// `update_path` lets the source remember where the data was found.
    fn load_subject(&self, subject: u32, update_path: bool) -> Result<Vec<RawRecording>>;
}

// ── Local directory ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
    code: String,
    config_file: Option<PathBuf>,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), code: "LOCAL".into(), config_file: None }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// JSON file receiving `EPOCHSET_<CODE>_PATH` when loading with
    /// `update_path = true`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subject_dir(&self, subject: u32) -> PathBuf {
        self.root.join(format!("subject_{subject:02}"))
    }

    /// Key under which the data path is stored in the config file.
    pub fn config_key(&self) -> String {
        format!("EPOCHSET_{}_PATH", self.code.to_uppercase())
    }

    /// Write `recordings` as `run_<iii>.safetensors` into the subject directory.
    ///
    /// Run numbers are zero-padded so file-name order is recording order.
    pub fn write_subject(&self, subject: u32, recordings: &[RawRecording]) -> Result<Vec<PathBuf>> {
        let dir = self.subject_dir(subject);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        recordings
            .iter()
            .enumerate()
            .map(|(i, raw)| -> Result<PathBuf> {
                let path = dir.join(format!("run_{i:03}.safetensors"));
                raw.save(&path)?;
                Ok(path)
            })
            .collect()
    }

    fn store_path_in_config(&self) -> Result<()> {
        let Some(cfg) = &self.config_file else {
            debug!("{}: update_path requested but no config file is set", self.code);
            return Ok(());
        };
        let mut map = if cfg.exists() {
            let text = std::fs::read_to_string(cfg)
                .with_context(|| format!("reading {}", cfg.display()))?;
            match serde_json::from_str::<serde_json::Value>(&text)
                .with_context(|| format!("parsing {}", cfg.display()))?
            {
                serde_json::Value::Object(m) => m,
                _ => bail!("{}: expected a JSON object", cfg.display()),
            }
        } else {
            serde_json::Map::new()
        };
        let root = std::fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        map.insert(self.config_key(), serde_json::Value::String(root.display().to_string()));
        if let Some(parent) = cfg.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(cfg, serde_json::to_string_pretty(&serde_json::Value::Object(map))?)
            .with_context(|| format!("writing {}", cfg.display()))?;
        info!("{}: stored {} in {}", self.code, self.config_key(), cfg.display());
        Ok(())
    }
}

impl RecordingSource for LocalSource {
    fn code(&self) -> &str {
        &self.code
    }

    fn load_subject(&self, subject: u32, update_path: bool) -> Result<Vec<RawRecording>> {
        let dir = self.subject_dir(subject);
        if !dir.is_dir() {
            bail!("{}: no data for subject {subject} (expected {})", self.code, dir.display());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
            .with_context(|| format!("listing {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "safetensors"))
            .collect();
        files.sort();
        if files.is_empty() {
            bail!("{}: {} contains no .safetensors recordings", self.code, dir.display());
        }

        let recordings = files
            .iter()
            .map(|p| RawRecording::load(p).with_context(|| format!("loading {}", p.display())))
            .collect::<Result<Vec<_>>>()?;

        if update_path {
            self.store_path_in_config()?;
        }
        Ok(recordings)
    }
}

// ── Synthetic motor imagery ──────────────────────────────────────────────────

const BCI_IV_2A_CHANNELS: [&str; 22] = [
    "Fz", "FC3", "FC1", "FCz", "FC2", "FC4", "C5", "C3", "C1", "Cz", "C2",
    "C4", "C6", "CP3", "CP1", "CPz", "CP2", "CP4", "P1", "Pz", "P2", "POz",
];

/// Deterministic stand-in for a four-class motor-imagery dataset.
///
/// Each run starts with `rest_samples` of rest, then `n_repetitions` trials
/// of each class code 1–4 in shuffled order, each trial followed by another
/// `rest_samples`. Trial events carry a duration of `trial_samples`.
/// During a class-`k` trial, the k-th quarter of the channels carries an
/// extra oscillation at `8 + k` Hz on top of background alpha and uniform
/// noise. The same `(seed, subject)` always yields the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSource {
    pub n_channels: usize,
    pub sfreq: f32,
    pub n_runs: usize,
    pub n_repetitions: usize,
    pub trial_samples: usize,
    pub rest_samples: usize,
    pub seed: u64,
}

impl Default for SyntheticSource {
    /// 22 ch · 250 Hz · 1 run · 12 repetitions · 4 s trials · 2 s rest.
    fn default() -> Self {
        Self {
            n_channels: 22,
            sfreq: 250.0,
            n_runs: 1,
            n_repetitions: 12,
            trial_samples: 1000,
            rest_samples: 500,
            seed: 42,
        }
    }
}

impl SyntheticSource {
    pub const CODES: [i32; 4] = [1, 2, 3, 4];

    fn ch_names(&self) -> Vec<String> {
        if self.n_channels == BCI_IV_2A_CHANNELS.len() {
            BCI_IV_2A_CHANNELS.iter().map(|s| s.to_string()).collect()
        } else {
            (0..self.n_channels).map(|i| format!("EEG{:03}", i + 1)).collect()
        }
    }

    fn run(&self, rng: &mut StdRng) -> RawRecording {
        let mut codes: Vec<i32> = Self::CODES
            .iter()
            .flat_map(|&c| std::iter::repeat(c).take(self.n_repetitions))
            .collect();
        codes.shuffle(rng);

        let block = self.trial_samples + self.rest_samples;
        let n_t = self.rest_samples + codes.len() * block;
        let events: Vec<Event> = codes
            .iter()
            .enumerate()
            .map(|(i, &code)| Event::new(self.rest_samples + i * block, self.trial_samples, code))
            .collect();

        let group = (self.n_channels / Self::CODES.len()).max(1);
        let mut data = Array2::<f32>::zeros((self.n_channels, n_t));
        for ((c, t), v) in data.indexed_iter_mut() {
            let secs = t as f32 / self.sfreq;
            let alpha = 0.5 * (2.0 * PI * 10.0 * secs + c as f32).sin();
            *v = alpha + rng.gen_range(-1.0_f32..1.0);
        }
        for ev in &events {
            let k = ev.code as usize;
            let freq = 8.0 + k as f32;
            let channels = ((k - 1) * group).min(self.n_channels)..(k * group).min(self.n_channels);
            for c in channels {
                for t in ev.onset..ev.onset + ev.duration {
                    let secs = t as f32 / self.sfreq;
                    data[[c, t]] += 2.0 * (2.0 * PI * freq * secs).sin();
                }
            }
        }

        RawRecording::new(data, self.sfreq)
            .with_ch_names(self.ch_names())
            .with_events(events)
    }
}

impl RecordingSource for SyntheticSource {
    fn code(&self) -> &str {
        "SyntheticMI"
    }

    fn load_subject(&self, subject: u32, _update_path: bool) -> Result<Vec<RawRecording>> {
        if self.n_channels == 0 || self.trial_samples == 0 {
            bail!("synthetic source needs at least one channel and a non-empty trial");
        }
        let mut rng = StdRng::seed_from_u64(self.seed ^ (u64::from(subject) << 32));
        Ok((0..self.n_runs).map(|_| self.run(&mut rng)).collect())
    }
}
