//! Safetensors I/O for recordings and windowed datasets.
//!
//! Recording layout (`RawRecording::load` / `RawRecording::save`):
//!
//! | key        | dtype | shape    | notes                          |
//! |------------|-------|----------|--------------------------------|
//! | `data`     | F32   | [C, T]   |                                |
//! | `sfreq`    | F32   | [1]      | Hz                             |
//! | `events`   | I32   | [E, 3]   | optional: onset, duration, code|
//! | `ch_names` | U8    | [n]      | optional, newline-joined UTF-8 |
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;

use crate::dataset::WindowsDataset;
use crate::raw::{Event, RawRecording};

// ── Low-level safetensors parser (raw bytes → ndarray, no tensor types) ──────

struct Entry {
    dtype: String,
    shape: Vec<usize>,
    start: usize,
    end: usize,
}

struct StFile {
    bytes: Vec<u8>,
    data_start: usize,
    entries: HashMap<String, Entry>,
}

impl StFile {
    fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        if bytes.len() < 8 {
            bail!("{}: safetensors file too small", path.display());
        }
        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[..8]);
        let n = u64::from_le_bytes(len) as usize;
        let header_end = 8usize.checked_add(n).filter(|&e| e <= bytes.len())
            .with_context(|| format!("{}: truncated safetensors header", path.display()))?;
        let header: HashMap<String, serde_json::Value> =
            serde_json::from_slice(&bytes[8..header_end])
                .context("failed to parse safetensors header")?;

        let mut entries = HashMap::new();
        for (key, val) in header {
            if key == "__metadata__" { continue; }
            entries.insert(key.clone(), parse_entry(&key, &val)?);
        }
        let file = Self { bytes, data_start: header_end, entries };
        for (key, e) in &file.entries {
            let in_file = header_end
                .checked_add(e.end)
                .is_some_and(|end| e.start <= e.end && end <= file.bytes.len());
            if !in_file {
                bail!("{}: tensor `{key}` points outside the file", path.display());
            }
            if let Some(size) = dtype_size(&e.dtype) {
                let expected = e.shape.iter()
                    .try_fold(size, |acc, &d| acc.checked_mul(d))
                    .with_context(|| format!("{}: tensor `{key}` shape overflows", path.display()))?;
                if e.end - e.start != expected {
                    bail!(
                        "{}: tensor `{key}` holds {} bytes, shape {:?} of {} needs {expected}",
                        path.display(), e.end - e.start, e.shape, e.dtype
                    );
                }
            }
        }
        Ok(file)
    }

    fn raw(&self, key: &str, dtype: &str) -> Result<Option<(&[u8], &[usize])>> {
        let Some(e) = self.entries.get(key) else { return Ok(None) };
        if e.dtype != dtype {
            bail!("tensor `{key}`: expected dtype {dtype}, found {}", e.dtype);
        }
        let bytes = &self.bytes[self.data_start + e.start..self.data_start + e.end];
        Ok(Some((bytes, &e.shape)))
    }

    fn f32(&self, key: &str) -> Result<Option<(Vec<f32>, Vec<usize>)>> {
        Ok(self.raw(key, "F32")?.map(|(b, shape)| {
            let v = b.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
            (v, shape.to_vec())
        }))
    }

    fn i32(&self, key: &str) -> Result<Option<(Vec<i32>, Vec<usize>)>> {
        Ok(self.raw(key, "I32")?.map(|(b, shape)| {
            let v = b.chunks_exact(4).map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
            (v, shape.to_vec())
        }))
    }

    fn text(&self, key: &str) -> Result<Option<String>> {
        match self.raw(key, "U8")? {
            Some((b, _)) => Ok(Some(std::str::from_utf8(b).context("non-UTF-8 text tensor")?.to_string())),
            None => Ok(None),
        }
    }
}

/// Bytes per element for the dtypes this crate reads and writes.
fn dtype_size(dtype: &str) -> Option<usize> {
    match dtype {
        "U8" | "I8" | "BOOL" => Some(1),
        "F16" | "BF16" | "I16" => Some(2),
        "F32" | "I32" => Some(4),
        "F64" | "I64" => Some(8),
        _ => None,
    }
}

fn parse_entry(key: &str, val: &serde_json::Value) -> Result<Entry> {
    let dtype = val["dtype"].as_str()
        .with_context(|| format!("tensor `{key}`: missing dtype"))?
        .to_string();
    let shape = val["shape"].as_array()
        .with_context(|| format!("tensor `{key}`: missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<Vec<_>>>()
        .with_context(|| format!("tensor `{key}`: bad shape"))?;
    let offsets = val["data_offsets"].as_array()
        .filter(|o| o.len() == 2)
        .with_context(|| format!("tensor `{key}`: missing data_offsets"))?;
    let start = offsets[0].as_u64().with_context(|| format!("tensor `{key}`: bad offset"))? as usize;
    let end = offsets[1].as_u64().with_context(|| format!("tensor `{key}`: bad offset"))? as usize;
    Ok(Entry { dtype, shape, start, end })
}

// ── Recordings ───────────────────────────────────────────────────────────────

impl RawRecording {
    /// Load a recording written by [`RawRecording::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let st = StFile::read(path)?;

        let (data_vec, shape) = st.f32("data")?.context("missing 'data' key")?;
        if shape.len() != 2 {
            bail!("'data' must be 2-D [C, T], got shape {shape:?}");
        }
        let data = Array2::from_shape_vec((shape[0], shape[1]), data_vec)?;

        let (sfreq, _) = st.f32("sfreq")?.context("missing 'sfreq' key")?;
        let sfreq = *sfreq.first().context("empty 'sfreq' tensor")?;

        let events = match st.i32("events")? {
            Some((flat, shape)) => {
                if shape.len() != 2 || shape[1] != 3 {
                    bail!("'events' must be [E, 3], got shape {shape:?}");
                }
                flat.chunks_exact(3)
                    .map(|r| -> Result<Event> {
                        let onset = usize::try_from(r[0]).context("negative event onset")?;
                        let duration = usize::try_from(r[1]).context("negative event duration")?;
                        Ok(Event::new(onset, duration, r[2]))
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            None => vec![],
        };

        let ch_names = st.text("ch_names")?
            .map(|s| s.split('\n').filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();

        Ok(RawRecording::new(data, sfreq).with_ch_names(ch_names).with_events(events))
    }

    /// Write the recording in the layout read by [`RawRecording::load`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut w = StWriter::new();
        w.add_f32_arr2("data", &self.data);
        w.add_f32("sfreq", &[self.sfreq], &[1]);
        if !self.events.is_empty() {
            let flat = self.events.iter()
                .map(|e| -> Result<[i32; 3]> {
                    Ok([i32::try_from(e.onset)?, i32::try_from(e.duration)?, e.code])
                })
                .collect::<Result<Vec<_>>>()
                .context("event sample index does not fit in i32")?
                .concat();
            w.add_i32("events", &flat, &[self.events.len(), 3]);
        }
        if !self.ch_names.is_empty() {
            w.add_text("ch_names", &self.ch_names.join("\n"));
        }
        w.write(path)
    }
}

// ── Generic safetensors builder ──────────────────────────────────────────────

/// Simple safetensors file writer that handles F32, I32 and U8 tensors.
///
/// ```rust,no_run
/// use epochset::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("signal", &[1.0f32, 2.0, 3.0], &[1, 3]);
/// w.add_text("note", "hello");
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    pub fn add_f32_arr2(&mut self, name: &str, arr: &Array2<f32>) {
        let data: Vec<f32> = arr.iter().copied().collect();
        self.add_f32(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    /// UTF-8 text stored as a 1-D U8 tensor.
    pub fn add_text(&mut self, name: &str, text: &str) {
        let bytes = text.as_bytes().to_vec();
        let n = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![n]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Dataset writer ───────────────────────────────────────────────────────────

/// Write every window of `dataset` (after its window transformer) to `path`.
///
/// Keys: `x_<i>` [C, W] F32, `labels` U8 (newline-joined), `n_windows` [1] I32.
pub fn write_windows(dataset: &WindowsDataset, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    let mut labels = Vec::with_capacity(dataset.len());
    for (i, item) in dataset.iter().enumerate() {
        let (x, y) = item?;
        w.add_f32_arr2(&format!("x_{i}"), &x);
        labels.push(y);
    }
    w.add_text("labels", &labels.join("\n"));
    w.add_i32("n_windows", &[i32::try_from(labels.len())?], &[1]);
    w.write(path)
}

/// Read back the labels and window count written by [`write_windows`].
pub fn read_window_labels(path: &Path) -> Result<Vec<String>> {
    let st = StFile::read(path)?;
    let labels: Vec<String> = st.text("labels")?
        .context("missing 'labels' key")?
        .split('\n')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let (n, _) = st.i32("n_windows")?.context("missing 'n_windows' key")?;
    if n.first().copied() != Some(labels.len() as i32) {
        bail!("'n_windows' {:?} disagrees with {} labels", n, labels.len());
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.safetensors");
        let data = Array2::from_shape_fn((3, 17), |(c, t)| c as f32 - t as f32 * 0.5);
        let raw = RawRecording::new(data.clone(), 250.0)
            .with_ch_names(vec!["C3".into(), "Cz".into(), "C4".into()])
            .with_events(vec![Event::new(2, 5, 1), Event::new(9, 0, 4)]);
        raw.save(&path).unwrap();

        let back = RawRecording::load(&path).unwrap();
        assert_eq!(back.data, data);
        assert_eq!(back.sfreq, 250.0);
        assert_eq!(back.ch_names, raw.ch_names);
        assert_eq!(back.events, raw.events);
    }

    #[test]
    fn missing_optional_keys_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.safetensors");
        let mut w = StWriter::new();
        w.add_f32("data", &[0.0; 6], &[2, 3]);
        w.add_f32("sfreq", &[128.0], &[1]);
        w.write(&path).unwrap();

        let raw = RawRecording::load(&path).unwrap();
        assert_eq!(raw.data.dim(), (2, 3));
        assert!(raw.events.is_empty());
        assert!(raw.ch_names.is_empty());
    }

    #[test]
    fn wrong_dtype_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");
        let mut w = StWriter::new();
        w.add_i32("data", &[0; 6], &[2, 3]);
        w.add_f32("sfreq", &[128.0], &[1]);
        w.write(&path).unwrap();
        assert!(RawRecording::load(&path).is_err());
    }

    /// Raw safetensors bytes from a JSON header and a data section.
    fn st_bytes(header: &str, data: &[u8]) -> Vec<u8> {
        let mut out = (header.len() as u64).to_le_bytes().to_vec();
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn overflowing_offsets_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.safetensors");
        let header = r#"{"data":{"dtype":"F32","shape":[1,1],"data_offsets":[0,18446744073709551615]},"sfreq":{"dtype":"F32","shape":[1],"data_offsets":[0,4]}}"#;
        std::fs::write(&path, st_bytes(header, &[0u8; 4])).unwrap();
        let err = RawRecording::load(&path).unwrap_err();
        assert!(err.to_string().contains("outside the file"), "{err}");
    }

    #[test]
    fn tensor_shorter_than_shape_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short_tensor.safetensors");
        // [2, 3] F32 needs 24 bytes, only 8 are declared
        let header = r#"{"data":{"dtype":"F32","shape":[2,3],"data_offsets":[0,8]},"sfreq":{"dtype":"F32","shape":[1],"data_offsets":[8,12]}}"#;
        std::fs::write(&path, st_bytes(header, &[0u8; 12])).unwrap();
        let err = RawRecording::load(&path).unwrap_err();
        assert!(err.to_string().contains("needs 24"), "{err}");
    }

    #[test]
    fn truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.safetensors");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert!(RawRecording::load(&path).is_err());
    }
}
