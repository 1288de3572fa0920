//! Safetensors I/O for the between-stage artifacts.
//!
//! Every artifact (signal table, epoch tensor, feature matrix) is a
//! safetensors file:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬──────────────────────┐
//! │ n : u64 (LE) │ JSON header (n bytes, padded)│ raw LE tensor bytes  │
//! └──────────────┴──────────────────────────────┴──────────────────────┘
//! ```
//!
//! The header maps tensor names to `{dtype, shape, data_offsets}` plus an
//! optional `__metadata__` string map.  String lists (channel names) are
//! stored as a `U8` tensor of newline-joined UTF-8.
//!
//! Files are written atomically: the bytes go to a temporary file in the
//! destination directory which is renamed over the target only once complete.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

const METADATA_KEY: &str = "__metadata__";

// ── Writer ────────────────────────────────────────────────────────────────────

/// Safetensors file builder for F64, I64 and U8 tensors.
///
/// ```rust,no_run
/// use eegpipe::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0, 2.0, 3.0], &[1, 3]);
/// w.add_strings("ch_names", &["O1".to_string(), "O2".to_string()]);
/// w.set_metadata("kind", "example");
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
    metadata: BTreeMap<String, String>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I64", shape.to_vec()));
    }

    /// Store a list of strings as one newline-joined `U8` tensor.
    pub fn add_strings(&mut self, name: &str, values: &[String]) {
        let bytes = values.join("\n").into_bytes();
        let len = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![len]));
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Serialise to `path`, replacing any existing file atomically.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut header_map = serde_json::Map::new();
        if !self.metadata.is_empty() {
            let meta: serde_json::Map<String, serde_json::Value> = self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            header_map.insert(METADATA_KEY.to_string(), serde_json::Value::Object(meta));
        }
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)
            .map_err(|e| PipelineError::Internal(e.into()))?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();

        write_atomic(path, |f| {
            f.write_all(&(padded.len() as u64).to_le_bytes())?;
            f.write_all(&padded)?;
            for (_, data, _, _) in &self.entries {
                f.write_all(data)?;
            }
            Ok(())
        })
    }
}

/// Write through a temporary sibling file and rename it into place.
///
/// A failure at any point leaves no file at `path` (or the previous one
/// untouched).
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut std::io::BufWriter<&std::fs::File>) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| PipelineError::io(&dir, e))?;
    {
        let mut w = std::io::BufWriter::new(tmp.as_file());
        fill(&mut w).map_err(|e| PipelineError::io(path, e))?;
        w.flush().map_err(|e| PipelineError::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// A safetensors file loaded into memory.
pub struct StFile {
    path: PathBuf,
    bytes: Vec<u8>,
    header: serde_json::Map<String, serde_json::Value>,
    data_start: usize,
}

impl StFile {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        if bytes.len() < 8 {
            return Err(PipelineError::format(path, "file too small for a safetensors header"));
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[..8]);
        let n = u64::from_le_bytes(len_bytes);
        let n = match usize::try_from(n) {
            Ok(n) if n <= bytes.len() - 8 => n,
            _ => return Err(PipelineError::format(path, format!("header length {n} exceeds file size"))),
        };
        let header: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&bytes[8..8 + n])
                .map_err(|e| PipelineError::format(path, format!("bad header: {e}")))?;
        Ok(Self { path: path.to_path_buf(), bytes, header, data_start: 8 + n })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tensor names (metadata excluded), sorted.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.header.keys().filter(|k| k.as_str() != METADATA_KEY)
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.header.get(METADATA_KEY)?.get(key)?.as_str()
    }

    /// Raw payload, dtype and shape of tensor `name`.
    fn entry(&self, name: &str) -> Result<(&str, Vec<usize>, &[u8])> {
        let bad = |msg: &str| PipelineError::format(&self.path, format!("tensor `{name}`: {msg}"));
        let entry = self.header.get(name).ok_or_else(|| bad("missing"))?;
        let dtype = entry["dtype"].as_str().ok_or_else(|| bad("no dtype"))?;
        let shape = entry["shape"]
            .as_array()
            .ok_or_else(|| bad("no shape"))?
            .iter()
            .map(|v| v.as_u64().map(|d| d as usize))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(|| bad("non-integer shape"))?;
        let offsets = entry["data_offsets"].as_array().ok_or_else(|| bad("no data_offsets"))?;
        let (s, e) = match (offsets.first().and_then(|v| v.as_u64()), offsets.get(1).and_then(|v| v.as_u64())) {
            (Some(s), Some(e)) if s <= e => (s, e),
            _ => return Err(bad("invalid data_offsets")),
        };
        let payload = (self.bytes.len() - self.data_start) as u64;
        if e > payload {
            return Err(bad("data past end of file"));
        }
        let (s, e) = (s as usize, e as usize);
        Ok((dtype, shape, &self.bytes[self.data_start + s..self.data_start + e]))
    }

    pub fn f64(&self, name: &str) -> Result<(Vec<f64>, Vec<usize>)> {
        let (dtype, shape, raw) = self.entry(name)?;
        self.expect_dtype(name, dtype, "F64", raw.len(), 8, &shape)?;
        let vals = raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect();
        Ok((vals, shape))
    }

    pub fn i64(&self, name: &str) -> Result<(Vec<i64>, Vec<usize>)> {
        let (dtype, shape, raw) = self.entry(name)?;
        self.expect_dtype(name, dtype, "I64", raw.len(), 8, &shape)?;
        let vals = raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect();
        Ok((vals, shape))
    }

    /// Newline-joined string list written by [`StWriter::add_strings`].
    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        let (dtype, _shape, raw) = self.entry(name)?;
        if dtype != "U8" {
            return Err(PipelineError::format(&self.path, format!("tensor `{name}`: expected U8, got {dtype}")));
        }
        let text = std::str::from_utf8(raw)
            .map_err(|e| PipelineError::format(&self.path, format!("tensor `{name}`: {e}")))?;
        if text.is_empty() {
            return Ok(vec![]);
        }
        Ok(text.split('\n').map(String::from).collect())
    }

    fn expect_dtype(
        &self,
        name: &str,
        dtype: &str,
        want: &str,
        n_bytes: usize,
        width: usize,
        shape: &[usize],
    ) -> Result<()> {
        if dtype != want {
            return Err(PipelineError::format(&self.path, format!("tensor `{name}`: expected {want}, got {dtype}")));
        }
        let n_elems: usize = shape.iter().product();
        if n_bytes != n_elems * width {
            return Err(PipelineError::format(
                &self.path,
                format!("tensor `{name}`: {n_bytes} bytes do not match shape {shape:?}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reader_agree_on_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.safetensors");
        let mut w = StWriter::new();
        w.add_f64("x", &[1.5, -2.0, 3.25, 0.0], &[2, 2]);
        w.add_i64("ids", &[7, -1], &[2]);
        w.add_strings("names", &["Fp1".to_string(), "O2".to_string()]);
        w.set_metadata("stage", "test");
        w.write(&path).unwrap();

        let f = StFile::open(&path).unwrap();
        let (x, shape) = f.f64("x").unwrap();
        assert_eq!(shape, vec![2, 2]);
        assert_eq!(x, vec![1.5, -2.0, 3.25, 0.0]);
        assert_eq!(f.i64("ids").unwrap().0, vec![7, -1]);
        assert_eq!(f.strings("names").unwrap(), vec!["Fp1", "O2"]);
        assert_eq!(f.metadata("stage"), Some("test"));
        assert_eq!(f.names().count(), 3);
    }

    #[test]
    fn header_is_eight_byte_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.safetensors");
        let mut w = StWriter::new();
        w.add_f64("a", &[1.0], &[1]);
        w.write(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let n = u64::from_le_bytes(bytes[..8].try_into().unwrap());
        assert_eq!(n % 8, 0);
    }

    fn raw_file(dir: &Path, header_len: u64, header: &str, payload: &[u8]) -> PathBuf {
        let path = dir.join("corrupt.safetensors");
        let mut bytes = header_len.to_le_bytes().to_vec();
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(payload);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn oversized_header_length_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = raw_file(dir.path(), u64::MAX, "{}", &[]);
        assert!(matches!(StFile::open(&path), Err(PipelineError::Format { .. })));
        let err = crate::table::SignalTable::load(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::INPUT_ERROR);
    }

    #[test]
    fn offsets_past_payload_are_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let header = r#"{"x":{"dtype":"F64","shape":[1],"data_offsets":[0,18446744073709551615]}}"#;
        let path = raw_file(dir.path(), header.len() as u64, header, &[0u8; 8]);
        let f = StFile::open(&path).unwrap();
        assert!(matches!(f.f64("x"), Err(PipelineError::Format { .. })));

        let header = r#"{"x":{"dtype":"F64","shape":[2],"data_offsets":[0,16]}}"#;
        let path = raw_file(dir.path(), header.len() as u64, header, &[0u8; 8]);
        let f = StFile::open(&path).unwrap();
        assert!(matches!(f.f64("x"), Err(PipelineError::Format { .. })));
    }

    #[test]
    fn missing_tensor_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.safetensors");
        StWriter::new().write(&path).unwrap();
        let f = StFile::open(&path).unwrap();
        assert!(matches!(f.f64("data"), Err(PipelineError::Format { .. })));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.safetensors");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert!(matches!(StFile::open(&path), Err(PipelineError::Format { .. })));
    }
}
