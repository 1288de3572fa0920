//! Signal table: one row per (event, channel) recording.
//!
//! Persisted as a safetensors file with the columns
//!
//! ```text
//!   id, event, code, size   I64 [n]
//!   channel                 U8  newline-joined labels
//!   signal                  F64 [total samples]  (rows concatenated)
//!   signal_offsets          I64 [n + 1]          row i = signal[off[i]..off[i+1]]
//! ```
use std::collections::HashSet;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::io::{StFile, StWriter};

/// One raw record: a single channel's samples for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: i64,
    pub event: i64,
    pub channel: String,
    pub code: i64,
    /// Sample count reported by the device; also used as sampling-rate proxy.
    pub size: usize,
    pub signal: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalTable {
    pub records: Vec<RawRecord>,
}

impl SignalTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique channel labels in order of first appearance.
    pub fn channels(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.channel.as_str()))
            .map(|r| r.channel.clone())
            .collect()
    }

    /// Unique event ids in order of first appearance.
    pub fn events(&self) -> Vec<i64> {
        let mut seen: HashSet<i64> = HashSet::new();
        self.records.iter().map(|r| r.event).filter(|&e| seen.insert(e)).collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let n = self.records.len();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut flat = Vec::new();
        offsets.push(0_i64);
        for r in &self.records {
            flat.extend_from_slice(&r.signal);
            offsets.push(flat.len() as i64);
        }
        let col = |f: fn(&RawRecord) -> i64| -> Vec<i64> { self.records.iter().map(f).collect() };

        let mut w = StWriter::new();
        w.set_metadata("artifact", "signal_table");
        w.add_i64("id", &col(|r| r.id), &[n]);
        w.add_i64("event", &col(|r| r.event), &[n]);
        w.add_i64("code", &col(|r| r.code), &[n]);
        w.add_i64("size", &col(|r| r.size as i64), &[n]);
        let channels: Vec<String> = self.records.iter().map(|r| r.channel.clone()).collect();
        w.add_strings("channel", &channels);
        w.add_f64("signal", &flat, &[flat.len()]);
        w.add_i64("signal_offsets", &offsets, &[n + 1]);
        w.write(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = StFile::open(path)?;
        let (ids, _) = f.i64("id")?;
        let (events, _) = f.i64("event")?;
        let (codes, _) = f.i64("code")?;
        let (sizes, _) = f.i64("size")?;
        let (flat, _) = f.f64("signal")?;
        let (offsets, _) = f.i64("signal_offsets")?;
        let n = ids.len();
        let channels = if n == 0 { vec![] } else { f.strings("channel")? };

        if [events.len(), codes.len(), sizes.len(), channels.len()].iter().any(|&l| l != n)
            || offsets.len() != n + 1
        {
            return Err(PipelineError::format(path, "signal table columns have different lengths"));
        }

        let mut records = Vec::with_capacity(n);
        for i in 0..n {
            let (s, e) = (offsets[i], offsets[i + 1]);
            if s < 0 || e < s || e as usize > flat.len() {
                return Err(PipelineError::format(path, format!("row {i}: bad signal offsets {s}..{e}")));
            }
            if sizes[i] < 0 {
                return Err(PipelineError::format(path, format!("row {i}: negative size")));
            }
            records.push(RawRecord {
                id: ids[i],
                event: events[i],
                channel: channels[i].clone(),
                code: codes[i],
                size: sizes[i] as usize,
                signal: flat[s as usize..e as usize].to_vec(),
            });
        }
        Ok(Self { records })
    }
}
