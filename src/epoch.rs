//! Epoch tensor assembly and persistence.
//!
//! A truncated [`SignalTable`] is regrouped into a 3-D array `[E, C, T]`:
//!
//! - events in order of first appearance,
//! - channels in order of first appearance (identical for every event),
//! - `T = target_length = 2 · sfreq`, where `sfreq = size_of_first_record / 2`
//!   is the device's effective sampling rate.
//!
//! An (event, channel) pair with no record is filled with zeros.  Every event
//! gets an onset `position · target_length` and a compact class id assigned
//! to each distinct event code in order of first appearance.
use std::collections::hash_map::{Entry, HashMap};
use std::path::Path;

use ndarray::{s, Array2, Array3, ArrayView1};

use crate::error::{PipelineError, Result};
use crate::io::{StFile, StWriter};
use crate::montage;
use crate::reference::{Projector, ProjectorKind};
use crate::table::{RawRecord, SignalTable};

/// Position of one event in the concatenated epoch timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMarker {
    /// Sample offset `index · target_length`.
    pub onset: usize,
    /// Event id from the raw export.
    pub event: i64,
    /// Index into [`EpochTensor::event_codes`].
    pub class_id: usize,
}

/// Event × channel × time data with its channel and event metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochTensor {
    /// `[E, C, T]` in microvolts.
    pub data: Array3<f64>,
    pub ch_names: Vec<String>,
    /// Effective sampling rate in Hz.
    pub sfreq: f64,
    /// `[C, 3]` electrode positions in metres (origin for unknown sites).
    pub chan_pos: Array2<f64>,
    pub events: Vec<EventMarker>,
    /// Raw event code of each class id.
    pub event_codes: Vec<i64>,
    pub projectors: Vec<Projector>,
}

/// What assembly had to paper over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    /// (event, channel) pairs filled with zeros.
    pub padded: Vec<(i64, String)>,
    /// Channels with no standard 10-20 position.
    pub unplaced: Vec<String>,
    /// (event, channel) pairs that appeared more than once; the first wins.
    pub duplicates: Vec<(i64, String)>,
}

impl EpochTensor {
    pub fn n_epochs(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn n_channels(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn n_times(&self) -> usize {
        self.data.shape()[2]
    }

    /// Index of channel `name`.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.ch_names.iter().position(|c| c == name)
    }

    /// Samples of `channel` in `epoch`.
    pub fn signal(&self, epoch: usize, channel: usize) -> ArrayView1<'_, f64> {
        self.data.slice(s![epoch, channel, ..])
    }

    /// Flatten to `[E · T, C]`: epochs concatenated along time, channels as
    /// columns.
    pub fn to_samples(&self) -> Array2<f64> {
        let (n_e, n_c, n_t) = self.data.dim();
        let mut out = Array2::<f64>::zeros((n_e * n_t, n_c));
        for e in 0..n_e {
            out.slice_mut(s![e * n_t..(e + 1) * n_t, ..])
                .assign(&self.data.slice(s![e, .., ..]).t());
        }
        out
    }

    /// Inverse of [`to_samples`](Self::to_samples) for a tensor of the same
    /// shape; metadata is copied from `self`.
    pub fn with_samples(&self, samples: &Array2<f64>) -> Result<Self> {
        let (n_e, n_c, n_t) = self.data.dim();
        if samples.dim() != (n_e * n_t, n_c) {
            return Err(PipelineError::validation(format!(
                "sample matrix {:?} does not match tensor [{n_e}, {n_c}, {n_t}]",
                samples.dim()
            )));
        }
        let mut data = Array3::<f64>::zeros((n_e, n_c, n_t));
        for e in 0..n_e {
            data.slice_mut(s![e, .., ..])
                .assign(&samples.slice(s![e * n_t..(e + 1) * n_t, ..]).t());
        }
        Ok(Self { data, ..self.clone() })
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    pub fn save(&self, path: &Path) -> Result<()> {
        let (n_e, n_c, n_t) = self.data.dim();
        let mut w = StWriter::new();
        w.set_metadata("artifact", "epoch_tensor");
        let flat: Vec<f64> = self.data.iter().copied().collect();
        w.add_f64("data", &flat, &[n_e, n_c, n_t]);
        w.add_strings("ch_names", &self.ch_names);
        w.add_f64("sfreq", &[self.sfreq], &[1]);
        let pos: Vec<f64> = self.chan_pos.iter().copied().collect();
        w.add_f64("chan_pos", &pos, &[n_c, 3]);
        let events: Vec<i64> = self
            .events
            .iter()
            .flat_map(|m| [m.onset as i64, m.event, m.class_id as i64])
            .collect();
        w.add_i64("events", &events, &[n_e, 3]);
        w.add_i64("event_codes", &self.event_codes, &[self.event_codes.len()]);
        let kinds: Vec<String> = self.projectors.iter().map(|p| p.kind.as_str().to_string()).collect();
        w.add_strings("proj_kinds", &kinds);
        let active: Vec<i64> = self.projectors.iter().map(|p| p.active as i64).collect();
        w.add_i64("proj_active", &active, &[active.len()]);
        w.write(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = StFile::open(path)?;
        let bad = |msg: String| PipelineError::format(path, msg);

        let (flat, shape) = f.f64("data")?;
        let [n_e, n_c, n_t] = shape[..] else {
            return Err(bad(format!("`data` must be 3-D, got shape {shape:?}")));
        };
        let data = Array3::from_shape_vec((n_e, n_c, n_t), flat).map_err(|e| bad(e.to_string()))?;

        let ch_names = f.strings("ch_names")?;
        if ch_names.len() != n_c {
            return Err(bad(format!("{} channel names for {n_c} channels", ch_names.len())));
        }
        let sfreq = match f.f64("sfreq")?.0[..] {
            [v] if v > 0.0 => v,
            _ => return Err(bad("`sfreq` must be one positive value".into())),
        };
        let (pos, _) = f.f64("chan_pos")?;
        let chan_pos = Array2::from_shape_vec((n_c, 3), pos).map_err(|e| bad(e.to_string()))?;

        let (ev, _) = f.i64("events")?;
        let (event_codes, _) = f.i64("event_codes")?;
        if ev.len() != n_e * 3 {
            return Err(bad(format!("`events` has {} values for {n_e} epochs", ev.len())));
        }
        let events = ev
            .chunks_exact(3)
            .map(|row| {
                let (onset, event, class_id) = (row[0], row[1], row[2]);
                if onset < 0 || class_id < 0 || class_id as usize >= event_codes.len() {
                    return Err(bad(format!("invalid event row {row:?}")));
                }
                Ok(EventMarker { onset: onset as usize, event, class_id: class_id as usize })
            })
            .collect::<Result<Vec<_>>>()?;

        let kinds = f.strings("proj_kinds")?;
        let (active, _) = f.i64("proj_active")?;
        if kinds.len() != active.len() {
            return Err(bad("projector kinds and flags differ in length".into()));
        }
        let projectors = kinds
            .iter()
            .zip(&active)
            .map(|(k, &a)| {
                let kind = ProjectorKind::parse(k).ok_or_else(|| bad(format!("unknown projector `{k}`")))?;
                Ok(Projector { kind, active: a != 0 })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { data, ch_names, sfreq, chan_pos, events, event_codes, projectors })
    }
}

// ── Assembly ─────────────────────────────────────────────────────────────────

/// Build the epoch tensor from a truncated signal table.
///
/// Fails if the table is empty, the first record has `size == 0`, or a
/// present signal's length differs from `target_length`.
pub fn assemble_epochs(table: &SignalTable) -> Result<(EpochTensor, AssemblyReport)> {
    let first = table
        .records
        .first()
        .ok_or_else(|| PipelineError::validation("cannot build epochs from an empty signal table"))?;
    if first.size == 0 {
        return Err(PipelineError::validation("first record has size 0"));
    }
    let sfreq = first.size as f64 / 2.0;
    let target_length = (2.0 * sfreq) as usize;

    let events = table.events();
    let channels = table.channels();
    let mut report = AssemblyReport::default();

    let mut by_key: HashMap<(i64, &str), &RawRecord> = HashMap::with_capacity(table.len());
    let mut first_code: HashMap<i64, i64> = HashMap::with_capacity(events.len());
    for r in &table.records {
        first_code.entry(r.event).or_insert(r.code);
        match by_key.entry((r.event, r.channel.as_str())) {
            Entry::Occupied(_) => report.duplicates.push((r.event, r.channel.clone())),
            Entry::Vacant(slot) => {
                slot.insert(r);
            }
        }
    }

    let mut data = Array3::<f64>::zeros((events.len(), channels.len(), target_length));
    for (e, &event) in events.iter().enumerate() {
        for (c, ch) in channels.iter().enumerate() {
            match by_key.get(&(event, ch.as_str())) {
                Some(rec) => {
                    if rec.signal.len() != target_length {
                        return Err(PipelineError::validation(format!(
                            "event {event}, channel {ch}: {} samples, expected {target_length}",
                            rec.signal.len()
                        )));
                    }
                    data.slice_mut(s![e, c, ..]).assign(&ArrayView1::from(&rec.signal[..]));
                }
                None => report.padded.push((event, ch.clone())),
            }
        }
    }

    let (event_codes, markers) = code_events(&first_code, &events, target_length);
    let (chan_pos, unplaced) = montage::positions(&channels);
    report.unplaced = unplaced;

    let tensor = EpochTensor {
        data,
        ch_names: channels,
        sfreq,
        chan_pos,
        events: markers,
        event_codes,
        projectors: Vec::new(),
    };
    Ok((tensor, report))
}

/// Class id table and per-event markers.  Each event's code is that of its
/// first record.
fn code_events(first_code: &HashMap<i64, i64>, events: &[i64], target_length: usize) -> (Vec<i64>, Vec<EventMarker>) {
    let mut codes: Vec<i64> = Vec::new();
    let mut class_of: HashMap<i64, usize> = HashMap::new();
    let mut markers = Vec::with_capacity(events.len());
    for (idx, &event) in events.iter().enumerate() {
        let code = first_code.get(&event).copied().unwrap_or_default();
        let class_id = *class_of.entry(code).or_insert_with(|| {
            codes.push(code);
            codes.len() - 1
        });
        markers.push(EventMarker { onset: idx * target_length, event, class_id });
    }
    (codes, markers)
}
