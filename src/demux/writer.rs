//! Per-sample buffered output.
//!
//! Every sample owns one sink for R1 and one for R2, each with a buffer of
//! pending lines. A buffer is written out and cleared once it holds
//! `buffer_records` records; whatever remains is written by
//! [`SampleWriter::flush_all`] at end of input.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::{DemuxError, Result};
use crate::fastq::RECORD_LINES;

/// Default flush threshold, in records (2^17).
pub const DEFAULT_BUFFER_RECORDS: usize = 131_072;

/// Which read of the pair a sink holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    R1,
    R2,
}

struct SampleOutput<W> {
    sink: W,
    path: PathBuf,
    pending: Vec<String>,
}

impl<W: Write> SampleOutput<W> {
    fn new(path: PathBuf, sink: W) -> Self {
        Self { sink, path, pending: Vec::new() }
    }

    fn write_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        debug!("Flushing {} lines to {}", self.pending.len(), self.path.display());
        for line in &self.pending {
            self.sink.write_all(line.as_bytes()).map_err(|e| DemuxError::io(&self.path, e))?;
            self.sink.write_all(b"\n").map_err(|e| DemuxError::io(&self.path, e))?;
        }
        self.pending.clear();
        Ok(())
    }
}

/// Buffers matched records per barcode and writes them to each sample's sinks.
pub struct SampleWriter<W: Write> {
    r1: BTreeMap<String, SampleOutput<W>>,
    r2: BTreeMap<String, SampleOutput<W>>,
    records: BTreeMap<String, u64>,
    capacity: usize,
}

impl<W: Write> SampleWriter<W> {
    /// Creates a writer that flushes a buffer once it holds `buffer_records` records.
    pub fn new(buffer_records: usize) -> Result<Self> {
        if buffer_records == 0 {
            return Err(DemuxError::InvalidArguments {
                reason: "buffer_records must be at least 1".to_string(),
            });
        }
        Ok(Self {
            r1: BTreeMap::new(),
            r2: BTreeMap::new(),
            records: BTreeMap::new(),
            capacity: buffer_records * RECORD_LINES,
        })
    }

    /// Buffer capacity in lines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers the R1 and R2 sinks of the sample keyed by `barcode`.
    pub fn register(&mut self, barcode: &str, r1: (PathBuf, W), r2: (PathBuf, W)) {
        self.r1.insert(barcode.to_string(), SampleOutput::new(r1.0, r1.1));
        self.r2.insert(barcode.to_string(), SampleOutput::new(r2.0, r2.1));
        self.records.insert(barcode.to_string(), 0);
    }

    fn outputs_mut(&mut self, barcode: &str) -> Result<(&mut SampleOutput<W>, &mut SampleOutput<W>)> {
        match (self.r1.get_mut(barcode), self.r2.get_mut(barcode)) {
            (Some(r1), Some(r2)) => Ok((r1, r2)),
            _ => Err(DemuxError::UnknownBarcode { barcode: barcode.to_string() }),
        }
    }

    /// Appends one matched record pair to the buffers of `barcode`.
    pub fn append_record(
        &mut self,
        barcode: &str,
        record_r1: &[String; RECORD_LINES],
        record_r2: &[String; RECORD_LINES],
    ) -> Result<()> {
        let (r1, r2) = self.outputs_mut(barcode)?;
        r1.pending.extend(record_r1.iter().cloned());
        r2.pending.extend(record_r2.iter().cloned());
        if let Some(count) = self.records.get_mut(barcode) {
            *count += 1;
        }
        Ok(())
    }

    /// Writes out and clears each buffer of `barcode` that has reached capacity.
    pub fn maybe_flush(&mut self, barcode: &str) -> Result<()> {
        let capacity = self.capacity;
        let (r1, r2) = self.outputs_mut(barcode)?;
        if r1.pending.len() >= capacity {
            r1.write_pending()?;
        }
        if r2.pending.len() >= capacity {
            r2.write_pending()?;
        }
        Ok(())
    }

    /// Writes out every non-empty buffer, R1 then R2, in barcode order.
    pub fn flush_all(&mut self) -> Result<()> {
        for output in self.r1.values_mut() {
            output.write_pending()?;
        }
        for output in self.r2.values_mut() {
            output.write_pending()?;
        }
        Ok(())
    }

    /// Number of records appended for `barcode`.
    pub fn records(&self, barcode: &str) -> u64 {
        self.records.get(barcode).copied().unwrap_or(0)
    }

    /// Lines currently buffered for `barcode` on `side`.
    pub fn pending_lines(&self, side: Side, barcode: &str) -> usize {
        self.side(side).get(barcode).map_or(0, |o| o.pending.len())
    }

    pub fn sink(&self, side: Side, barcode: &str) -> Option<&W> {
        self.side(side).get(barcode).map(|o| &o.sink)
    }

    pub fn path(&self, side: Side, barcode: &str) -> Option<&Path> {
        self.side(side).get(barcode).map(|o| o.path.as_path())
    }

    fn side(&self, side: Side) -> &BTreeMap<String, SampleOutput<W>> {
        match side {
            Side::R1 => &self.r1,
            Side::R2 => &self.r2,
        }
    }

    /// Writes remaining buffers, then flushes every sink.
    pub fn finish(mut self) -> Result<()> {
        self.flush_all()?;
        for output in self.r1.values_mut().chain(self.r2.values_mut()) {
            output.sink.flush().map_err(|e| DemuxError::io(&output.path, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, seq: &str) -> [String; RECORD_LINES] {
        [name.to_string(), seq.to_string(), "+".to_string(), "I".repeat(seq.len())]
    }

    fn writer(buffer_records: usize) -> SampleWriter<Vec<u8>> {
        let mut w = SampleWriter::new(buffer_records).unwrap();
        w.register("AAAAAA", ("a.r1".into(), Vec::new()), ("a.r2".into(), Vec::new()));
        w.register("CCCCCC", ("c.r1".into(), Vec::new()), ("c.r2".into(), Vec::new()));
        w
    }

    fn contents(w: &SampleWriter<Vec<u8>>, side: Side, barcode: &str) -> String {
        String::from_utf8(w.sink(side, barcode).unwrap().clone()).unwrap()
    }

    #[test]
    fn test_zero_buffer_records_rejected() {
        assert!(matches!(
            SampleWriter::<Vec<u8>>::new(0),
            Err(DemuxError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_capacity_is_in_lines() {
        assert_eq!(writer(DEFAULT_BUFFER_RECORDS).capacity(), 524_288);
    }

    #[test]
    fn test_append_buffers_until_capacity() {
        let mut w = writer(2);
        w.append_record("AAAAAA", &record("@a1", "AAAAAAT"), &record("@b1", "GGG")).unwrap();
        w.maybe_flush("AAAAAA").unwrap();
        assert_eq!(w.pending_lines(Side::R1, "AAAAAA"), 4);
        assert!(contents(&w, Side::R1, "AAAAAA").is_empty());

        w.append_record("AAAAAA", &record("@a2", "AAAAAAG"), &record("@b2", "TTT")).unwrap();
        w.maybe_flush("AAAAAA").unwrap();
        assert_eq!(w.pending_lines(Side::R1, "AAAAAA"), 0);
        assert_eq!(w.pending_lines(Side::R2, "AAAAAA"), 0);
        assert_eq!(
            contents(&w, Side::R1, "AAAAAA"),
            "@a1\nAAAAAAT\n+\nIIIIIII\n@a2\nAAAAAAG\n+\nIIIIIII\n"
        );
        assert_eq!(contents(&w, Side::R2, "AAAAAA"), "@b1\nGGG\n+\nIII\n@b2\nTTT\n+\nIII\n");
        assert_eq!(w.records("AAAAAA"), 2);
    }

    #[test]
    fn test_flush_does_not_touch_other_samples() {
        let mut w = writer(1);
        w.append_record("CCCCCC", &record("@c", "CCCCCC"), &record("@c", "NNN")).unwrap();
        w.append_record("AAAAAA", &record("@a", "AAAAAA"), &record("@a", "NNN")).unwrap();
        w.maybe_flush("AAAAAA").unwrap();
        assert_eq!(w.pending_lines(Side::R1, "CCCCCC"), 4);
        assert!(contents(&w, Side::R1, "CCCCCC").is_empty());
        assert!(!contents(&w, Side::R1, "AAAAAA").is_empty());
    }

    #[test]
    fn test_flush_all_writes_partial_buffers() {
        let mut w = writer(DEFAULT_BUFFER_RECORDS);
        w.append_record("CCCCCC", &record("@c", "CCCCCC"), &record("@d", "NNN")).unwrap();
        w.maybe_flush("CCCCCC").unwrap();
        assert!(contents(&w, Side::R1, "CCCCCC").is_empty());

        w.flush_all().unwrap();
        assert_eq!(contents(&w, Side::R1, "CCCCCC"), "@c\nCCCCCC\n+\nIIIIII\n");
        assert_eq!(contents(&w, Side::R2, "CCCCCC"), "@d\nNNN\n+\nIII\n");
        assert!(contents(&w, Side::R1, "AAAAAA").is_empty());
    }

    #[test]
    fn test_flushing_empty_buffers_writes_nothing() {
        let mut w = writer(1);
        w.flush_all().unwrap();
        w.flush_all().unwrap();
        w.maybe_flush("AAAAAA").unwrap();
        for barcode in ["AAAAAA", "CCCCCC"] {
            assert!(contents(&w, Side::R1, barcode).is_empty());
            assert!(contents(&w, Side::R2, barcode).is_empty());
        }
    }

    #[test]
    fn test_output_is_independent_of_threshold() {
        let records: Vec<_> = (0..7).map(|i| record(&format!("@r{i}"), "AAAAAACGT")).collect();
        let mut outputs = Vec::new();
        for threshold in [1, 3, DEFAULT_BUFFER_RECORDS] {
            let mut w = writer(threshold);
            for rec in &records {
                w.append_record("AAAAAA", rec, rec).unwrap();
                w.maybe_flush("AAAAAA").unwrap();
            }
            w.flush_all().unwrap();
            outputs.push(contents(&w, Side::R1, "AAAAAA"));
        }
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
        assert_eq!(outputs[0].lines().count(), 28);
    }

    #[test]
    fn test_unknown_barcode() {
        let mut w = writer(1);
        let rec = record("@x", "GGGGGG");
        assert!(matches!(
            w.append_record("GGGGGG", &rec, &rec),
            Err(DemuxError::UnknownBarcode { .. })
        ));
        assert!(matches!(w.maybe_flush("GGGGGG"), Err(DemuxError::UnknownBarcode { .. })));
        assert_eq!(w.records("GGGGGG"), 0);
    }

    #[test]
    fn test_paths_are_kept_per_side() {
        let w = writer(1);
        assert_eq!(w.path(Side::R1, "AAAAAA"), Some(Path::new("a.r1")));
        assert_eq!(w.path(Side::R2, "CCCCCC"), Some(Path::new("c.r2")));
        assert_eq!(w.path(Side::R1, "GGGGGG"), None);
    }
}
