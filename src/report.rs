use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::{DemuxError, Result};

/// Records routed to one sample.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SampleCount {
    pub barcode: String,
    pub sample: String,
    pub records: u64,
    pub r1_output: String,
    pub r2_output: String,
}

/// Summary of one demultiplexing run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DemuxReport {
    pub total_records: u64,
    pub matched_records: u64,
    pub unmatched_records: u64,
    pub short_sequences: u64,
    /// Lines of a trailing record with fewer than 4 lines, which is never written.
    pub truncated_lines: u64,
    /// Reading stopped with lines still left in one input.
    pub uneven_inputs: bool,
    pub samples: Vec<SampleCount>,
}

impl DemuxReport {
    /// Fraction of records assigned to a sample; 0 for empty input.
    pub fn matched_fraction(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.matched_records as f64 / self.total_records as f64
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| DemuxError::io(path, e))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self).map_err(|e| DemuxError::io(path, e.into()))?;
        w.flush().map_err(|e| DemuxError::io(path, e))
    }
}
