//! Barcode to sample registry.
//!
//! The table is immutable once built. It is either the compiled-in well table
//! or loaded from a headered TSV with `barcode` and `sample` columns.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{DemuxError, Result};

/// Length of every barcode, taken from the start of the R1 sequence line.
pub const BARCODE_LEN: usize = 6;

const BUILTIN_WELLS: [(&str, &str); 16] = [
    ("ACTATT", "A8"),
    ("GTAAAT", "B11"),
    ("GTTATT", "B12"),
    ("TCAATT", "C9"),
    ("TCTATA", "C10"),
    ("TGATAA", "C11"),
    ("TGTTAT", "C12"),
    ("TTATGT", "D3"),
    ("TTCTAA", "D4"),
    ("TCGAAG", "E3"),
    ("GGACCA", "E5"),
    ("ACCGCG", "E6"),
    ("CCGCGA", "F3"),
    ("CCGGTG", "F4"),
    ("CGGGAG", "F11"),
    ("CGGTCC", "F12"),
];

#[derive(Debug, Deserialize)]
struct BarcodeRow {
    barcode: String,
    sample: String,
}

/// Ordered mapping from barcode to sample label.
///
/// Iteration is in ascending barcode order. Sample labels may repeat.
#[derive(Debug, Clone)]
pub struct BarcodeTable {
    samples: BTreeMap<String, String>,
    valid: HashSet<String>,
}

impl Default for BarcodeTable {
    fn default() -> Self {
        let samples: BTreeMap<String, String> = BUILTIN_WELLS
            .iter()
            .map(|(barcode, sample)| (barcode.to_string(), sample.to_string()))
            .collect();
        let valid = samples.keys().cloned().collect();
        Self { samples, valid }
    }
}

impl BarcodeTable {
    /// Builds a table from `(barcode, sample)` pairs.
    ///
    /// `origin` names where the pairs came from and only appears in errors.
    pub fn from_entries<I, B, S>(origin: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (B, S)>,
        B: Into<String>,
        S: Into<String>,
    {
        let invalid = |reason: String| DemuxError::InvalidBarcodeTable {
            origin: origin.to_string(),
            reason,
        };

        let mut samples = BTreeMap::new();
        for (barcode, sample) in entries {
            let barcode: String = barcode.into();
            let sample: String = sample.into();
            if barcode.len() != BARCODE_LEN {
                return Err(invalid(format!(
                    "barcode '{barcode}' has length {}, expected {BARCODE_LEN}",
                    barcode.len()
                )));
            }
            if sample.is_empty() {
                return Err(invalid(format!("barcode '{barcode}' has an empty sample label")));
            }
            if samples.insert(barcode.clone(), sample).is_some() {
                return Err(invalid(format!("duplicate barcode '{barcode}'")));
            }
        }
        if samples.is_empty() {
            return Err(invalid("no barcodes defined".to_string()));
        }

        let valid = samples.keys().cloned().collect();
        Ok(Self { samples, valid })
    }

    /// Loads a tab-separated table with a `barcode` and `sample` header.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|e| DemuxError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut entries = Vec::new();
        for row in reader.deserialize::<BarcodeRow>() {
            let row = row.map_err(|e| DemuxError::InvalidBarcodeTable {
                origin: origin.clone(),
                reason: e.to_string(),
            })?;
            entries.push((row.barcode, row.sample));
        }
        Self::from_entries(&origin, entries)
    }

    /// Fixed length of every barcode in the table.
    pub fn barcode_len(&self) -> usize {
        BARCODE_LEN
    }

    pub fn contains(&self, barcode: &str) -> bool {
        self.valid.contains(barcode)
    }

    /// Sample label for `barcode`, if it is registered.
    pub fn sample(&self, barcode: &str) -> Option<&str> {
        self.samples.get(barcode).map(String::as_str)
    }

    /// Set of registered barcodes.
    pub fn barcodes(&self) -> &HashSet<String> {
        &self.valid
    }

    /// `(barcode, sample)` pairs in ascending barcode order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.samples.iter().map(|(b, s)| (b.as_str(), s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
