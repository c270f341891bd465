use log::warn;

use crate::barcodes::BarcodeTable;
use crate::fastq::SEQUENCE_LINE;

/// Outcome of looking up the barcode of one R1 sequence line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'a> {
    Matched(&'a str),
    NoMatch,
    TooShort,
}

/// Decides which sample a record pair belongs to from its R1 sequence line.
///
/// The match found on the sequence line is held until [`Classifier::end_record`]
/// is called at the end of the 4-line cycle.
pub struct Classifier<'a> {
    table: &'a BarcodeTable,
    matched: Option<&'a str>,
    short_sequences: u64,
}

impl<'a> Classifier<'a> {
    pub fn new(table: &'a BarcodeTable) -> Self {
        Self { table, matched: None, short_sequences: 0 }
    }

    /// Looks up the barcode prefix of a sequence line.
    pub fn classify(&self, sequence: &str) -> MatchResult<'a> {
        let len = self.table.barcode_len();
        if sequence.len() < len {
            return MatchResult::TooShort;
        }
        match sequence.get(..len).and_then(|prefix| self.table.barcodes().get(prefix)) {
            Some(barcode) => MatchResult::Matched(barcode.as_str()),
            None => MatchResult::NoMatch,
        }
    }

    /// Feeds the R1 line at `position` (1-based) of the current record.
    ///
    /// Only the sequence line is inspected; other positions return `None`.
    pub fn observe(&mut self, position: usize, line_r1: &str) -> Option<MatchResult<'a>> {
        if position != SEQUENCE_LINE {
            return None;
        }
        let result = self.classify(line_r1);
        match result {
            MatchResult::Matched(barcode) => self.matched = Some(barcode),
            MatchResult::TooShort => {
                self.short_sequences += 1;
                warn!("Fragment sequence is too short: '{line_r1}'");
            }
            MatchResult::NoMatch => {}
        }
        Some(result)
    }

    /// Closes the current record, returning its barcode if it matched.
    pub fn end_record(&mut self) -> Option<&'a str> {
        self.matched.take()
    }

    /// Number of sequence lines shorter than the barcode seen so far.
    pub fn short_sequences(&self) -> u64 {
        self.short_sequences
    }
}
