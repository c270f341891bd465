//! Single-pass demultiplexing of paired lane-based FASTQ files.
//!
//! R1 and R2 are read in lockstep as 4-line records. The barcode at the start
//! of the R1 sequence line picks the sample; matched record pairs are buffered
//! per sample and written to `<dir><sample>.<basename>.txt` next to each input.
//! Records with an unknown or too-short barcode are dropped.

pub mod classifier;
pub mod writer;

use log::{info, warn};

use crate::barcodes::BarcodeTable;
use crate::errors::Result;
use crate::fastq::{self, PairedLineReader, Writer, RECORD_LINES};
use crate::report::{DemuxReport, SampleCount};

use self::classifier::Classifier;
use self::writer::{SampleWriter, Side, DEFAULT_BUFFER_RECORDS};

/// Run options for [`Demultiplexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxOptions {
    /// Records buffered per sample and side before they are written.
    pub buffer_records: usize,
    /// Compare the total line counts of R1 and R2 before demultiplexing.
    pub check_lines: bool,
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self { buffer_records: DEFAULT_BUFFER_RECORDS, check_lines: false }
    }
}

/// Builds the output path of `sample` for the input at `input`.
///
/// The directory part (up to the last `/` or `\`) is kept and the file name
/// becomes `<sample>.<basename>.txt`.
pub fn output_path(input: &str, sample: &str) -> String {
    let (dir, name) = match input.rfind(|c: char| c == '/' || c == '\\') {
        Some(pos) => input.split_at(pos + 1),
        None => ("", input),
    };
    format!("{dir}{sample}.{name}.txt")
}

pub struct Demultiplexer<'a> {
    table: &'a BarcodeTable,
    options: DemuxOptions,
}

impl<'a> Demultiplexer<'a> {
    pub fn new(table: &'a BarcodeTable, options: DemuxOptions) -> Self {
        Self { table, options }
    }

    /// Splits `r1` and `r2` into per-sample file pairs.
    ///
    /// Every sample in the table gets its output pair, even if no record
    /// matches it. Any I/O failure aborts the run; files already written are
    /// left as they are.
    pub fn run(&self, r1: &str, r2: &str) -> Result<DemuxReport> {
        let mut writer = SampleWriter::new(self.options.buffer_records)?;

        if self.options.check_lines {
            let lines = fastq::check_line_counts(r1, r2)?;
            info!("R1 and R2 both have {lines} lines");
        }

        let mut reader = PairedLineReader::open(r1, r2)?;

        for (barcode, sample) in self.table.iter() {
            let path_r1 = output_path(r1, sample);
            let path_r2 = output_path(r2, sample);
            let sink_r1 = Writer::create(&path_r1)?;
            let sink_r2 = Writer::create(&path_r2)?;
            writer.register(barcode, (path_r1.into(), sink_r1), (path_r2.into(), sink_r2));
        }
        info!("Created output files for {} samples", self.table.len());

        let mut classifier = Classifier::new(self.table);
        let mut report = DemuxReport::default();
        let mut block_r1: [String; RECORD_LINES] = Default::default();
        let mut block_r2: [String; RECORD_LINES] = Default::default();
        let mut position = 0usize;

        while reader.next_pair(&mut block_r1[position], &mut block_r2[position])? {
            position += 1;
            classifier.observe(position, &block_r1[position - 1]);

            if position == RECORD_LINES {
                report.total_records += 1;
                match classifier.end_record() {
                    Some(barcode) => {
                        writer.append_record(barcode, &block_r1, &block_r2)?;
                        writer.maybe_flush(barcode)?;
                        report.matched_records += 1;
                    }
                    None => report.unmatched_records += 1,
                }
                position = 0;
            }
        }

        if reader.uneven() {
            warn!("R1 and R2 have different lengths; stopped at the end of the shorter input");
        }
        if position > 0 {
            warn!("Ignoring {position} trailing lines that do not form a complete record");
        }
        report.truncated_lines = position as u64;
        report.uneven_inputs = reader.uneven();
        report.short_sequences = classifier.short_sequences();
        report.samples = self
            .table
            .iter()
            .map(|(barcode, sample)| SampleCount {
                barcode: barcode.to_string(),
                sample: sample.to_string(),
                records: writer.records(barcode),
                r1_output: display_path(&writer, Side::R1, barcode),
                r2_output: display_path(&writer, Side::R2, barcode),
            })
            .collect();

        writer.finish()?;
        Ok(report)
    }
}

fn display_path<W: std::io::Write>(writer: &SampleWriter<W>, side: Side, barcode: &str) -> String {
    writer.path(side, barcode).map(|p| p.display().to_string()).unwrap_or_default()
}
