use clap::{Parser, ArgAction};

use crate::demux::DemuxOptions;
use crate::demux::writer::DEFAULT_BUFFER_RECORDS;

#[derive(Parser, Debug, Clone)]
#[command(name = "fastq-demux", version, about = "Split paired lane-based FASTQ files into sample-based FASTQ files")]
pub struct Cli {
    /// Lane-based FASTQ R1 file
    #[arg(value_name = "FASTQ_R1")]
    pub in1: String,
    /// Lane-based FASTQ R2 file
    #[arg(value_name = "FASTQ_R2")]
    pub in2: String,

    /// Fail if R1 and R2 have different line counts (reads both files twice)
    #[arg(long="check_lines", action=ArgAction::SetTrue)]
    pub check_lines: bool,
    /// Records buffered per sample before writing
    #[arg(long="buffer_records", default_value_t=DEFAULT_BUFFER_RECORDS)]
    pub buffer_records: usize,
    /// Tab-separated barcode table with `barcode` and `sample` columns
    #[arg(long="barcodes")]
    pub barcodes: Option<String>,

    // Reporting
    #[arg(short='j', long="json")]
    pub json: Option<String>,
    #[arg(long="html")]
    pub html: Option<String>,
    #[arg(short='R', long="report_title", default_value = "fastq-demux report")]
    pub report_title: String,
}

impl Cli {
    pub fn demux_options(&self) -> DemuxOptions {
        DemuxOptions { buffer_records: self.buffer_records, check_lines: self.check_lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fastq-demux", "r1.fq", "r2.fq"]).unwrap();
        assert_eq!(cli.in1, "r1.fq");
        assert_eq!(cli.in2, "r2.fq");
        assert_eq!(cli.demux_options(), DemuxOptions::default());
        assert!(cli.barcodes.is_none());
        assert!(cli.json.is_none());
    }

    #[test]
    fn test_two_paths_required() {
        assert!(Cli::try_parse_from(["fastq-demux"]).is_err());
        assert!(Cli::try_parse_from(["fastq-demux", "r1.fq"]).is_err());
        assert!(Cli::try_parse_from(["fastq-demux", "r1.fq", "r2.fq", "r3.fq"]).is_err());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "fastq-demux", "--check_lines", "--buffer_records", "1", "--barcodes", "wells.tsv",
            "-j", "out.json", "r1.fq", "r2.fq",
        ])
        .unwrap();
        let options = cli.demux_options();
        assert!(options.check_lines);
        assert_eq!(options.buffer_records, 1);
        assert_eq!(cli.barcodes.as_deref(), Some("wells.tsv"));
        assert_eq!(cli.json.as_deref(), Some("out.json"));
    }
}
