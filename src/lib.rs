//! Demultiplexing of paired lane-based FASTQ files into sample-based files,
//! keyed by a 6-base inline barcode at the start of the R1 sequence.

pub mod barcodes;
pub mod config;
pub mod demux;
pub mod errors;
pub mod fastq;
pub mod html_report;
pub mod report;
