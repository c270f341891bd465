//! Error types for demultiplexing runs.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for demultiplexing operations
pub type Result<T> = std::result::Result<T, DemuxError>;

/// Errors that abort a demultiplexing run.
///
/// A sequence line shorter than the barcode is not an error: it is logged and
/// counted, and the record is treated as unmatched.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// An option value was out of range
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Explanation of why the arguments were rejected
        reason: String,
    },

    /// Failure opening, reading, creating or writing a file
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// R1 and R2 inputs have different total line counts
    #[error("R1 lines = {r1_lines} and R2 lines = {r2_lines}: R1 and R2 file lines are different")]
    LineCountMismatch {
        /// Lines in the R1 input
        r1_lines: u64,
        /// Lines in the R2 input
        r2_lines: u64,
    },

    /// Barcode table file could not be used
    #[error("Invalid barcode table '{origin}': {reason}")]
    InvalidBarcodeTable {
        /// Where the table came from (a file path, or a description)
        origin: String,
        /// Explanation of the problem
        reason: String,
    },

    /// The writer has no outputs registered for this barcode
    #[error("No sample outputs registered for barcode '{barcode}'")]
    UnknownBarcode {
        /// The barcode that was looked up
        barcode: String,
    },
}

impl DemuxError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        DemuxError::Io { path: path.as_ref().to_path_buf(), source }
    }
}
