use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::fs::File;
use std::path::{Path, PathBuf};
use flate2::read::MultiGzDecoder;

use crate::errors::{DemuxError, Result};

/// Lines per FASTQ record: identifier, sequence, option, quality.
pub const RECORD_LINES: usize = 4;

/// Position of the sequence line within a record, counting from 1.
pub const SEQUENCE_LINE: usize = 2;

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path).map_err(|e| DemuxError::io(path, e))?;
    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

/// Reads one input file a line at a time, with line endings stripped.
pub struct LineReader {
    reader: Box<dyn BufRead>,
    path: PathBuf,
}

impl LineReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = open_input(&path)?;
        Ok(Self { reader, path })
    }

    /// Overwrites `line` with the next line. Returns false at end of input.
    pub fn read_line_into(&mut self, line: &mut String) -> Result<bool> {
        line.clear();
        let n = self.reader.read_line(line).map_err(|e| DemuxError::io(&self.path, e))?;
        if n == 0 { return Ok(false); }
        if line.ends_with('\n') { line.pop(); }
        if line.ends_with('\r') { line.pop(); }
        Ok(true)
    }
}

/// Reads R1 and R2 in lockstep, one line from each per step.
///
/// Stops as soon as either input runs out. Lines remaining in the longer
/// input are not read; [`PairedLineReader::uneven`] reports whether that
/// happened.
pub struct PairedLineReader {
    r1: LineReader,
    r2: LineReader,
    uneven: bool,
}

impl PairedLineReader {
    pub fn open<P: AsRef<Path>>(r1: P, r2: P) -> Result<Self> {
        Ok(Self { r1: LineReader::open(r1)?, r2: LineReader::open(r2)?, uneven: false })
    }

    /// Reads the next pair of lines into `line_r1` and `line_r2`.
    pub fn next_pair(&mut self, line_r1: &mut String, line_r2: &mut String) -> Result<bool> {
        let has_r1 = self.r1.read_line_into(line_r1)?;
        let has_r2 = self.r2.read_line_into(line_r2)?;
        if has_r1 && has_r2 {
            return Ok(true);
        }
        self.uneven = has_r1 != has_r2;
        Ok(false)
    }

    /// True once reading stopped with lines still left in one of the inputs.
    pub fn uneven(&self) -> bool {
        self.uneven
    }
}

/// Counts the lines in a file; a final line without a newline still counts.
pub fn count_lines<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    let mut reader = open_input(path)?;
    let mut lines = 0u64;
    let mut last_byte = None;
    loop {
        let buf = reader.fill_buf().map_err(|e| DemuxError::io(path, e))?;
        if buf.is_empty() { break; }
        lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = buf.last().copied();
        let n = buf.len();
        reader.consume(n);
    }
    if last_byte.is_some_and(|b| b != b'\n') { lines += 1; }
    Ok(lines)
}

/// Full scan of both inputs; fails if their line totals differ.
pub fn check_line_counts<P: AsRef<Path>>(r1: P, r2: P) -> Result<u64> {
    let r1_lines = count_lines(r1)?;
    let r2_lines = count_lines(r2)?;
    if r1_lines != r2_lines {
        return Err(DemuxError::LineCountMismatch { r1_lines, r2_lines });
    }
    Ok(r1_lines)
}

/// Buffered output file for one sample and one side.
pub struct Writer {
    writer: BufWriter<File>,
}

impl Writer {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| DemuxError::io(path, e))?;
        Ok(Self { writer: BufWriter::new(f) })
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.writer.write(buf) }
    fn flush(&mut self) -> io::Result<()> { self.writer.flush() }
}
