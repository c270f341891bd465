use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::errors::{DemuxError, Result};
use crate::report::DemuxReport;

pub fn write_html_report<P: AsRef<Path>>(path: P, report: &DemuxReport, title: &str) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).map_err(|e| DemuxError::io(path, e))?;
    let mut w = BufWriter::new(f);
    render(&mut w, report, title)
        .and_then(|_| w.flush())
        .map_err(|e| DemuxError::io(path, e))
}

fn render<W: Write>(f: &mut W, report: &DemuxReport, title: &str) -> io::Result<()> {
    writeln!(f, "<!DOCTYPE html>")?;
    writeln!(f, "<html>")?;
    writeln!(f, "<head>")?;
    writeln!(f, "<title>{}</title>", escape(title))?;
    writeln!(f, "<style>")?;
    writeln!(f, "body {{ font-family: Arial, sans-serif; margin: 20px; }}")?;
    writeln!(f, "table {{ border-collapse: collapse; width: 100%; max-width: 800px; }}")?;
    writeln!(f, "th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}")?;
    writeln!(f, "th {{ background-color: #f2f2f2; }}")?;
    writeln!(f, "h1 {{ color: #333; }}")?;
    writeln!(f, "</style>")?;
    writeln!(f, "</head>")?;
    writeln!(f, "<body>")?;

    writeln!(f, "<h1>{}</h1>", escape(title))?;

    writeln!(f, "<h2>General Statistics</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(f, "<tr><td>Total Records</td><td>{}</td></tr>", report.total_records)?;
    writeln!(
        f,
        "<tr><td>Matched Records</td><td>{} ({:.2}%)</td></tr>",
        report.matched_records,
        report.matched_fraction() * 100.0
    )?;
    writeln!(f, "<tr><td>Unmatched Records</td><td>{}</td></tr>", report.unmatched_records)?;
    writeln!(f, "<tr><td>Sequences Too Short</td><td>{}</td></tr>", report.short_sequences)?;
    writeln!(f, "<tr><td>Truncated Lines</td><td>{}</td></tr>", report.truncated_lines)?;
    writeln!(f, "<tr><td>Uneven Inputs</td><td>{}</td></tr>", report.uneven_inputs)?;
    writeln!(f, "</table>")?;

    writeln!(f, "<h2>Samples</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Sample</th><th>Barcode</th><th>Records</th><th>R1 Output</th><th>R2 Output</th></tr>")?;
    for s in &report.samples {
        writeln!(
            f,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&s.sample),
            escape(&s.barcode),
            s.records,
            escape(&s.r1_output),
            escape(&s.r2_output)
        )?;
    }
    writeln!(f, "</table>")?;

    writeln!(f, "</body>")?;
    writeln!(f, "</html>")?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SampleCount;

    #[test]
    fn test_render_lists_samples() {
        let report = DemuxReport {
            total_records: 3,
            matched_records: 2,
            unmatched_records: 1,
            samples: vec![SampleCount {
                barcode: "ACTATT".into(),
                sample: "A8".into(),
                records: 2,
                r1_output: "A8.r1.fq.txt".into(),
                r2_output: "A8.r2.fq.txt".into(),
            }],
            ..Default::default()
        };
        let mut out = Vec::new();
        render(&mut out, &report, "run <1>").unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("<title>run &lt;1&gt;</title>"));
        assert!(html.contains("<td>A8</td><td>ACTATT</td><td>2</td>"));
        assert!(html.contains("66.67%"));
    }
}
