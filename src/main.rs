use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use fastq_demux::barcodes::BarcodeTable;
use fastq_demux::config::Cli;
use fastq_demux::demux::Demultiplexer;
use fastq_demux::html_report::write_html_report;

fn run(cli: &Cli) -> Result<()> {
    let table = match &cli.barcodes {
        Some(path) => BarcodeTable::from_path(path)?,
        None => BarcodeTable::default(),
    };
    info!("R1 input: {}", cli.in1);
    info!("R2 input: {}", cli.in2);
    info!("Barcodes: {} ({} samples)", cli.barcodes.as_deref().unwrap_or("built-in"), table.len());
    info!("Buffer: {} records per sample", cli.buffer_records);

    let rep = Demultiplexer::new(&table, cli.demux_options())
        .run(&cli.in1, &cli.in2)
        .context("Demultiplexing failed")?;

    info!(
        "Processed {} records: {} matched ({:.2}%), {} unmatched, {} too short",
        rep.total_records,
        rep.matched_records,
        rep.matched_fraction() * 100.0,
        rep.unmatched_records,
        rep.short_sequences
    );
    for s in &rep.samples {
        info!("  {} [{}]: {} records", s.sample, s.barcode, s.records);
    }

    if let Some(jf) = &cli.json {
        rep.write_json(jf)?;
    }
    if let Some(hf) = &cli.html {
        write_html_report(hf, &rep, &cli.report_title)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
