//! csspack - pack the stylesheets of a built site.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use csspack::{Cli, FileSet, HttpFetcher, PackConfig, PackReport, Packer, log, logger};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = PackConfig::load(cli)?;
    config.validate()?;

    let mut files = FileSet::load(&cli.site)?;
    log!("pack"; "loaded {} files from {}", files.len(), cli.site.display());

    let fetcher = HttpFetcher::new().context("failed to build http client")?;
    let packer = Packer::new(config, Arc::new(fetcher));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(packer.run(&mut files))?;

    let output = cli.output_dir();
    let written = files
        .write(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    // Packed sources are only deleted from the site being rewritten
    if cli.in_place() {
        files.prune(output)?;
    }

    print_summary(&report);
    log!("write"; "wrote {} files to {}", written, output.display());
    Ok(())
}

fn print_summary(report: &PackReport) {
    log!(
        "pack";
        "{} pages ({} styled), {} styles, {} remote fetches, {} bundles ({})",
        report.pages,
        report.styled_pages,
        report.styles,
        report.resolve.remote,
        report.bundles,
        report.mode.as_str()
    );
    if report.resolve.missing > 0 {
        log!("warning"; "{} local stylesheets were missing", report.resolve.missing);
    }
    if !report.skipped.is_empty() {
        log!("warning"; "{} pages could not be parsed and were left as-is", report.skipped.len());
    }
    if !report.removed_sources.is_empty() {
        log!("pack"; "removed {} packed local stylesheets", report.removed_sources.len());
    }
}
