#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use classflat_cli::args::{CliArgs, DiagnosticsFormat};
use classflat_cli::config::resolve_config;
use classflat_cli::driver::{self, CompilationResult, ExitStatus};
use classflat_cli::reporter::Reporter;

fn main() -> Result<()> {
    // Initialize tracing if CLASSFLAT_LOG or RUST_LOG is set (zero cost otherwise).
    classflat_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    if args.show_config || args.list_files {
        let config = resolve_config(&args, &cwd)?;
        let files = driver::discover_sources(&args.files, &config, &cwd)?;
        let mut stdout = std::io::stdout().lock();
        if args.show_config {
            writeln!(stdout, "{}", driver::show_config_json(&config, &files)?)?;
        } else {
            for entry in &files {
                writeln!(stdout, "{}", entry.display_name())?;
            }
        }
        return Ok(());
    }

    let result = driver::run(&args, &cwd)?;
    std::io::stdout()
        .lock()
        .write_all(result.stdout.as_bytes())
        .context("failed to write output")?;

    report(&args, &result)?;

    let status = result.exit_status();
    if status != ExitStatus::Success {
        std::process::exit(status.code());
    }
    Ok(())
}

fn report(args: &CliArgs, result: &CompilationResult) -> Result<()> {
    let color = args.pretty || std::io::stderr().is_terminal();
    let mut reporter = Reporter::new(color && args.diagnostics == DiagnosticsFormat::Text);
    for (file, text) in &result.sources {
        reporter.add_source(file.clone(), text.clone());
    }

    match args.diagnostics {
        DiagnosticsFormat::Json => {
            eprintln!("{}", reporter.render_json(&result.diagnostics)?);
        }
        DiagnosticsFormat::Text => {
            if result.diagnostics.is_empty() {
                return Ok(());
            }
            eprintln!("{}", reporter.render(&result.diagnostics));
            if let Some(summary) = reporter.summary(&result.diagnostics) {
                eprintln!("\n{summary}");
            }
        }
    }
    Ok(())
}
