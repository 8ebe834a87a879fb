//! snpinfo: print the summary and selected traces of a Touchstone file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use snpviewer::trace::{available_trace_labels, default_selection};
use snpviewer::{scan_network, DisplayMode, LoadError, PlotData, TouchstoneLoader};

#[derive(Parser)]
#[command(name = "snpinfo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the .sNp or .ts file
    file: PathBuf,

    /// Only read the extension and the frequency column
    #[arg(short, long)]
    quick: bool,

    /// How complex values are shown: db, phase, real or imag
    #[arg(short, long, default_value = "db")]
    mode: DisplayMode,

    /// Trace to print, e.g. S21. May be repeated
    #[arg(short, long = "trace")]
    traces: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LoadError>() {
                Some(load_error) => {
                    eprintln!("{}", load_error.user_message());
                    eprintln!("{}", load_error.detail());
                }
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.quick {
        let summary = scan_network(&cli.file)?;
        println!("{}", summary);
        return Ok(());
    }

    let loader = TouchstoneLoader::default();
    let network = loader.load_network(&cli.file)?;
    let summary = snpviewer::TouchstoneSummary::from_network(&cli.file, &network);
    println!("{}", summary);
    for comment in network.comments().iter().filter(|c| !c.is_empty()) {
        println!("Comment          {}", comment);
    }
    println!(
        "Traces           {}",
        available_trace_labels(network.nports()).join(" ")
    );

    let selection = if cli.traces.is_empty() {
        default_selection(network.nports())
    } else {
        cli.traces.clone()
    };
    let plot = PlotData::build(&network, cli.mode, &selection);
    if plot.traces.is_empty() {
        tracing::warn!("none of the requested traces exist in this network");
        return Ok(());
    }

    println!();
    println!(
        "{}\t{}",
        PlotData::X_LABEL,
        plot.traces
            .iter()
            .map(|t| format!("{} {}", t.label, plot.y_label))
            .join("\t")
    );
    for (row, f) in plot.frequency_ghz.iter().enumerate() {
        println!(
            "{}\t{}",
            f,
            plot.traces.iter().map(|t| format!("{:.6}", t.values[row])).join("\t")
        );
    }
    Ok(())
}
