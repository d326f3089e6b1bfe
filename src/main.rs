use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use weft::error::ProjectError;
use weft::formats::png::{Png, PNG};
use weft::parse::ErrorKind;
use weft::{FromRecord, ParseError};

/// Decode the chunk structure of a PNG file and print it
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// File to decode, relative to the working directory
    path: PathBuf,

    /// Byte offset at which decoding starts
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
    format: Format,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Indented tree of the decoded record
    Pretty,
    /// Rust debug representation of the decoded record
    Debug,
    /// Typed projection onto the PNG structs
    Typed,
    /// JSON (requires the `serde_impls` feature)
    Json,
}

/// Output format unavailable in this build
#[derive(Debug)]
struct Unsupported(&'static str);

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} output requires the `serde_impls` feature", self.0)
    }
}

impl std::error::Error for Unsupported {}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<()> {
    let buffer = std::fs::read(&cli.path)
        .with_context(|| format!("failed to read {}", cli.path.display()))?;
    info!("read {} bytes from {}", buffer.len(), cli.path.display());

    let record = PNG
        .parse_at(&buffer, cli.offset)
        .with_context(|| format!("failed to decode {}", cli.path.display()))?;
    debug!("decoded {} top-level fields", record.len());

    match cli.format {
        Format::Pretty => println!("{record:#}"),
        Format::Debug => println!("{record:#?}"),
        Format::Typed => {
            let png = Png::from_record(&record).context("failed to project decoded record")?;
            println!("{png:#?}");
        }
        Format::Json => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "serde_impls")] {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                } else {
                    return Err(Unsupported("json").into());
                }
            }
        }
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<ParseError>() {
        return match err.kind() {
            ErrorKind::OutOfBounds => 4,
            ErrorKind::Decoding => 5,
            ErrorKind::Window => 6,
            ErrorKind::Record => 7,
            ErrorKind::Internal => 70,
        };
    }
    if err.downcast_ref::<ProjectError>().is_some() {
        7
    } else if err.downcast_ref::<std::io::Error>().is_some() {
        3
    } else if err.downcast_ref::<Unsupported>().is_some() {
        2
    } else {
        70
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
