//! fanhash CLI - compute several chained hashes over one read of the input

use clap::Parser;
use fanhash::config::{CliArgs, EngineConfig, OutputFormat};
use fanhash::engine::{FanOutEngine, FanOutRequest, InputSource};
use fanhash::error::{FanHashError, Result};
use fanhash::hash::{parse_pipelines, HashResult, StreamHash};
use serde::Serialize;
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// One output record per hashed input
#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    pipelines: Vec<String>,
    hashes: &'a [HashResult],
}

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    if args.license {
        print!("{}", fanhash::LICENSE);
        return;
    }

    // Initialize logging
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Hash every requested input; `Ok(false)` if any of them failed
fn run(args: &CliArgs) -> Result<bool> {
    let config = EngineConfig::from_cli(args).map_err(FanHashError::Config)?;
    let pipelines = parse_pipelines(&args.encodings, config.buffer_size)?;
    let engine = FanOutEngine::new(config);

    tracing::info!(
        "Pipelines: {}",
        pipelines.iter().map(|p| p.label()).collect::<Vec<_>>().join(", ")
    );

    let mut all_ok = true;

    for path in &args.files {
        let label = format!("file|{}", path.display());
        let outcome = File::open(path)
            .map_err(FanHashError::from)
            .and_then(|file| {
                engine.dispatch(FanOutRequest {
                    input: InputSource::stream(file),
                    pipelines: pipelines.clone(),
                })
            });
        all_ok &= emit(&label, &pipelines, outcome, args.output_format);
    }

    for value in &args.strings {
        let label = format!("input|{}", value);
        let outcome = engine.dispatch(FanOutRequest {
            input: InputSource::from(value.as_str()),
            pipelines: pipelines.clone(),
        });
        all_ok &= emit(&label, &pipelines, outcome, args.output_format);
    }

    if args.files.is_empty() && args.strings.is_empty() {
        let outcome = engine.run(std::io::stdin().lock(), &pipelines);
        all_ok &= emit("stdin", &pipelines, outcome, args.output_format);
    }

    Ok(all_ok)
}

/// Print one input's results, or its failures; returns whether it succeeded
fn emit(
    label: &str,
    pipelines: &[Arc<dyn StreamHash>],
    outcome: Result<Vec<HashResult>>,
    format: OutputFormat,
) -> bool {
    let hashes = match outcome {
        Ok(hashes) => hashes,
        Err(e) => {
            eprintln!("{}:", label);
            print_error(&e);
            return false;
        }
    };

    match format {
        OutputFormat::Text => {
            let line: Vec<String> = hashes.iter().map(|h| h.to_hex()).collect();
            println!("{}: {}", label, line.join(" "));
        }
        OutputFormat::Json => {
            let report = Report {
                input: label,
                pipelines: pipelines.iter().map(|p| p.label()).collect(),
                hashes: &hashes,
            };
            match serde_json::to_string(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: failed to encode results for {}: {}", label, e);
                    return false;
                }
            }
        }
    }

    true
}

fn print_error(error: &FanHashError) {
    match error {
        FanHashError::FanOut(aggregate) => {
            for failure in aggregate.failures() {
                eprintln!("Error: {}", failure);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}
