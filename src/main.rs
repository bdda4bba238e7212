//! Signing Detector - Main Entry Point
//!
//! Replays recorded holistic landmarks (JSON Lines, one frame per line) through
//! the signing detector and writes state changes and segments to stdout.
//!
//! Usage: signing-detector [--config <file>] [--frames] [--no-timestamps] [<input.jsonl> | -]

use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process;

use signing_detector::logging::{init_logging, LogConfig};
use signing_detector::{App, DetectorConfig};

/// Parsed command line
struct Args {
    config: Option<PathBuf>,
    emit_frames: bool,
    log: LogConfig,
    input: Option<PathBuf>,
}

fn usage(program: &str) {
    eprintln!(
        "Usage: {} [--config <file>] [--frames] [--no-timestamps] [<input.jsonl> | -]",
        program
    );
    eprintln!();
    eprintln!("Reads one holistic landmark frame per line (stdin when no input is given)");
    eprintln!("and writes JSON Lines records to stdout.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <file>  Load detector config from <file>");
    eprintln!("  --frames         Write a record for every frame");
    eprintln!("  --no-timestamps  Omit timestamps from log lines");
    eprintln!("  -h, --help       Show this help");
}

fn parse_args(program: &str, mut args: impl Iterator<Item = String>) -> Args {
    let mut parsed = Args {
        config: None,
        emit_frames: false,
        log: LogConfig::default(),
        input: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => {
                    eprintln!("Error: --config needs a file path");
                    process::exit(1);
                }
            },
            "--frames" => parsed.emit_frames = true,
            "--no-timestamps" => parsed.log.timestamps = false,
            "-h" | "--help" => {
                usage(program);
                process::exit(0);
            }
            "-" => parsed.input = None,
            other if other.starts_with("--") => {
                eprintln!("Error: unknown option {}", other);
                usage(program);
                process::exit(1);
            }
            other => parsed.input = Some(PathBuf::from(other)),
        }
    }

    parsed
}

fn main() {
    let mut argv = env::args();
    let program = argv.next().unwrap_or_else(|| "signing-detector".to_string());
    let args = parse_args(&program, argv);

    // Initialize logging
    if let Err(e) = init_logging(&args.log) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let mut config = match &args.config {
        Some(path) => match DetectorConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => DetectorConfig::load(),
    };
    if args.emit_frames {
        config.output.emit_frames = true;
    }

    log::info!("Signing Detector v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Config: {:?}", config);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut app = App::new(config);

    let result = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => app.run(BufReader::new(file), &mut out),
            Err(e) => {
                eprintln!("Error: cannot open {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => app.run(io::stdin().lock(), &mut out),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        parse_args("signing-detector", args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.config.is_none());
        assert!(!args.emit_frames);
        assert!(args.log.timestamps);
        assert!(args.input.is_none());
    }

    #[test]
    fn test_flags_and_input() {
        let args = parse(&["--config", "detector.json", "--no-timestamps", "--frames", "capture.jsonl"]);
        assert_eq!(args.config, Some(PathBuf::from("detector.json")));
        assert!(args.emit_frames);
        assert!(!args.log.timestamps);
        assert_eq!(args.input, Some(PathBuf::from("capture.jsonl")));
    }

    #[test]
    fn test_dash_reads_stdin() {
        let args = parse(&["capture.jsonl", "-"]);
        assert!(args.input.is_none());
    }
}
