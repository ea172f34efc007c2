use std::path::PathBuf;
use structopt::StructOpt;

use sshd_lens::config::Config;
use sshd_lens::output::{OutputFormat, OutputHandler, Report};
use sshd_lens::{analyze, lines_for_pids, LogFile, SshdParser};

/// sshd log classifier and anomaly analyzer
#[derive(StructOpt, Debug)]
#[structopt(name = "sshd-lens", about = "OpenSSH daemon log anomaly analyzer")]
pub enum Cli {
    /// Analyze a log file and write the anomaly report
    Analyze {
        /// Path to configuration file
        #[structopt(short, long)]
        config: Option<PathBuf>,
        /// Path to log file (overrides the configuration)
        #[structopt(short, long)]
        file: Option<PathBuf>,
        /// Output format: json, jsonl or console (overrides the configuration)
        #[structopt(long)]
        format: Option<String>,
        /// Output file (overrides the configuration)
        #[structopt(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse and display classified entries from a file
    Parse {
        /// Path to log file
        #[structopt(short, long)]
        file: PathBuf,
        /// Number of entries to show
        #[structopt(short, long, default_value = "10")]
        lines: usize,
    },
    /// Print every log line belonging to the given sshd PIDs
    Pids {
        /// Path to log file
        #[structopt(short, long)]
        file: PathBuf,
        /// PIDs to collect
        #[structopt(short, long, required = true)]
        pid: Vec<String>,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::from_args() {
        Cli::Analyze {
            config,
            file,
            format,
            output,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            if file.is_some() {
                config.input.file_path = file;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if output.is_some() {
                config.output.file_path = output;
            }
            run_analysis(&config)?;
        }
        Cli::Parse { file, lines } => {
            let log_file = LogFile::read(&file)?;
            let result = log_file.scan(&SshdParser::new());
            let display_count = std::cmp::min(lines, result.parsed.len());

            println!(
                "Parsed {} entries, {} unrecognized (showing {}):\n",
                result.parsed.len(),
                result.unparsed.len(),
                display_count
            );
            for entry in result.parsed.iter().take(display_count) {
                println!(
                    "  [{}] pid={} ip={} user={} port={}",
                    entry.event_kind.map(|k| k.as_str()).unwrap_or("-"),
                    entry.pid,
                    entry.source_ip,
                    entry.username,
                    entry.port
                );
            }
        }
        Cli::Pids { file, pid } => {
            let log_file = LogFile::read(&file)?;
            let lines = lines_for_pids(log_file.data(), &pid);
            if lines.is_empty() {
                log::warn!("No log lines found for pids {}", pid.join(", "));
                std::process::exit(1);
            }
            for line in lines {
                println!("{}", line);
            }
        }
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
    }

    Ok(())
}

/// Load, scan, analyze and report on the configured log file
fn run_analysis(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = config
        .input
        .file_path
        .as_ref()
        .ok_or("No input file given (use --file or set input.file_path)")?;

    let log_file = LogFile::read(path)?;
    log::info!("Analyzing {:?}", log_file.path());

    let result = log_file.scan(&SshdParser::new());
    let mut analysis = analyze(&result.parsed);
    if config.report.sort_anomalies {
        analysis.sort_anomalies();
    }

    log::info!(
        "{} event(s), {} unrecognized line(s), {} anomaly record(s)",
        analysis.total_events,
        result.unparsed.len(),
        analysis.anomalies.len()
    );

    let mut output_handler = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
    )?;
    let report = Report {
        analysis: &analysis,
        unparsed_lines: config
            .report
            .include_unparsed
            .then(|| result.unparsed.as_slice()),
    };
    output_handler.write_report(&report)?;
    output_handler.flush()?;

    Ok(())
}
