//! ustat - Kernel counter sampler.
//!
//! Supports two modes:
//! - Record (default): sample `/proc` counters once per interval and write
//!   a delimited text stream
//! - Report: summarise a recording as mean (SD) tables
//!
//! Usage:
//!   ustat -c -i                    # CPU and interrupts to stdout, every second
//!   ustat -n -o net.tsv --count 60 # one minute of network counters
//!   ustat -c --grep '^cpu0\.'      # only the columns of cpu0
//!   ustat report net.tsv           # summarise a recording

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use ustat::collector::{Collector, Domain, RealFs, procfs_engine};
use ustat::error::UstatError;
use ustat::report::{self, ReportOptions};
use ustat::sampler::{ColumnFilter, Recorder};

/// Kernel counter sampler.
#[derive(Parser, Debug)]
#[command(
    name = "ustat",
    about = "Kernel counter sampler",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    record: RecordArgs,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample counters and write a recording (default).
    Record(RecordArgs),
    /// Summarise a recording.
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Record per-CPU utilization from /proc/stat.
    #[arg(short, long)]
    cpu: bool,

    /// Record per-CPU interrupt counts from /proc/interrupts.
    #[arg(short, long = "int")]
    int: bool,

    /// Record per-CPU soft-IRQ counts from /proc/softirqs.
    #[arg(short, long)]
    softirq: bool,

    /// Record network interface counters from /proc/net/dev.
    #[arg(short, long)]
    net: bool,

    /// Record disk sector counters from /proc/diskstats.
    #[arg(short, long)]
    disk: bool,

    /// Output file. Default: stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Keep only columns whose name matches this regular expression.
    #[arg(long, value_name = "REGEX")]
    grep: Option<String>,

    /// Field delimiter (a single character, `\t` for tab).
    #[arg(long, default_value = "\t", value_parser = parse_delimiter)]
    delimiter: char,

    /// Sampling interval in seconds (at most one day).
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..=86400))]
    interval: u64,

    /// Stop after this many rows.
    #[arg(long, value_name = "N")]
    count: Option<u64>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,
}

impl RecordArgs {
    /// Enabled domains in column order.
    fn domains(&self) -> Vec<Domain> {
        [
            (self.cpu, Domain::Cpu),
            (self.int, Domain::Interrupts),
            (self.softirq, Domain::SoftIrqs),
            (self.net, Domain::Net),
            (self.disk, Domain::Disk),
        ]
        .into_iter()
        .filter_map(|(enabled, domain)| enabled.then_some(domain))
        .collect()
    }
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Field delimiter of the recording.
    #[arg(long, default_value = "\t", value_parser = parse_delimiter)]
    delimiter: char,

    /// Also summarise network and disk columns.
    #[arg(long)]
    extended: bool,

    /// Recording to summarise.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

/// Parses a delimiter argument: exactly one character, or the `\t` escape.
fn parse_delimiter(s: &str) -> Result<char, String> {
    if s == "\\t" {
        return Ok('\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("delimiter must be a single character, got '{}'", s)),
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr since stdout may carry the recording.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_record(args: RecordArgs) -> Result<(), UstatError> {
    let domains = args.domains();
    if domains.is_empty() {
        return Err(UstatError::config(
            "No stats enabled; select at least one of --cpu, --int, --softirq, --net, --disk",
        ));
    }

    let filter = ColumnFilter::new(args.grep.as_deref())?;

    let fs = RealFs::new();
    let mut collectors: Vec<Box<dyn Collector>> = Vec::with_capacity(domains.len());
    for domain in domains {
        let collector = procfs_engine(fs, &args.proc_path, domain)?;
        debug!(
            "{} collector: {} columns",
            domain,
            collector.metrics().len()
        );
        collectors.push(collector);
    }

    let out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| UstatError::io(path, e))?;
            info!("Writing to {}", path.display());
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut recorder = Recorder::new(collectors, &filter, args.delimiter, out)?;

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    recorder.write_preamble()?;
    recorder.run(Duration::from_secs(args.interval), &running, args.count)?;
    recorder.finish()?;
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), UstatError> {
    let options = ReportOptions {
        delimiter: args.delimiter,
        extended: args.extended,
    };
    let text = report::generate_file(&args.file, &options)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn main() {
    // Usage errors share the configuration exit status.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Some(Command::Record(args)) => run_record(args),
        Some(Command::Report(args)) => run_report(args),
        None => run_record(cli.record),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_record_flags_without_subcommand() {
        let cli = Cli::try_parse_from(["ustat", "-c", "-n", "--grep", "eth0"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.record.domains(), vec![Domain::Cpu, Domain::Net]);
        assert_eq!(cli.record.grep.as_deref(), Some("eth0"));
        assert_eq!(cli.record.delimiter, '\t');
        assert_eq!(cli.record.interval, 1);
    }

    #[test]
    fn test_domain_order_follows_columns() {
        let cli = Cli::try_parse_from(["ustat", "record", "-d", "-s", "-i", "-c"]).unwrap();
        let Some(Command::Record(args)) = cli.command else {
            panic!("expected record subcommand");
        };
        assert_eq!(
            args.domains(),
            vec![
                Domain::Cpu,
                Domain::Interrupts,
                Domain::SoftIrqs,
                Domain::Disk
            ]
        );
    }

    #[test]
    fn test_report_subcommand() {
        let cli = Cli::try_parse_from([
            "ustat",
            "-v",
            "report",
            "--delimiter",
            ",",
            "--extended",
            "run.csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Some(Command::Report(args)) = cli.command else {
            panic!("expected report subcommand");
        };
        assert_eq!(args.delimiter, ',');
        assert!(args.extended);
        assert_eq!(args.file, PathBuf::from("run.csv"));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(","), Ok(','));
        assert_eq!(parse_delimiter("\\t"), Ok('\t'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["ustat", "-c", "--interval", "0"]).is_err());
    }

    #[test]
    fn test_interval_upper_bound() {
        assert!(Cli::try_parse_from(["ustat", "-c", "--interval", "86400"]).is_ok());
        assert!(Cli::try_parse_from(["ustat", "-c", "--interval", "86401"]).is_err());
        let max = u64::MAX.to_string();
        assert!(Cli::try_parse_from(["ustat", "-c", "--interval", max.as_str()]).is_err());
    }

    #[test]
    fn test_no_domains_is_config_error() {
        let cli = Cli::try_parse_from(["ustat"]).unwrap();
        let err = run_record(cli.record).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
