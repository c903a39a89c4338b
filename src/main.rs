use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bwprobe::bench::BandwidthProbe;
use bwprobe::config::{ProbeConfig, Settings};
use bwprobe::error::user_friendly_message;
use bwprobe::{logging, Result, APP_NAME};

/// Measure storage bandwidth and IOPS on a mounted filesystem
#[derive(Parser, Debug)]
#[command(name = "bwprobe", version, about, long_about = None)]
struct Cli {
    /// Directory for the scratch file (created if missing)
    test_directory: Option<PathBuf>,

    /// Scratch file size in MB (1-10000, default 2048)
    #[arg(allow_negative_numbers = true)]
    file_size_mb: Option<i64>,

    /// Settings file to read defaults from
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fixed seed for the random offset generator
    #[arg(long)]
    seed: Option<u64>,

    /// Do not draw progress bars during sequential phases
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version land here too
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::set_up_logging(cli.verbose);
    print_usage();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", user_friendly_message(&e));
            return ExitCode::FAILURE;
        }
    };

    // The probe is dropped inside the closure, so the scratch file is
    // removed even when a phase panics.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<()> {
        let mut probe = BandwidthProbe::new(config)?;
        probe.run_all();
        Ok(())
    }));

    match outcome {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("Error: Test failed: {}", user_friendly_message(&e));
            ExitCode::FAILURE
        }
        Err(_) => {
            eprintln!("Error: Test failed");
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the settings file, then positional arguments
fn build_config(cli: &Cli) -> Result<ProbeConfig> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let mut config = ProbeConfig::new().with_settings(&settings)?;

    if let Some(dir) = &cli.test_directory {
        config = config.with_test_dir(dir.clone());
    }
    if let Some(size_mb) = cli.file_size_mb {
        config = config.with_file_size(ProbeConfig::file_size_from_mb(size_mb)?);
    }
    if cli.no_progress {
        config = config.with_show_progress(false);
    }

    config = config.with_seed(cli.seed);
    config.validate()?;
    Ok(config)
}

fn print_usage() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| APP_NAME.to_string());
    println!("Simple Disk Bandwidth Test");
    println!("Usage: {} [test_directory] [file_size_mb]", program);
    println!("Example: {} /data/local/tmp/bandwidth 2048\n", program);
}
