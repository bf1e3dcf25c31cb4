use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use dropout_rs::settings::DEFAULT_CUTOFF;
use dropout_rs::{Registry, RunContext, Settings};
use log::LevelFilter;

/// Train the enrollment dropout models and write submission files.
///
/// Each ROUTINE is run in the order given. Unknown names are reported and
/// skipped.
#[derive(Parser, Debug)]
#[command(name = "dropout-train", version)]
struct Cli {
    /// Routines to run (`lr`, `svc_1`).
    #[arg(value_name = "ROUTINE")]
    routines: Vec<String>,

    /// Directory of cached arrays and dumped models.
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// Directory holding enrollment_test.csv.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory submissions are written to.
    #[arg(long, default_value = "submission")]
    submission_dir: PathBuf,

    /// Dataset cutoff embedded in cache keys.
    #[arg(long, default_value = DEFAULT_CUTOFF)]
    cutoff: String,

    /// Seed for every random draw.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Only log info and above.
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(quiet: bool) {
    let level = if quiet {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} {}\t{}",
                buf.timestamp_millis(),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let settings = Settings {
        cache_dir: cli.cache_dir,
        data_dir: cli.data_dir,
        submission_dir: cli.submission_dir,
        cutoff: cli.cutoff,
        seed: cli.seed,
    };
    let ctx = RunContext::new(settings);
    let registry = Registry::standard();

    let mut stdout = std::io::stdout();
    if let Err(e) = registry.dispatch(cli.routines.as_slice(), &ctx, &mut stdout) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}
