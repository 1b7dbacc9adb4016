// vinrec - reconcile manufacturer and dealer inventory feeds by VIN

mod commands;
mod exit_codes;
mod feeds;
mod http;
mod lookup;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use vinrec_recon::{Side, TypeFilter};

use commands::RunArgs;
use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "vinrec")]
#[command(about = "Reconcile manufacturer and dealer inventory feeds by VIN")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/vinrec/config.toml)
    #[arg(long, global = true, env = "VINREC_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both feeds, reconcile VINs, classify discrepancies
    #[command(after_help = "\
Writes reconciliation_results.csv (VIN,Result) and issue_breakdown.csv
(Issue,Count) unless overridden. Exit code 1 with --fail-on-discrepancy
means at least one VIN is present on only one side.

Examples:
  vinrec run --feed garberchevroletmidland-8710.csv --dealer 8710
  vinrec run --feed garberchevroletmidland-8710.csv --dealer 8710 --type Used
  vinrec run --feed garberchevroletmidland-8710.csv --dealer 8710 --no-lookup --json
  vinrec run --feed garberchevroletmidland-8710.csv --dealer 8710 --workers 4 -q")]
    Run {
        /// Manufacturer feed filename (appended to feeds.manufacturer_base)
        #[arg(long)]
        feed: String,

        /// Dealer id to select from the dealer feed
        #[arg(long)]
        dealer: String,

        /// Manufacturer feed type filter: All, New or Used
        #[arg(long = "type", value_name = "TYPE")]
        manufacturer_type: Option<TypeFilter>,

        /// Dealer feed type filter: All, New or Used
        #[arg(long, value_name = "TYPE")]
        dealer_type: Option<TypeFilter>,

        /// Skip the lookup service; label unmatched VINs by side only
        #[arg(long)]
        no_lookup: bool,

        /// Concurrent lookups (overrides lookup.workers)
        #[arg(long)]
        workers: Option<usize>,

        /// Per-VIN results CSV (overrides output.results_file)
        #[arg(long, value_name = "PATH")]
        results_out: Option<PathBuf>,

        /// Issue count CSV (overrides output.summary_file)
        #[arg(long, value_name = "PATH")]
        summary_out: Option<PathBuf>,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Exit 1 if any VIN is present on only one side
        #[arg(long)]
        fail_on_discrepancy: bool,

        /// Continue with an empty table when a feed cannot be downloaded
        #[arg(long)]
        allow_empty_feeds: bool,

        /// Only print errors
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// List dealer ids found in the dealer feed
    Dealers {
        /// Print a JSON array instead of one id per line
        #[arg(long)]
        json: bool,
    },

    /// List known manufacturer feed filenames
    Feeds,

    /// Classify a single VIN with the lookup service
    #[command(after_help = "\
Examples:
  vinrec lookup 1G1ZD5ST0LF000001
  vinrec lookup 1G1ZD5ST0LF000001 --side right")]
    Lookup {
        vin: String,

        /// Which feed the VIN is exclusive to: left (manufacturer) or right (dealer)
        #[arg(long, default_value = "left")]
        side: Side,
    },

    /// Parse and validate the config without running
    Validate,

    /// Write a commented default config file
    Init {
        /// Destination (default: the standard config path)
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config;
    let settings = || commands::load_settings(config.as_deref());

    let result = match cli.command {
        Commands::Run {
            feed,
            dealer,
            manufacturer_type,
            dealer_type,
            no_lookup,
            workers,
            results_out,
            summary_out,
            json,
            output,
            fail_on_discrepancy,
            allow_empty_feeds,
            quiet,
        } => settings().and_then(|settings| {
            commands::cmd_run(
                settings,
                RunArgs {
                    feed,
                    dealer,
                    manufacturer_type,
                    dealer_type,
                    no_lookup,
                    workers,
                    results_out,
                    summary_out,
                    json,
                    output,
                    fail_on_discrepancy,
                    allow_empty_feeds,
                    quiet,
                },
            )
        }),
        Commands::Dealers { json } => settings().and_then(|s| commands::cmd_dealers(s, json)),
        Commands::Feeds => settings().and_then(commands::cmd_feeds),
        Commands::Lookup { vin, side } => settings().and_then(|s| commands::cmd_lookup(s, vin, side)),
        Commands::Validate => commands::cmd_validate(config.clone()),
        Commands::Init { path, force } => commands::cmd_init(path, force),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
