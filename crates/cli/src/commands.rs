//! Subcommand implementations.

use std::path::{Path, PathBuf};

use vinrec_config::{FeedErrorPolicy, Settings, MAX_WORKERS};
use vinrec_recon::engine::classify_vin;
use vinrec_recon::feed::{dealer_ids, dealer_vins, manufacturer_vins};
use vinrec_recon::{reconcile, ReconOptions, Side, TypeFilter, VinLookup};

use crate::exit_codes::{config_exit_code, EXIT_CONFIG, EXIT_DISCREPANCIES, EXIT_OUTPUT, EXIT_USAGE};
use crate::feeds::FeedLoader;
use crate::lookup::HttpLookup;
use crate::report::{self, RunInputs, RunReport};
use crate::CliError;

/// Flags of `vinrec run`. `None` means "use the config value".
pub(crate) struct RunArgs {
    pub feed: String,
    pub dealer: String,
    pub manufacturer_type: Option<TypeFilter>,
    pub dealer_type: Option<TypeFilter>,
    pub no_lookup: bool,
    pub workers: Option<usize>,
    pub results_out: Option<PathBuf>,
    pub summary_out: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub fail_on_discrepancy: bool,
    pub allow_empty_feeds: bool,
    pub quiet: bool,
}

pub(crate) fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    Settings::load(path).map_err(|e| CliError {
        code: config_exit_code(&e),
        message: e.to_string(),
        hint: None,
    })
}

fn feed_policy(settings: &Settings, allow_empty: bool) -> FeedErrorPolicy {
    if allow_empty {
        FeedErrorPolicy::Empty
    } else {
        settings.feeds.on_error
    }
}

pub(crate) fn cmd_run(settings: Settings, args: RunArgs) -> Result<(), CliError> {
    if args.dealer.trim().is_empty() {
        return Err(CliError::args("--dealer must not be empty"));
    }
    let workers = args.workers.unwrap_or(settings.lookup.workers);
    if workers == 0 || workers > MAX_WORKERS {
        return Err(CliError::args(format!(
            "--workers must be between 1 and {MAX_WORKERS}, got {workers}"
        )));
    }

    let manufacturer_type = args.manufacturer_type.unwrap_or(settings.feeds.manufacturer_type);
    let dealer_type = args.dealer_type.unwrap_or(settings.feeds.dealer_type);
    let manufacturer_url = settings.feeds.manufacturer_url(&args.feed).map_err(|e| CliError {
        code: config_exit_code(&e),
        message: e.to_string(),
        hint: Some("run `vinrec feeds` to list known feed files".into()),
    })?;

    // Set up the lookup before any download so a bad lookup config fails fast.
    let lookup_enabled = settings.lookup.enabled && !args.no_lookup;
    let lookup = if lookup_enabled {
        Some(HttpLookup::from_settings(&settings.lookup)?)
    } else {
        log::info!("lookup disabled: unmatched VINs labelled by side");
        None
    };

    let mut loader = FeedLoader::new(&settings.feeds, feed_policy(&settings, args.allow_empty_feeds))?;
    if !args.quiet {
        eprintln!("Fetching manufacturer feed {} ...", args.feed);
    }
    let manufacturer = loader.load_manufacturer(&manufacturer_url)?;
    if !args.quiet {
        eprintln!("Fetching dealer feed ...");
    }
    let dealer = loader.load_dealer(&settings.feeds.dealer_url)?;

    let left = manufacturer_vins(&manufacturer, manufacturer_type);
    let right = dealer_vins(&dealer, &args.dealer, dealer_type);
    log::info!(
        "manufacturer: {} rows, {} VINs ({manufacturer_type}); dealer: {} rows, {} VINs for {} ({dealer_type})",
        manufacturer.len(),
        left.len(),
        dealer.len(),
        right.len(),
        args.dealer,
    );
    if !dealer.is_empty() && !dealer.iter().any(|r| r.dealer_id == args.dealer) {
        log::warn!("dealer id {} does not appear in the dealer feed", args.dealer);
    }

    let options = ReconOptions { codes: settings.lookup.status_codes(), workers };
    if !args.quiet && lookup.is_some() {
        eprintln!(
            "Looking up {} unmatched VINs ...",
            left.symmetric_difference(&right).count()
        );
    }
    let result = reconcile(&left, &right, lookup.as_ref().map(|l| l as &dyn VinLookup), &options);

    let results_path = args.results_out.unwrap_or_else(|| settings.output.results_file.clone());
    let summary_path = args.summary_out.unwrap_or_else(|| settings.output.summary_file.clone());
    report::write_results_csv(&results_path, &result.outcomes)?;
    report::write_summary_csv(&summary_path, &result.summary.issues)?;

    let inputs = RunInputs {
        feed: args.feed,
        dealer: args.dealer,
        manufacturer_type: manufacturer_type.to_string(),
        dealer_type: dealer_type.to_string(),
        lookup_binding: lookup_enabled.then(|| settings.lookup.binding.to_string()),
        degraded_feeds: loader.degraded().iter().map(|k| k.to_string()).collect(),
    };

    if args.json || args.output.is_some() {
        let json = report::to_json(&RunReport { inputs: &inputs, result: &result })?;
        if let Some(path) = &args.output {
            report::write_json(path, &json)?;
        }
        if args.json {
            println!("{json}");
        }
    }

    if !args.quiet {
        report::print_human(&inputs, &result);
        eprintln!(
            "Wrote {} and {}",
            results_path.display(),
            summary_path.display()
        );
    }

    if args.fail_on_discrepancy && result.summary.discrepancies() > 0 {
        return Err(CliError {
            code: EXIT_DISCREPANCIES,
            message: String::new(),
            hint: None,
        });
    }
    Ok(())
}

/// List dealer ids in order of first appearance.
pub(crate) fn cmd_dealers(settings: Settings, json: bool) -> Result<(), CliError> {
    let mut loader = FeedLoader::new(&settings.feeds, FeedErrorPolicy::Abort)?;
    let records = loader.load_dealer(&settings.feeds.dealer_url)?;
    let ids = dealer_ids(&records);

    if json {
        let out = serde_json::to_string(&ids).map_err(|e| CliError {
            code: EXIT_OUTPUT,
            message: format!("JSON serialization failed: {e}"),
            hint: None,
        })?;
        println!("{out}");
    } else {
        for id in ids {
            println!("{id}");
        }
    }
    Ok(())
}

pub(crate) fn cmd_feeds(settings: Settings) -> Result<(), CliError> {
    if settings.feeds.known_feeds.is_empty() {
        eprintln!("No known feeds configured; any filename under {} is accepted.", settings.feeds.manufacturer_base);
        return Ok(());
    }
    for feed in &settings.feeds.known_feeds {
        println!("{feed}");
    }
    Ok(())
}

/// Classify a single VIN as if it were unmatched on `side`.
pub(crate) fn cmd_lookup(settings: Settings, vin: String, side: Side) -> Result<(), CliError> {
    let vin = vin.trim();
    if vin.is_empty() {
        return Err(CliError::args("VIN must not be empty"));
    }
    let lookup = HttpLookup::from_settings(&settings.lookup)?;
    let label = classify_vin(vin, side, Some(&lookup), &settings.lookup.status_codes());
    println!("{label}");
    Ok(())
}

pub(crate) fn cmd_validate(config: Option<PathBuf>) -> Result<(), CliError> {
    let settings = load_settings(config.as_deref())?;
    if settings.lookup.enabled {
        settings.lookup.endpoint().map_err(|e| CliError {
            code: EXIT_CONFIG,
            message: e.to_string(),
            hint: Some("set lookup.enabled = false to reconcile without lookups".into()),
        })?;
    }

    let source = match &config {
        Some(p) => p.display().to_string(),
        None if Settings::config_path().exists() => Settings::config_path().display().to_string(),
        None => "built-in defaults".to_string(),
    };
    eprintln!("Config OK ({source})");
    eprintln!("  dealer feed:        {}", settings.feeds.dealer_url);
    eprintln!("  manufacturer base:  {}", settings.feeds.manufacturer_base);
    eprintln!("  feed error policy:  {}", settings.feeds.on_error);
    if settings.lookup.enabled {
        eprintln!(
            "  lookup:             {} {} ({} worker(s))",
            settings.lookup.binding, settings.lookup.url, settings.lookup.workers
        );
    } else {
        eprintln!("  lookup:             disabled");
    }
    Ok(())
}

/// Write a commented default config file.
pub(crate) fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = path.unwrap_or_else(Settings::config_path);
    if path.exists() && !force {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("{} already exists", path.display()),
            hint: Some("pass --force to overwrite".into()),
        });
    }
    Settings::write_default(&path).map_err(|e| CliError {
        code: config_exit_code(&e),
        message: e.to_string(),
        hint: None,
    })?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
