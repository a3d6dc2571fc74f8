use anyhow::Result;
use std::path::PathBuf;

use estat::cli::{CacheArgs, Cli, Commands, ConfigCommands};
use estat::config::Config;
use estat::display::{display_array_overview, display_catalog, display_error};
use estat::{fetch_indicators, FetchOptions, FreshnessPolicy, MarkerSet};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let result = run(cli);

    if let Err(e) = &result {
        display_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch {
            ids,
            cache,
            keep_markers,
            legacy_markers,
            json,
        } => cmd_fetch(&ids, &cache, keep_markers, legacy_markers, json),
        Commands::Catalog {
            search,
            limit,
            cache,
        } => cmd_catalog(search.as_deref(), limit, &cache),
        Commands::Config { action } => cmd_config(action),
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// Handle `fetch` command
fn cmd_fetch(
    ids: &[String],
    cache: &CacheArgs,
    keep_markers: bool,
    legacy_markers: bool,
    json: bool,
) -> Result<()> {
    let mut opts = fetch_options(cache, None)?;
    if keep_markers {
        opts.drop_markers = false;
    }
    if legacy_markers {
        opts.markers = MarkerSet::Legacy;
    }

    let arrays = fetch_indicators(ids, &opts)?.into_set(ids);

    if json {
        println!("{}", serde_json::to_string_pretty(&arrays)?);
        return Ok(());
    }

    for (id, array) in &arrays {
        display_array_overview(id, array);
    }
    Ok(())
}

/// Handle `catalog` command
fn cmd_catalog(search: Option<&str>, limit: usize, cache: &CacheArgs) -> Result<()> {
    let opts = fetch_options(cache, Some(FreshnessPolicy::PublicationSchedule))?;
    let catalog = opts.cache()?.get_catalog(&opts.max_age)?;

    let matches = match search {
        Some(text) => catalog.search(text),
        None => catalog.entries.iter().collect(),
    };
    let shown: Vec<_> = matches.into_iter().take(limit).collect();

    display_catalog(&shown, catalog.len());
    Ok(())
}

/// Handle `config` subcommands
fn cmd_config(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let config = Config::load_effective()?;
            let config_path = Config::file_path()?;
            let exists = Config::exists();

            println!();
            println!("estat Configuration:");
            println!("  Config file: {}", config_path.display());
            println!("  File exists: {}", if exists { "yes" } else { "no (using defaults)" });
            println!();
            println!("  Cache dir: {}", display_path(config.resolved_cache_dir()));
            println!("  Max age: {}", config.max_age);
            println!("  Drop markers: {}", config.drop_markers);
            println!("  Base URL: {}", config.base_url);
            println!("  Catalog URL: {}", config.catalog_url);
            println!();
            Ok(())
        }
        ConfigCommands::Set {
            cache_dir,
            max_age,
            base_url,
        } => {
            if cache_dir.is_none() && max_age.is_none() && base_url.is_none() {
                println!("No value provided to set.");
                println!("Usage: estat config set [--cache-dir DIR] [--max-age AGE] [--base-url URL]");
                return Ok(());
            }

            let mut config = Config::load()?;
            if let Some(dir) = cache_dir {
                config.cache_dir = Some(dir);
            }
            if let Some(age) = max_age {
                config.max_age = age;
            }
            if let Some(url) = base_url {
                config.base_url = url;
            }

            config.validate()?;
            config.save()?;

            println!("Saved configuration to {}", Config::file_path()?.display());
            Ok(())
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Build fetch options from config, then apply command-line overrides
fn fetch_options(cache: &CacheArgs, default_policy: Option<FreshnessPolicy>) -> Result<FetchOptions> {
    let config = Config::load_effective()?;
    config.validate()?;
    let mut opts = config.fetch_options()?;

    if let Some(policy) = default_policy {
        opts.max_age = policy;
    }
    if let Some(policy) = cache.max_age {
        opts.max_age = policy;
    }
    if let Some(dir) = &cache.cache_dir {
        opts.cache_dir = Some(dir.clone());
    }
    if cache.no_cache {
        opts.cache_dir = None;
    }

    Ok(opts)
}

fn display_path(path: Option<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}
