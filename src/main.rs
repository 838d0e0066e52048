//! # steam-harvest
//!
//! Command-line entry point for fetching storefront game details and
//! translating game names in resumable, rate-limited batches.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use steam_harvest::batch::BatchSummary;
use steam_harvest::config::{
    BaiduCredentials, BatchConfig, ProviderKind, RetryPolicy, StorefrontConfig, TranslateConfig,
    parse_endpoint_override,
};
use steam_harvest::logging::{LogConfig, LogLevel, init_logging};
use steam_harvest::pipeline;

use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "steam-harvest: fetch storefront game details and translate game names.\n\
                  Every run skips work already present in its output file and checkpoints \
                  periodically, so an interrupted run can simply be started again."
)]
struct Args {
    /// Log debug output (overrides LOG_LEVEL)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch app details for a list of app ids
    Fetch(FetchArgs),
    /// Translate game names to Chinese
    Translate(TranslateArgs),
    /// List games whose names still need translating
    Extract(ExtractArgs),
    /// Write translated names back into the game list
    Merge(MergeArgs),
}

#[derive(ClapArgs, Debug)]
struct BatchArgs {
    /// Earlier result files to merge before the output (repeatable)
    #[arg(long = "seed")]
    seeds: Vec<PathBuf>,

    /// Write a checkpoint after this many items
    #[arg(long, default_value_t = 50)]
    checkpoint_every: usize,
}

#[derive(ClapArgs, Debug)]
struct FetchArgs {
    /// JSON array of app ids, or of objects carrying `appid`
    #[arg(short, long, default_value = "data/missing_appids.json")]
    input: PathBuf,

    /// Output / checkpoint file
    #[arg(short, long, default_value = "data/fetched_games.json")]
    output: PathBuf,

    #[command(flatten)]
    batch: BatchArgs,

    /// Storefront language (e.g. english, schinese)
    #[arg(long, default_value = "english")]
    locale: String,

    /// Storefront country code for prices (e.g. us, cn)
    #[arg(long, default_value = "us")]
    region: String,

    /// Attempts per app before giving up
    #[arg(long, default_value_t = 5)]
    retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 20)]
    timeout_secs: u64,

    /// Pause between apps in milliseconds
    #[arg(long, default_value_t = 1500)]
    delay_ms: u64,

    /// Base wait after HTTP 429, in seconds
    #[arg(long, default_value_t = 30)]
    rate_limit_secs: u64,
}

#[derive(ClapArgs, Debug)]
struct TranslateArgs {
    /// JSON array of `{appId, nameEn}` objects
    #[arg(short, long, default_value = "data/games_to_translate.json")]
    input: PathBuf,

    /// Output / checkpoint file
    #[arg(short, long, default_value = "data/games_translated.json")]
    output: PathBuf,

    #[command(flatten)]
    batch: BatchArgs,

    /// Providers to try, in order
    #[arg(short, long, value_enum, value_delimiter = ',', default_value = "google")]
    providers: Vec<ProviderKind>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Pause between names in milliseconds
    #[arg(long, default_value_t = 1100)]
    delay_ms: u64,

    /// Replace a provider's endpoint, as PROVIDER=URL (repeatable)
    #[arg(long = "endpoint", value_name = "PROVIDER=URL", value_parser = endpoint_arg)]
    endpoints: Vec<(ProviderKind, String)>,
}

fn endpoint_arg(text: &str) -> std::result::Result<(ProviderKind, String), String> {
    parse_endpoint_override(text).map_err(|err| err.to_string())
}

#[derive(ClapArgs, Debug)]
struct ExtractArgs {
    /// Game list to scan
    #[arg(short, long, default_value = "data/games.json")]
    games: PathBuf,

    /// Where to write the names needing translation
    #[arg(short, long, default_value = "data/games_to_translate.json")]
    output: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct MergeArgs {
    /// Game list to update
    #[arg(short, long, default_value = "data/games.json")]
    games: PathBuf,

    /// Translation results (`{appId, nameZh}` entries)
    #[arg(short, long, default_value = "data/games_translated.json")]
    translated: PathBuf,

    /// Where to write the merged list (defaults to the game list itself)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl BatchArgs {
    fn into_config(self, output: PathBuf, delay_ms: u64) -> BatchConfig {
        let mut config = BatchConfig::new(output);
        config.seeds = self.seeds;
        config.checkpoint_every = self.checkpoint_every;
        config.item_delay = Duration::from_millis(delay_ms);
        config
    }
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("[OK] Done");
    println!("  Succeeded: {}", summary.succeeded);
    println!(
        "  Skipped:   {} (invalid {}, failed {})",
        summary.skipped(),
        summary.invalid,
        summary.exhausted
    );
    println!("  Total:     {}", summary.total_records);
}

fn run_fetch(args: FetchArgs) -> Result<()> {
    let storefront = StorefrontConfig {
        locale: args.locale,
        region: args.region,
        timeout: Duration::from_secs(args.timeout_secs),
        retry: RetryPolicy {
            max_attempts: args.retries,
            rate_limit_backoff: Duration::from_secs(args.rate_limit_secs),
            ..RetryPolicy::default()
        },
        ..StorefrontConfig::from_env()
    };
    let output = args.output.clone();
    let batch = args.batch.into_config(args.output, args.delay_ms);

    let summary = pipeline::run_fetch(&args.input, &batch, &storefront)
        .with_context(|| format!("Fetch run from {} failed", args.input.display()))?;
    print_summary(&summary);
    println!("  Saved to:  {}", output.display());
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    let mut endpoints = TranslateConfig::endpoints_from_env();
    endpoints.extend(args.endpoints);
    let translate = TranslateConfig {
        providers: args.providers,
        timeout: Duration::from_secs(args.timeout_secs),
        baidu: BaiduCredentials::from_env(),
        endpoints,
    };
    let output = args.output.clone();
    let batch = args.batch.into_config(args.output, args.delay_ms);

    let summary = pipeline::run_translate(&args.input, &batch, &translate)
        .with_context(|| format!("Translation run from {} failed", args.input.display()))?;
    print_summary(&summary.batch);
    println!("  Untranslated (kept original): {}", summary.fallbacks);
    println!("  Saved to:  {}", output.display());
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let count = pipeline::extract_untranslated(&args.games, &args.output)
        .with_context(|| format!("Could not extract names from {}", args.games.display()))?;
    println!("Games needing translation: {}", count);
    println!("Saved to {}", args.output.display());
    Ok(())
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let output = args.output.unwrap_or_else(|| args.games.clone());
    let summary = pipeline::merge_translations(&args.games, &args.translated, &output)
        .with_context(|| {
            format!(
                "Could not merge {} into {}",
                args.translated.display(),
                args.games.display()
            )
        })?;
    println!("Games:            {}", summary.games);
    println!("With translation: {}", summary.matched);
    println!("Renamed:          {}", summary.renamed);
    println!("Saved to {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut log_config = LogConfig::from_env()?;
    if args.verbose {
        log_config.level = LogLevel::Debug;
    }
    init_logging(&log_config)?;

    match args.command {
        Command::Fetch(fetch) => run_fetch(fetch),
        Command::Translate(translate) => run_translate(translate),
        Command::Extract(extract) => run_extract(extract),
        Command::Merge(merge) => run_merge(merge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_fetch_defaults() {
        let args = Args::parse_from(["steam-harvest", "fetch"]);
        let Command::Fetch(fetch) = args.command else {
            panic!("expected fetch");
        };
        assert_eq!(fetch.retries, 5);
        assert_eq!(fetch.batch.checkpoint_every, 50);
        assert_eq!(fetch.delay_ms, 1500);
        assert!(fetch.batch.seeds.is_empty());
    }

    #[test]
    fn test_translate_provider_list() {
        let args = Args::parse_from([
            "steam-harvest",
            "translate",
            "--providers",
            "mymemory,libre",
            "--seed",
            "old.json",
        ]);
        let Command::Translate(translate) = args.command else {
            panic!("expected translate");
        };
        assert_eq!(
            translate.providers,
            vec![ProviderKind::Mymemory, ProviderKind::Libre]
        );
        assert_eq!(translate.batch.seeds, vec![PathBuf::from("old.json")]);
        assert!(translate.endpoints.is_empty());
    }

    #[test]
    fn test_merge_writes_in_place_by_default() {
        let args = Args::parse_from(["steam-harvest", "merge"]);
        let Command::Merge(merge) = args.command else {
            panic!("expected merge");
        };
        assert_eq!(merge.games, PathBuf::from("data/games.json"));
        assert_eq!(merge.translated, PathBuf::from("data/games_translated.json"));
        assert!(merge.output.is_none());
    }

    #[test]
    fn test_translate_endpoint_flags() {
        let args = Args::parse_from([
            "steam-harvest",
            "translate",
            "--endpoint",
            "libre=http://localhost:5000/translate",
            "--endpoint",
            "google=http://localhost:8080/single",
        ]);
        let Command::Translate(translate) = args.command else {
            panic!("expected translate");
        };
        assert_eq!(
            translate.endpoints,
            vec![
                (ProviderKind::Libre, "http://localhost:5000/translate".to_string()),
                (ProviderKind::Google, "http://localhost:8080/single".to_string()),
            ]
        );

        let bad = Args::try_parse_from(["steam-harvest", "translate", "--endpoint", "nowhere"]);
        assert!(bad.is_err());
    }
}
