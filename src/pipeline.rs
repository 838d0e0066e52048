//! End-to-end runs: fetch game details, translate names, extract the names
//! that still need translating, and merge translations into the game list.

use crate::batch::{BatchSummary, ItemOutcome, ItemProcessor, run_batch};
use crate::config::{BatchConfig, RetryPolicy, StorefrontConfig, TranslateConfig};
use crate::display::{NAME_COLUMNS, truncate_to_width};
use crate::error::{HarvestError, Result};
use crate::fetch::{FetchOutcome, Fetcher, HttpStorefront, StoreTransport};
use crate::input::{entry_id, load_app_ids, load_game_values, load_items, pending};
use crate::model::{AppId, GameRecord, Keyed, NameToTranslate, TranslatedName};
use crate::pacing::{Sleeper, ThreadSleeper};
use crate::store::{ResultSet, Stored, load_result_set, write_snapshot};
use crate::transform::to_game_record;
use crate::translate::{TranslateProcessor, TranslatorChain};
use foldhash::HashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fetches and normalizes one app per item.
pub struct StoreProcessor<T, S> {
    fetcher: Fetcher<T, S>,
}

impl<T: StoreTransport, S: Sleeper> StoreProcessor<T, S> {
    pub fn new(fetcher: Fetcher<T, S>) -> Self {
        Self { fetcher }
    }
}

impl<T: StoreTransport, S: Sleeper> ItemProcessor<AppId> for StoreProcessor<T, S> {
    type Record = GameRecord;

    fn key(&self, item: &AppId) -> AppId {
        *item
    }

    fn process(&mut self, item: &AppId) -> ItemOutcome<GameRecord> {
        match self.fetcher.fetch(*item) {
            FetchOutcome::Fetched(details) => {
                let record = to_game_record(*item, details);
                info!(
                    app_id = *item,
                    name = %truncate_to_width(&record.name, NAME_COLUMNS),
                    "Fetched"
                );
                ItemOutcome::Record(record)
            }
            FetchOutcome::Invalid => ItemOutcome::Invalid,
            FetchOutcome::Exhausted => ItemOutcome::Exhausted,
        }
    }
}

/// Seed files followed by the output file: the order results are merged in.
fn result_sources(batch: &BatchConfig) -> Vec<PathBuf> {
    let mut sources = batch.seeds.clone();
    sources.push(batch.output.clone());
    sources
}

fn load_previous<R: Keyed>(batch: &BatchConfig) -> Result<ResultSet<Stored<R>>> {
    load_result_set(&result_sources(batch))
}

/// Fetch pipeline over an arbitrary transport and sleeper.
pub fn fetch_games<T, S>(
    input: &Path,
    batch: &BatchConfig,
    retry: &RetryPolicy,
    transport: T,
    sleeper: &S,
) -> Result<BatchSummary>
where
    T: StoreTransport,
    S: Sleeper,
{
    batch.validate()?;
    retry.validate()?;

    let ids = load_app_ids(input)?;
    let mut results: ResultSet<Stored<GameRecord>> = load_previous(batch)?;
    let requested = ids.len();
    let todo = pending(ids, &results, |id| *id);
    info!(
        requested,
        already_done = requested - todo.len(),
        pending = todo.len(),
        "Work list loaded"
    );

    let fetcher = Fetcher::new(transport, retry.clone(), sleeper);
    let mut processor = StoreProcessor::new(fetcher);
    run_batch(&todo, &mut results, &mut processor, batch, sleeper)
}

/// Fetch pipeline against the real storefront.
pub fn run_fetch(
    input: &Path,
    batch: &BatchConfig,
    storefront: &StorefrontConfig,
) -> Result<BatchSummary> {
    storefront.validate()?;
    let transport = HttpStorefront::new(storefront)?;
    fetch_games(input, batch, &storefront.retry, transport, &ThreadSleeper)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateSummary {
    pub batch: BatchSummary,
    /// Names for which every provider failed and the original was kept.
    pub fallbacks: usize,
}

/// Translation pipeline over a prepared provider chain.
pub fn translate_names<S: Sleeper>(
    input: &Path,
    batch: &BatchConfig,
    chain: TranslatorChain,
    sleeper: &S,
) -> Result<TranslateSummary> {
    batch.validate()?;

    let names: Vec<NameToTranslate> = load_items(input)?;
    let mut results: ResultSet<Stored<TranslatedName>> = load_previous(batch)?;
    let todo = pending(names, &results, |name| name.app_id);
    info!(
        pending = todo.len(),
        providers = ?chain.provider_names(),
        "Translation list loaded"
    );

    let mut processor = TranslateProcessor::new(chain);
    let summary = run_batch(&todo, &mut results, &mut processor, batch, sleeper)?;
    Ok(TranslateSummary {
        batch: summary,
        fallbacks: processor.fallbacks(),
    })
}

/// Translation pipeline against the configured providers.
pub fn run_translate(
    input: &Path,
    batch: &BatchConfig,
    translate: &TranslateConfig,
) -> Result<TranslateSummary> {
    let chain = TranslatorChain::from_config(translate)?;
    translate_names(input, batch, chain, &ThreadSleeper)
}

fn has_ascii_letter(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Absent, `null` and `""` all count as "no value".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Writes `[{appId, nameEn}]` for every game that has no `nameEn` yet and
/// whose `name` contains Latin letters. Returns the number of names written.
pub fn extract_untranslated(games: &Path, output: &Path) -> Result<usize> {
    let entries = load_game_values(games)?;

    let mut names: ResultSet<NameToTranslate> = ResultSet::new();
    for (idx, entry) in entries.iter().enumerate() {
        let has_name_en = !is_blank(entry.get("nameEn"));
        let Some(name) = entry.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        if has_name_en || !has_ascii_letter(name) {
            continue;
        }
        let app_id = entry_id(entry).ok_or_else(|| {
            HarvestError::invalid_input(games, format!("entry {} has no identifier", idx))
        })?;
        names.push_new(NameToTranslate {
            app_id,
            name_en: name.to_string(),
        });
    }

    write_snapshot(output, names.records())?;
    info!(
        games = entries.len(),
        to_translate = names.len(),
        output = %output.display(),
        "Extracted names needing translation"
    );
    Ok(names.len())
}

/// Counters from [`merge_translations`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub games: usize,
    /// Games that have an entry in the translation file.
    pub matched: usize,
    /// Games whose `name` was replaced by the translation.
    pub renamed: usize,
}

/// Reads `{appId, nameZh}` entries into a lookup. Later entries win; entries
/// with an empty translation are ignored.
fn translation_map(path: &Path) -> Result<HashMap<AppId, String>> {
    let mut map: HashMap<AppId, String> = Default::default();
    for (idx, entry) in load_game_values(path)?.iter().enumerate() {
        let app_id = entry_id(entry).ok_or_else(|| {
            HarvestError::invalid_input(path, format!("entry {} has no identifier", idx))
        })?;
        match entry.get("nameZh").and_then(|v| v.as_str()) {
            Some(name_zh) if !name_zh.is_empty() => {
                map.insert(app_id, name_zh.to_string());
            }
            _ => debug!(app_id, "No translation in entry"),
        }
    }
    Ok(map)
}

/// Applies translated names to a game list and writes the result to `output`,
/// which may be the game list itself.
///
/// A game is renamed only when its translation differs from its current
/// `name`. The previous name moves to `nameEn` unless `nameEn` is already set.
/// Every other field is left exactly as it was.
pub fn merge_translations(games: &Path, translated: &Path, output: &Path) -> Result<MergeSummary> {
    let mut entries = load_game_values(games)?;
    let translations = translation_map(translated)?;
    let mut summary = MergeSummary {
        games: entries.len(),
        ..MergeSummary::default()
    };

    for entry in entries.iter_mut() {
        let Some(name_zh) = entry_id(entry).and_then(|id| translations.get(&id)) else {
            continue;
        };
        summary.matched += 1;

        let Value::Object(game) = entry else {
            continue;
        };
        let current = game.get("name").and_then(|v| v.as_str()).unwrap_or("");
        if current == name_zh {
            continue;
        }
        if is_blank(game.get("nameEn")) {
            let previous = game.get("name").cloned().unwrap_or(Value::Null);
            game.insert("nameEn".to_string(), previous);
        }
        game.insert("name".to_string(), Value::String(name_zh.clone()));
        summary.renamed += 1;
    }

    write_snapshot(output, &entries)?;
    info!(
        games = summary.games,
        translations = translations.len(),
        matched = summary.matched,
        renamed = summary.renamed,
        output = %output.display(),
        "Merged translated names"
    );
    Ok(summary)
}
