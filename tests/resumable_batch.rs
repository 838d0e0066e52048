use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use steam_harvest::config::{BatchConfig, RetryPolicy};
use steam_harvest::fetch::{Attempt, StoreTransport, classify_response};
use steam_harvest::model::{AppId, TranslatedName};
use steam_harvest::pacing::Sleeper;
use steam_harvest::pipeline::{fetch_games, translate_names};
use steam_harvest::translate::{Translator, TranslatorChain};
use steam_harvest::{HarvestError, Result};

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// Answers like the storefront: ids in `invalid` report `success: false`,
/// ids in `failing` always return HTTP 503, everything else succeeds.
struct FakeStore {
    invalid: Vec<AppId>,
    failing: Vec<AppId>,
    requested: RefCell<Vec<AppId>>,
    observed_output: Option<PathBuf>,
    snapshots: RefCell<Vec<BTreeSet<u64>>>,
}

impl FakeStore {
    fn new(invalid: Vec<AppId>, failing: Vec<AppId>) -> Self {
        Self {
            invalid,
            failing,
            requested: RefCell::new(Vec::new()),
            observed_output: None,
            snapshots: RefCell::new(Vec::new()),
        }
    }

    fn watching(mut self, output: &Path) -> Self {
        self.observed_output = Some(output.to_path_buf());
        self
    }
}

impl StoreTransport for FakeStore {
    fn request(&self, app_id: AppId) -> Attempt {
        self.requested.borrow_mut().push(app_id);

        if let Some(path) = &self.observed_output
            && path.exists()
        {
            let text = fs::read_to_string(path).unwrap();
            let value: Value = serde_json::from_str(&text).expect("checkpoint must be valid JSON");
            self.snapshots.borrow_mut().push(app_ids(&value));
        }

        if self.failing.contains(&app_id) {
            return classify_response(app_id, 503, "");
        }
        let body = if self.invalid.contains(&app_id) {
            json!({ app_id.to_string(): {"success": false} })
        } else {
            json!({ app_id.to_string(): {
                "success": true,
                "data": {"type": "game", "name": format!("Game {}: Remastered", app_id)}
            }})
        };
        classify_response(app_id, 200, &body.to_string())
    }
}

fn app_ids(value: &Value) -> BTreeSet<u64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["appId"].as_u64().unwrap())
        .collect()
}

fn read_output(path: &Path) -> Vec<Value> {
    let text = fs::read_to_string(path).unwrap();
    serde_json::from_str::<Value>(&text)
        .unwrap()
        .as_array()
        .unwrap()
        .clone()
}

fn write_json(path: &Path, value: Value) {
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        ..RetryPolicy::default()
    }
}

#[test]
fn test_invalid_item_is_skipped_and_order_kept() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.json");
    write_json(&input, json!([10, 20, 30]));
    let batch = BatchConfig::new(dir.path().join("games.json"));

    let store = FakeStore::new(vec![20], vec![]);
    let summary = fetch_games(&input, &batch, &fast_retry(), &store, &NoSleep).unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.invalid, 1);
    assert_eq!(*store.requested.borrow(), vec![10, 20, 30]);

    let records = read_output(&batch.output);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["appId"], json!(10));
    assert_eq!(records[0]["slug"], json!("game-10-remastered"));
    assert_eq!(records[1]["appId"], json!(30));
}

#[test]
fn test_failed_item_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.json");
    write_json(&input, json!([1, 2, 3]));
    let batch = BatchConfig::new(dir.path().join("games.json"));

    let store = FakeStore::new(vec![], vec![2]);
    let summary = fetch_games(&input, &batch, &fast_retry(), &store, &NoSleep).unwrap();

    assert_eq!(summary.exhausted, 1);
    assert_eq!(summary.succeeded, 2);
    // three attempts for the failing id, one for each of the others
    assert_eq!(*store.requested.borrow(), vec![1, 2, 2, 2, 3]);
    let saved = app_ids(&Value::Array(read_output(&batch.output)));
    assert_eq!(saved, BTreeSet::from([1, 3]));
}

#[test]
fn test_rerun_skips_finished_ids() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.json");
    write_json(&input, json!([{"appid": 1}, {"appid": 2}, {"appid": 3}]));
    let batch = BatchConfig::new(dir.path().join("games.json"));

    let first = FakeStore::new(vec![], vec![2]);
    fetch_games(&input, &batch, &fast_retry(), &first, &NoSleep).unwrap();

    let second = FakeStore::new(vec![], vec![]);
    let summary = fetch_games(&input, &batch, &fast_retry(), &second, &NoSleep).unwrap();

    assert_eq!(*second.requested.borrow(), vec![2]);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.total_records, 3);

    let records = read_output(&batch.output);
    let keys: Vec<u64> = records.iter().map(|r| r["appId"].as_u64().unwrap()).collect();
    assert_eq!(keys, vec![1, 3, 2]);
}

#[test]
fn test_seed_files_count_as_done() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.json");
    write_json(&input, json!([5, 6, 7]));
    let seed = dir.path().join("existing.json");
    let prior = json!({
        "appId": 6,
        "name": "Already Here",
        "nameEn": "Already Here",
        "price": {"currency": "USD", "initial": 999, "final": 199, "recurring_sub": 42}
    });
    write_json(&seed, json!([prior.clone()]));
    let mut batch = BatchConfig::new(dir.path().join("games.json"));
    batch.seeds.push(seed);

    let store = FakeStore::new(vec![], vec![]);
    fetch_games(&input, &batch, &fast_retry(), &store, &NoSleep).unwrap();

    assert_eq!(*store.requested.borrow(), vec![5, 7]);
    let records = read_output(&batch.output);
    assert_eq!(records[0], prior, "seed records are carried over unchanged");
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["slug"], json!("game-5-remastered"));
}

#[test]
fn test_checkpoints_are_valid_and_grow() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.json");
    write_json(&input, json!([1, 2, 3, 4, 5, 6, 7]));
    let mut batch = BatchConfig::new(dir.path().join("games.json"));
    batch.checkpoint_every = 2;

    let store = FakeStore::new(vec![4], vec![]).watching(&batch.output);
    let summary = fetch_games(&input, &batch, &fast_retry(), &store, &NoSleep).unwrap();
    assert_eq!(summary.checkpoints, 3);

    let final_ids = app_ids(&Value::Array(read_output(&batch.output)));
    let snapshots = store.snapshots.borrow();
    assert!(!snapshots.is_empty());
    for pair in snapshots.windows(2) {
        assert!(pair[0].is_subset(&pair[1]));
    }
    for snapshot in snapshots.iter() {
        assert!(snapshot.is_subset(&final_ids));
    }
    assert_eq!(final_ids, BTreeSet::from([1, 2, 3, 5, 6, 7]));
}

#[test]
fn test_malformed_input_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.json");
    fs::write(&input, "[1, 2,").unwrap();
    let batch = BatchConfig::new(dir.path().join("games.json"));

    let store = FakeStore::new(vec![], vec![]);
    let err = fetch_games(&input, &batch, &fast_retry(), &store, &NoSleep).unwrap_err();

    assert!(matches!(err, HarvestError::InvalidInput { .. }));
    assert!(store.requested.borrow().is_empty());
    assert!(!batch.output.exists());
}

struct Unavailable;

impl Translator for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn translate(&self, _text: &str) -> Result<Option<String>> {
        Err(HarvestError::Translate("service down".to_string()))
    }
}

struct Dictionary;

impl Translator for Dictionary {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn translate(&self, text: &str) -> Result<Option<String>> {
        Ok(match text {
            "Portal 2" => Some("传送门 2".to_string()),
            _ => None,
        })
    }
}

#[test]
fn test_translation_falls_back_to_original() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("to_translate.json");
    write_json(
        &input,
        json!([
            {"appId": 620, "nameEn": "Portal 2"},
            {"appId": 99, "nameEn": "Foo Bar"}
        ]),
    );
    let batch = BatchConfig::new(dir.path().join("translated.json"));
    let chain = TranslatorChain::new(vec![Box::new(Unavailable), Box::new(Dictionary)]);

    let summary = translate_names(&input, &batch, chain, &NoSleep).unwrap();

    assert_eq!(summary.batch.succeeded, 2);
    assert_eq!(summary.fallbacks, 1);

    let text = fs::read_to_string(&batch.output).unwrap();
    assert!(text.contains("传送门 2"), "non-ASCII must be written literally");
    let names: Vec<TranslatedName> = serde_json::from_str(&text).unwrap();
    assert_eq!(names[0].name_zh, "传送门 2");
    assert_eq!(names[1].name_en, "Foo Bar");
    assert_eq!(names[1].name_zh, "Foo Bar");
}
