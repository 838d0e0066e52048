//! Loading the work list.

use crate::error::{HarvestError, Result};
use crate::model::{AppId, Keyed};
use crate::store::ResultSet;
use foldhash::HashSet;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;

/// Field names accepted as the identifier of an object entry.
pub const ID_FIELDS: &[&str] = &["appid", "appId", "app_id", "id"];

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)
        .map_err(|err| HarvestError::invalid_input(path, err.to_string()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .map_err(|err| HarvestError::invalid_input(path, err.to_string()))
}

fn id_from_value(value: &Value) -> Option<AppId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts an identifier from a bare number/string or from an object
/// carrying one of [`ID_FIELDS`].
pub fn entry_id(entry: &Value) -> Option<AppId> {
    match entry {
        Value::Object(map) => ID_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(id_from_value)),
        other => id_from_value(other),
    }
}

/// Reads a JSON array of identifiers, or of objects that carry one.
/// Any entry without a usable identifier makes the whole file invalid.
pub fn load_app_ids(path: &Path) -> Result<Vec<AppId>> {
    let root: Value = read_json(path)?;
    let Value::Array(entries) = root else {
        return Err(HarvestError::invalid_input(path, "expected a JSON array"));
    };

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            entry_id(entry).ok_or_else(|| {
                HarvestError::invalid_input(path, format!("entry {} has no identifier", idx))
            })
        })
        .collect()
}

/// Reads a JSON array of typed work items (e.g. names awaiting translation).
pub fn load_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    read_json(path)
}

/// Drops items already present in `done` and repeated items, keeping the
/// first occurrence order.
pub fn pending<T, R, F>(items: Vec<T>, done: &ResultSet<R>, key: F) -> Vec<T>
where
    R: Keyed,
    F: Fn(&T) -> AppId,
{
    let mut seen: HashSet<AppId> = Default::default();
    items
        .into_iter()
        .filter(|item| {
            let id = key(item);
            !done.contains(id) && seen.insert(id)
        })
        .collect()
}

/// Reads a game list as raw JSON values.
pub fn load_game_values(path: &Path) -> Result<Vec<Value>> {
    match read_json::<Value>(path)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(HarvestError::invalid_input(path, "expected a JSON array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranslatedName;
    use serde_json::json;

    #[test]
    fn test_entry_id_shapes() {
        assert_eq!(entry_id(&json!(730)), Some(730));
        assert_eq!(entry_id(&json!("570")), Some(570));
        assert_eq!(entry_id(&json!({"appid": 10, "name": "x"})), Some(10));
        assert_eq!(entry_id(&json!({"appId": 20})), Some(20));
        assert_eq!(entry_id(&json!({"app_id": "30"})), Some(30));
        assert_eq!(entry_id(&json!({"name": "no id"})), None);
        assert_eq!(entry_id(&json!(-5)), None);
        assert_eq!(entry_id(&json!(null)), None);
    }

    #[test]
    fn test_load_app_ids_mixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");
        fs::write(&path, json!([10, {"appid": 20, "rank": 1}, "30"]).to_string()).unwrap();
        assert_eq!(load_app_ids(&path).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_load_app_ids_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();

        let not_array = dir.path().join("obj.json");
        fs::write(&not_array, "{\"appid\": 1}").unwrap();
        assert!(load_app_ids(&not_array).is_err());

        let missing_id = dir.path().join("missing.json");
        fs::write(&missing_id, json!([1, {"name": "x"}]).to_string()).unwrap();
        let err = load_app_ids(&missing_id).unwrap_err();
        assert!(err.to_string().contains("entry 1"));

        assert!(load_app_ids(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_pending_skips_done_and_repeats() {
        let mut done = ResultSet::new();
        done.push_new(TranslatedName {
            app_id: 20,
            name_en: "B".to_string(),
            name_zh: "乙".to_string(),
        });

        let ids = vec![10, 20, 30, 10, 40, 30];
        assert_eq!(pending(ids, &done, |id| *id), vec![10, 30, 40]);
    }
}
