//! In-memory result set and its on-disk JSON snapshot.

use crate::error::{HarvestError, Result};
use crate::input::entry_id;
use crate::model::{AppId, Keyed};
use foldhash::HashMap;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ordered records with at most one record per key.
#[derive(Debug, Clone)]
pub struct ResultSet<R> {
    records: Vec<R>,
    positions: HashMap<AppId, usize>,
}

impl<R> Default for ResultSet<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            positions: Default::default(),
        }
    }
}

impl<R: Keyed> ResultSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: AppId) -> bool {
        self.positions.contains_key(&key)
    }

    pub fn get(&self, key: AppId) -> Option<&R> {
        self.positions.get(&key).map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn keys(&self) -> impl Iterator<Item = AppId> + '_ {
        self.records.iter().map(Keyed::key)
    }

    /// Appends a freshly produced record. Returns `false` and drops the record
    /// when its key is already present.
    pub fn push_new(&mut self, record: R) -> bool {
        let key = record.key();
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.records.len());
        self.records.push(record);
        true
    }

    /// Merges a previously saved record: a repeated key replaces the earlier
    /// record but keeps the earlier position. Returns `true` on replacement.
    pub fn merge(&mut self, record: R) -> bool {
        let key = record.key();
        match self.positions.get(&key) {
            Some(&idx) => {
                self.records[idx] = record;
                true
            }
            None => {
                self.positions.insert(key, self.records.len());
                self.records.push(record);
                false
            }
        }
    }
}

/// A record held in a result set.
///
/// Records read back from an earlier file are kept as the exact JSON they were
/// read as and written out again unchanged. Only records produced by the
/// current run go through the typed model.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored<R> {
    Prior { app_id: AppId, raw: Value },
    Fresh(R),
}

impl<R> Stored<R> {
    pub fn as_fresh(&self) -> Option<&R> {
        match self {
            Stored::Fresh(record) => Some(record),
            Stored::Prior { .. } => None,
        }
    }

    pub fn as_prior(&self) -> Option<&Value> {
        match self {
            Stored::Prior { raw, .. } => Some(raw),
            Stored::Fresh(_) => None,
        }
    }
}

impl<R: Keyed> Keyed for Stored<R> {
    fn key(&self) -> AppId {
        match self {
            Stored::Prior { app_id, .. } => *app_id,
            Stored::Fresh(record) => record.key(),
        }
    }
}

impl<R: Serialize> Serialize for Stored<R> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Stored::Prior { raw, .. } => raw.serialize(serializer),
            Stored::Fresh(record) => record.serialize(serializer),
        }
    }
}

impl<'de, R> Deserialize<'de> for Stored<R> {
    /// Anything read from disk is a prior record; it only has to be an
    /// object carrying an identifier.
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        if !raw.is_object() {
            return Err(de::Error::custom("record is not a JSON object"));
        }
        let app_id = entry_id(&raw).ok_or_else(|| de::Error::custom("record has no appId"))?;
        Ok(Stored::Prior { app_id, raw })
    }
}

/// Reads a JSON array of records. A missing file yields `None`.
pub fn read_records<R: DeserializeOwned>(path: &Path) -> Result<Option<Vec<R>>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(HarvestError::invalid_input(path, err.to_string())),
    };
    let reader = io::BufReader::new(file);
    let records: Vec<R> = serde_json::from_reader(reader)
        .map_err(|err| HarvestError::invalid_input(path, err.to_string()))?;
    Ok(Some(records))
}

/// Builds the starting result set from `paths`, merged in order with
/// last-merged-wins semantics. Missing files are skipped.
pub fn load_result_set<R, P>(paths: &[P]) -> Result<ResultSet<R>>
where
    R: Keyed + DeserializeOwned,
    P: AsRef<Path>,
{
    let mut set = ResultSet::new();
    for path in paths {
        let path = path.as_ref();
        let Some(records) = read_records::<R>(path)? else {
            debug!(path = %path.display(), "No prior results");
            continue;
        };
        let loaded = records.len();
        let replaced = records
            .into_iter()
            .map(|record| set.merge(record))
            .filter(|&replaced| replaced)
            .count();
        info!(
            path = %path.display(),
            loaded,
            replaced,
            total = set.len(),
            "Loaded prior results"
        );
    }
    Ok(set)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "results.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes the full record list as pretty-printed JSON. The data goes to a
/// sibling temp file first and is renamed over `path` once synced.
pub fn write_snapshot<R: Serialize>(path: &Path, records: &[R]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let file = fs::File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}
