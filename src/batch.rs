//! The fetch-transform-checkpoint loop shared by every pipeline.
//!
//! Items are processed strictly one after another. After every
//! `checkpoint_every` items the whole result set is written to the output
//! file, and once more when the loop ends, so an interrupted run loses at most
//! one interval of work.

use crate::config::BatchConfig;
use crate::error::Result;
use crate::model::{AppId, Keyed};
use crate::pacing::{RateLimiter, Sleeper};
use crate::store::{ResultSet, Stored, write_snapshot};
use serde::Serialize;
use tracing::{info, warn};

/// What processing one work item produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<R> {
    Record(R),
    /// The remote side rejected the item permanently.
    Invalid,
    /// Retries ran out.
    Exhausted,
}

/// Turns a work item into a record.
pub trait ItemProcessor<T> {
    type Record: Keyed + Serialize;

    fn key(&self, item: &T) -> AppId;

    fn process(&mut self, item: &T) -> ItemOutcome<Self::Record>;
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Items left after skipping finished ones.
    pub pending: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub invalid: usize,
    pub exhausted: usize,
    /// Records whose key was already present when they arrived.
    pub duplicates: usize,
    pub checkpoints: usize,
    /// Size of the result set after the final write.
    pub total_records: usize,
}

impl BatchSummary {
    pub fn skipped(&self) -> usize {
        self.invalid + self.exhausted
    }
}

/// Processes `items` in order, appending successes to `results`. Records
/// already in `results` are never touched.
///
/// `items` must already be filtered against `results` (see
/// [`crate::input::pending`]). Only checkpoint writes can fail the run.
pub fn run_batch<T, P, S>(
    items: &[T],
    results: &mut ResultSet<Stored<P::Record>>,
    processor: &mut P,
    config: &BatchConfig,
    sleeper: S,
) -> Result<BatchSummary>
where
    P: ItemProcessor<T>,
    S: Sleeper,
{
    let total = items.len();
    let limiter = RateLimiter::new(config.item_delay, sleeper);
    let mut summary = BatchSummary {
        pending: total,
        ..BatchSummary::default()
    };

    info!(
        pending = total,
        existing = results.len(),
        output = %config.output.display(),
        "Starting batch"
    );

    for (idx, item) in items.iter().enumerate() {
        let key = processor.key(item);
        match processor.process(item) {
            ItemOutcome::Record(record) => {
                if results.push_new(Stored::Fresh(record)) {
                    summary.succeeded += 1;
                } else {
                    summary.duplicates += 1;
                    warn!(app_id = key, "Duplicate record dropped");
                }
            }
            ItemOutcome::Invalid => {
                summary.invalid += 1;
                info!(app_id = key, position = idx + 1, total, "Skipped: invalid");
            }
            ItemOutcome::Exhausted => {
                summary.exhausted += 1;
                warn!(app_id = key, position = idx + 1, total, "Skipped: retries exhausted");
            }
        }
        summary.processed += 1;

        if summary.processed % config.checkpoint_every == 0 {
            write_snapshot(&config.output, results.records())?;
            summary.checkpoints += 1;
            info!(
                succeeded = summary.succeeded,
                skipped = summary.skipped(),
                saved = results.len(),
                "Checkpoint written"
            );
        }

        limiter.after_item(idx, total);
    }

    write_snapshot(&config.output, results.records())?;
    summary.total_records = results.len();

    info!(
        succeeded = summary.succeeded,
        invalid = summary.invalid,
        exhausted = summary.exhausted,
        total = summary.total_records,
        output = %config.output.display(),
        "Batch complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranslatedName;
    use crate::pacing::testing::RecordingSleeper;
    use std::time::Duration;

    struct Echo;

    impl ItemProcessor<AppId> for Echo {
        type Record = TranslatedName;

        fn key(&self, item: &AppId) -> AppId {
            *item
        }

        fn process(&mut self, item: &AppId) -> ItemOutcome<TranslatedName> {
            match item % 3 {
                0 => ItemOutcome::Invalid,
                1 => ItemOutcome::Record(TranslatedName {
                    app_id: *item,
                    name_en: item.to_string(),
                    name_zh: item.to_string(),
                }),
                _ => ItemOutcome::Exhausted,
            }
        }
    }

    #[test]
    fn test_counts_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfig::new(dir.path().join("out.json"));
        config.checkpoint_every = 2;
        config.item_delay = Duration::from_millis(10);

        let sleeper = RecordingSleeper::default();
        let mut results = ResultSet::new();
        let items: Vec<AppId> = (1..=5).collect();

        let summary = run_batch(&items, &mut results, &mut Echo, &config, &sleeper).unwrap();

        assert_eq!(summary.processed, 5);
        assert_eq!(summary.succeeded, 2); // 1, 4
        assert_eq!(summary.invalid, 1); // 3
        assert_eq!(summary.exhausted, 2); // 2, 5
        assert_eq!(summary.checkpoints, 2);
        assert_eq!(summary.total_records, 2);
        assert_eq!(sleeper.slept.borrow().len(), 4);
        assert!(config.output.exists());
    }

    #[test]
    fn test_empty_batch_still_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path().join("out.json"));
        let mut results = ResultSet::new();
        let items: Vec<AppId> = Vec::new();

        let summary = run_batch(
            &items,
            &mut results,
            &mut Echo,
            &config,
            &RecordingSleeper::default(),
        )
        .unwrap();

        assert_eq!(summary, BatchSummary::default());
        let text = std::fs::read_to_string(&config.output).unwrap();
        assert_eq!(text.trim(), "[]");
    }
}
