//! Rewritable "current status of every topic" view.
//!
//! The snapshot is loaded once per run, updated in memory as topics are
//! processed, and written back with a full atomic overwrite. Readers of the
//! file see either the previous complete content or the new one.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::clock::{Clock, SystemClock};
use super::status::{self, OutcomeStatus};
use crate::error::TrackerError;

/// Latest outcome recorded for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultRecord {
    pub model: String,
    pub status: OutcomeStatus,
    #[serde(with = "super::clock::micros")]
    pub last_updated: DateTime<Utc>,
}

/// Success/failure totals over a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub success: usize,
    pub failed: usize,
}

/// Topic id → latest [`ResultRecord`], owned by the run that loaded it.
#[derive(Debug)]
pub struct ResultsSnapshot<C: Clock = SystemClock> {
    records: BTreeMap<String, ResultRecord>,
    clock: C,
}

impl ResultsSnapshot<SystemClock> {
    /// An empty snapshot stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Loads the snapshot stored at `location`.
    ///
    /// A missing file, or one that is empty or whitespace only, yields an
    /// empty snapshot. Content that does not parse is reported as
    /// [`TrackerError::CorruptSnapshot`] and never discarded.
    pub fn load(location: &Path) -> Result<Self, TrackerError> {
        Self::load_with_clock(location, SystemClock)
    }
}

impl Default for ResultsSnapshot<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ResultsSnapshot<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: BTreeMap::new(),
            clock,
        }
    }

    pub fn load_with_clock(location: &Path, clock: C) -> Result<Self, TrackerError> {
        let contents = match std::fs::read(location) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %location.display(), "no results snapshot yet, starting empty");
                return Ok(Self::with_clock(clock));
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim_ascii().is_empty() {
            tracing::debug!(path = %location.display(), "results snapshot is empty");
            return Ok(Self::with_clock(clock));
        }

        let records: BTreeMap<String, ResultRecord> =
            serde_json::from_slice(&contents).map_err(|source| TrackerError::CorruptSnapshot {
                path: location.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %location.display(), topics = records.len(), "loaded results snapshot");
        Ok(Self { records, clock })
    }

    /// Validates `status` and replaces the record for `topic_id`.
    ///
    /// An invalid status leaves the snapshot untouched.
    pub fn update(&mut self, topic_id: &str, model: &str, status: &str) -> Result<(), TrackerError> {
        let status = status::validate(status)?;
        self.update_status(topic_id, model, status);
        Ok(())
    }

    /// Replaces the record for `topic_id`, stamping it with the clock.
    pub fn update_status(&mut self, topic_id: &str, model: &str, status: OutcomeStatus) {
        let mut last_updated = self.clock.now();
        // Never let a topic's timestamp go backwards within one process.
        if let Some(previous) = self.records.get(topic_id)
            && previous.last_updated > last_updated
        {
            last_updated = previous.last_updated;
        }

        self.records.insert(
            topic_id.to_string(),
            ResultRecord {
                model: model.to_string(),
                status,
                last_updated,
            },
        );
    }

    /// Overwrites `location` with the full snapshot.
    ///
    /// Returns `false` if the write did not complete; the previous file and
    /// the in-memory records are left as they were, so the caller may retry.
    pub fn save(&self, location: &Path) -> bool {
        match self.write_atomically(location) {
            Ok(()) => {
                tracing::debug!(path = %location.display(), topics = self.records.len(), "saved results snapshot");
                true
            }
            Err(e) => {
                tracing::error!(path = %location.display(), error = %e, "failed to save results snapshot");
                false
            }
        }
    }

    fn write_atomically(&self, location: &Path) -> std::io::Result<()> {
        let dir = match location.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut json = serde_json::to_string_pretty(&self.records)?;
        json.push('\n');

        // Temp file in the same directory so the final rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(location).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn get(&self, topic_id: &str) -> Option<&ResultRecord> {
        self.records.get(topic_id)
    }

    pub fn records(&self) -> &BTreeMap<String, ResultRecord> {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResultRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Topic ids whose latest outcome is `status`, in key order.
    pub fn topics_with_status(&self, status: OutcomeStatus) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(_, record)| record.status == status)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        self.records
            .values()
            .fold(StatusCounts::default(), |mut acc, record| {
                match record.status {
                    OutcomeStatus::Success => acc.success += 1,
                    OutcomeStatus::Failed => acc.failed += 1,
                }
                acc
            })
    }
}
