//! Append-only processing history.
//!
//! One tab-separated line per processing attempt:
//! `timestamp  topic_label  model  token_count  status`. The file is only
//! ever opened in append mode; nothing here reorders, truncates or rewrites it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::clock::{Clock, SystemClock, format_timestamp, parse_timestamp};
use super::status::{self, OutcomeStatus};
use crate::error::TrackerError;

const FIELD_COUNT: usize = 5;

/// One immutable record of a processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    timestamp: DateTime<Utc>,
    topic_label: String,
    model: String,
    token_count: u64,
    status: OutcomeStatus,
}

impl HistoryEvent {
    /// Builds an event, rejecting text fields that would break the line format.
    pub fn new(
        timestamp: DateTime<Utc>,
        topic_label: &str,
        model: &str,
        token_count: u64,
        status: OutcomeStatus,
    ) -> Result<Self, TrackerError> {
        check_field("topic_label", topic_label)?;
        check_field("model", model)?;
        Ok(Self {
            timestamp,
            topic_label: topic_label.to_string(),
            model: model.to_string(),
            token_count,
            status,
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn topic_label(&self) -> &str {
        &self.topic_label
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn token_count(&self) -> u64 {
        self.token_count
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// The event as one history line, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\n",
            format_timestamp(&self.timestamp),
            self.topic_label,
            self.model,
            self.token_count,
            self.status
        )
    }

    fn parse_line(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            ));
        }

        let timestamp =
            parse_timestamp(fields[0]).map_err(|e| format!("bad timestamp {:?}: {e}", fields[0]))?;
        let token_count = fields[3]
            .parse::<u64>()
            .map_err(|e| format!("bad token count {:?}: {e}", fields[3]))?;
        let status = status::validate(fields[4]).map_err(|e| e.to_string())?;

        Ok(Self {
            timestamp,
            topic_label: fields[1].to_string(),
            model: fields[2].to_string(),
            token_count,
            status,
        })
    }
}

fn check_field(field: &'static str, value: &str) -> Result<(), TrackerError> {
    if value.contains(['\t', '\n', '\r']) {
        return Err(TrackerError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Writer and reader for the processing history file.
#[derive(Debug, Clone, Default)]
pub struct ProcessingHistory<C: Clock = SystemClock> {
    clock: C,
}

impl ProcessingHistory<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> ProcessingHistory<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Validates raw input and stamps a new event with the current time.
    pub fn event(
        &self,
        topic_label: &str,
        model: &str,
        token_count: u64,
        status: &str,
    ) -> Result<HistoryEvent, TrackerError> {
        let status = status::validate(status)?;
        self.stamp(topic_label, model, token_count, status)
    }

    /// Stamps a new event for an already-validated status.
    pub fn stamp(
        &self,
        topic_label: &str,
        model: &str,
        token_count: u64,
        status: OutcomeStatus,
    ) -> Result<HistoryEvent, TrackerError> {
        HistoryEvent::new(self.clock.now(), topic_label, model, token_count, status)
    }

    /// Validates and appends in one call. Validation errors come back as `Err`
    /// before the file is touched; write failures come back as `Ok(false)`.
    pub fn record(
        &self,
        location: &Path,
        topic_label: &str,
        model: &str,
        token_count: u64,
        status: &str,
    ) -> Result<bool, TrackerError> {
        let event = self.event(topic_label, model, token_count, status)?;
        Ok(self.append(location, &event))
    }

    /// Appends `event` to the file at `location`, creating it if absent.
    ///
    /// Each call opens, writes the whole line at once, syncs and closes.
    /// A failure is logged and reported as `false`; earlier lines are not touched.
    pub fn append(&self, location: &Path, event: &HistoryEvent) -> bool {
        match append_line(location, &event.to_line()) {
            Ok(()) => {
                tracing::debug!(
                    path = %location.display(),
                    topic = event.topic_label(),
                    status = %event.status(),
                    "appended history event"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    path = %location.display(),
                    topic = event.topic_label(),
                    error = %e,
                    "failed to append history event"
                );
                false
            }
        }
    }

    /// Reads every event in file order. A missing file has no events.
    pub fn read(&self, location: &Path) -> Result<Vec<HistoryEvent>, TrackerError> {
        let file = match File::open(location) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.trim().is_empty() {
                continue;
            }
            let event = HistoryEvent::parse_line(line).map_err(|reason| {
                TrackerError::CorruptHistory {
                    path: location.to_path_buf(),
                    line: idx + 1,
                    reason,
                }
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()?;
    file.sync_data()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::clock::ManualClock;
    use tempfile::tempdir;

    fn history() -> (ProcessingHistory<ManualClock>, ManualClock) {
        let clock = ManualClock::at("2026-05-04T09:00:00.123456Z");
        (ProcessingHistory::with_clock(clock.clone()), clock)
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn record_writes_one_tab_separated_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        let (history, _clock) = history();

        let ok = history
            .record(&path, "Pseudo-Relevance Feedback", "modelX", 1234, "success")
            .unwrap();
        assert!(ok);
        assert_eq!(
            lines(&path),
            vec!["2026-05-04T09:00:00.123456Z\tPseudo-Relevance Feedback\tmodelX\t1234\tsuccess"]
        );
    }

    #[test]
    fn failed_attempt_records_zero_tokens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        let (history, _clock) = history();

        assert!(history.record(&path, "Dense Passage Retrieval", "modelX", 0, "failed").unwrap());

        let events = history.read(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].token_count(), 0);
        assert_eq!(events[0].status(), OutcomeStatus::Failed);
    }

    #[test]
    fn appends_keep_call_order_and_never_rewrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        let (history, clock) = history();
        let entries = [
            ("Pseudo-Relevance Feedback", "gemini-3-preview", 1234, "success"),
            ("Deep Passage Retrieval", "gemini-3-preview", 2345, "success"),
            ("ColBERT", "gemini-3-preview", 0, "failed"),
        ];

        for (topic, model, tokens, status) in entries {
            assert!(history.record(&path, topic, model, tokens, status).unwrap());
            clock.advance_micros(10);
        }
        let first_three = lines(&path);
        assert_eq!(first_three.len(), 3);

        assert!(history.record(&path, "Test Topic", "test-model", 999, "success").unwrap());
        let all = lines(&path);
        assert_eq!(all.len(), 4);
        assert_eq!(&all[..3], &first_three[..]);

        let events = history.read(&path).unwrap();
        let labels: Vec<&str> = events.iter().map(|e| e.topic_label()).collect();
        assert_eq!(
            labels,
            vec!["Pseudo-Relevance Feedback", "Deep Passage Retrieval", "ColBERT", "Test Topic"]
        );
        assert!(events.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn invalid_status_is_rejected_before_any_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        let (history, _clock) = history();

        assert!(history.record(&path, "Test", "model", 100, "success").unwrap());
        let before = std::fs::read_to_string(&path).unwrap();

        let err = history
            .record(&path, "Test", "model", 100, "invalid_status")
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidStatus(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let fresh = dir.path().join("untouched.log");
        assert!(history.record(&fresh, "Test", "model", 1, "error").is_err());
        assert!(!fresh.exists());
    }

    #[test]
    fn tabs_and_newlines_in_text_fields_are_rejected() {
        let (history, _clock) = history();
        assert!(matches!(
            history.event("bad\tlabel", "m", 1, "success"),
            Err(TrackerError::InvalidField { field: "topic_label", .. })
        ));
        assert!(matches!(
            history.event("label", "model\nname", 1, "success"),
            Err(TrackerError::InvalidField { field: "model", .. })
        ));
    }

    #[test]
    fn failed_append_reports_false_and_keeps_earlier_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        let (history, _clock) = history();
        assert!(history.record(&path, "ColBERT", "m", 10, "success").unwrap());
        let before = std::fs::read_to_string(&path).unwrap();

        // The parent of this location is a regular file, so opening it fails.
        let unwritable = path.join("nested.log");
        let event = history.event("ColBERT", "m", 11, "success").unwrap();
        assert!(!history.append(&unwritable, &event));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn append_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/2026/processing.log");
        let (history, _clock) = history();

        assert!(history.record(&path, "ColBERT", "m", 7, "success").unwrap());
        assert_eq!(history.read(&path).unwrap().len(), 1);
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let events = ProcessingHistory::new().read(&dir.path().join("none.log")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn read_reports_malformed_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        std::fs::write(
            &path,
            "2026-01-01T00:00:00.000000Z\tA\tm\t1\tsuccess\n\n2026-01-01T00:00:01.000000Z\tB\tm\tmany\tsuccess\n",
        )
        .unwrap();

        match ProcessingHistory::new().read(&path) {
            Err(TrackerError::CorruptHistory { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("token count"));
            }
            other => panic!("expected CorruptHistory, got {other:?}"),
        }
    }

    #[test]
    fn read_accepts_naive_timestamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processing.log");
        std::fs::write(
            &path,
            "2025-12-01T14:03:22.418211\tColBERT\tgemini-3-preview\t0\tfailed\n",
        )
        .unwrap();

        let events = ProcessingHistory::new().read(&path).unwrap();
        assert_eq!(events[0].model(), "gemini-3-preview");
        assert_eq!(events[0].status(), OutcomeStatus::Failed);
    }
}
