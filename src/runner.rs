use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::enrichment::Enricher;
use crate::generator::Generator;
use crate::notebook::write_artifact;
use crate::topics::Topic;
use crate::tracking::{Clock, OutcomeStatus, ProcessingHistory, ResultsSnapshot, SystemClock};

/// Which topics a run processes, judged against the loaded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every topic in the list.
    #[default]
    All,
    /// Everything except topics whose latest outcome is `success`.
    SkipSucceeded,
    /// Only topics whose latest outcome is `failed`.
    OnlyFailed,
}

impl Selection {
    fn includes<C: Clock>(&self, topic: &Topic, snapshot: &ResultsSnapshot<C>) -> bool {
        let status = snapshot.get(&topic.code).map(|record| record.status);
        match self {
            Selection::All => true,
            Selection::SkipSucceeded => status != Some(OutcomeStatus::Success),
            Selection::OnlyFailed => status == Some(OutcomeStatus::Failed),
        }
    }
}

/// Where a run reads and writes.
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// Artifacts land here as `<code>.ipynb`.
    pub output_dir: PathBuf,
    pub results: PathBuf,
    pub history: PathBuf,
}

/// Aggregate outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub tokens: u64,
    /// Topics whose artifact carries a critique or a code example.
    pub enriched: usize,
    pub history_failures: usize,
    pub snapshot_saved: bool,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Both stores took every write.
    pub fn is_clean(&self) -> bool {
        self.snapshot_saved && self.history_failures == 0
    }
}

/// Hooks for reporting progress while a run is underway.
pub trait RunObserver {
    fn topic_started(&self, _position: usize, _total: usize, _topic: &Topic) {}
    fn topic_finished(&self, _topic: &Topic, _status: OutcomeStatus, _tokens: u64) {}
}

impl RunObserver for () {}

/// Drives topics through generation and records every outcome.
pub struct RunCoordinator<G, C = SystemClock, E = ()> {
    generator: G,
    enricher: E,
    paths: RunPaths,
    selection: Selection,
    clock: C,
}

impl<G: Generator> RunCoordinator<G, SystemClock> {
    pub fn new(generator: G, paths: RunPaths, selection: Selection) -> Self {
        Self::with_clock(generator, paths, selection, SystemClock)
    }
}

impl<G: Generator, C: Clock + Clone> RunCoordinator<G, C> {
    pub fn with_clock(generator: G, paths: RunPaths, selection: Selection, clock: C) -> Self {
        Self {
            generator,
            enricher: (),
            paths,
            selection,
            clock,
        }
    }
}

impl<G: Generator, C: Clock + Clone, E: Enricher> RunCoordinator<G, C, E> {
    /// Adds a second pass run on every successful explanation.
    pub fn with_enricher<F: Enricher>(self, enricher: F) -> RunCoordinator<G, C, F> {
        RunCoordinator {
            generator: self.generator,
            enricher,
            paths: self.paths,
            selection: self.selection,
            clock: self.clock,
        }
    }

    /// Processes the selected topics in order.
    ///
    /// The snapshot is loaded once up front and saved once at the end; each
    /// attempt is appended to the history as soon as it finishes. Storage
    /// write failures are counted in the summary instead of aborting.
    pub async fn run(&self, topics: &[Topic], observer: &impl RunObserver) -> Result<RunSummary> {
        let mut snapshot = ResultsSnapshot::load_with_clock(&self.paths.results, self.clock.clone())
            .context("cannot start run")?;
        let history = ProcessingHistory::with_clock(self.clock.clone());
        std::fs::create_dir_all(&self.paths.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.paths.output_dir.display())
        })?;

        let selected: Vec<&Topic> = topics
            .iter()
            .filter(|topic| self.selection.includes(topic, &snapshot))
            .collect();

        let mut summary = RunSummary {
            skipped: topics.len() - selected.len(),
            ..Default::default()
        };
        let model = self.generator.model();
        tracing::info!(
            selected = selected.len(),
            skipped = summary.skipped,
            model,
            "starting run"
        );

        for (idx, topic) in selected.iter().enumerate() {
            observer.topic_started(idx + 1, selected.len(), topic);

            let (status, tokens, enriched) = self.process(topic).await;
            if enriched {
                summary.enriched += 1;
            }
            match status {
                OutcomeStatus::Success => summary.succeeded += 1,
                OutcomeStatus::Failed => summary.failed += 1,
            }
            summary.tokens += tokens;

            snapshot.update_status(&topic.code, model, status);
            let appended = match history.stamp(&topic.query, model, tokens, status) {
                Ok(event) => history.append(&self.paths.history, &event),
                Err(e) => {
                    tracing::error!(topic = %topic.code, error = %e, "cannot build history event");
                    false
                }
            };
            if !appended {
                summary.history_failures += 1;
            }

            observer.topic_finished(topic, status, tokens);
        }

        summary.snapshot_saved = snapshot.save(&self.paths.results);
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            enriched = summary.enriched,
            history_failures = summary.history_failures,
            snapshot_saved = summary.snapshot_saved,
            "run finished"
        );
        Ok(summary)
    }

    /// Generates, enriches and writes one artifact.
    ///
    /// No artifact on disk means a failed attempt. Enrichment never changes
    /// the outcome; its tokens are logged but not recorded.
    async fn process(&self, topic: &Topic) -> (OutcomeStatus, u64, bool) {
        let Some(generation) = self.generator.generate(topic).await else {
            return (OutcomeStatus::from_generation(false), 0, false);
        };

        let enrichment = self.enricher.enrich(topic, &generation.text).await;
        let produced = match write_artifact(&self.paths.output_dir, topic, &generation.text, &enrichment) {
            Ok(path) => {
                tracing::debug!(
                    topic = %topic.code,
                    path = %path.display(),
                    enrichment_tokens = enrichment.token_count,
                    "artifact written"
                );
                true
            }
            Err(e) => {
                tracing::error!(topic = %topic.code, error = %e, "failed to write artifact");
                false
            }
        };
        (
            OutcomeStatus::from_generation(produced),
            generation.token_count,
            produced && !enrichment.is_empty(),
        )
    }
}
