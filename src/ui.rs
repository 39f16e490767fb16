//! Terminal output: a spinner while topics are processed and coloured
//! reports for runs, the results snapshot and the processing history.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::runner::{RunObserver, RunSummary};
use crate::topics::Topic;
use crate::tracking::clock::format_timestamp;
use crate::tracking::{Clock, HistoryEvent, OutcomeStatus, ResultsSnapshot};

/// Spinner that follows a run topic by topic.
pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl RunProgress {
    pub fn start() -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl RunObserver for RunProgress {
    fn topic_started(&self, position: usize, total: usize, topic: &Topic) {
        self.pb
            .set_message(format!("[{position}/{total}] {}", topic.query));
    }

    fn topic_finished(&self, topic: &Topic, status: OutcomeStatus, tokens: u64) {
        let line = match status {
            OutcomeStatus::Success => format!(
                "  {} {} ({tokens} tokens)",
                self.green.apply_to("✓"),
                topic.query
            ),
            OutcomeStatus::Failed => format!("  {} {}", self.red.apply_to("✗"), topic.query),
        };
        self.pb.println(line);
    }
}

fn status_style(status: OutcomeStatus) -> Style {
    match status {
        OutcomeStatus::Success => Style::new().green(),
        OutcomeStatus::Failed => Style::new().red(),
    }
}

pub fn print_summary(summary: &RunSummary) {
    let dim = Style::new().dim();
    println!();
    println!("{}", dim.apply_to("─── Run Summary ───"));
    println!(
        "  processed {}  succeeded {}  failed {}  skipped {}",
        summary.processed(),
        Style::new().green().apply_to(summary.succeeded),
        Style::new().red().apply_to(summary.failed),
        summary.skipped
    );
    println!("  tokens {}", summary.tokens);
    if summary.enriched > 0 {
        println!("  enriched {}", summary.enriched);
    }
    if summary.history_failures > 0 {
        println!(
            "  {} {} history append(s) failed",
            Style::new().yellow().apply_to("!"),
            summary.history_failures
        );
    }
    if !summary.snapshot_saved {
        println!("  {} results snapshot was not saved", Style::new().red().bold().apply_to("!"));
    }
}

/// One line per topic, then totals.
pub fn print_snapshot<C: Clock>(snapshot: &ResultsSnapshot<C>) {
    if snapshot.is_empty() {
        println!("No results recorded yet.");
        return;
    }

    let width = snapshot.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    for (id, record) in snapshot.iter() {
        println!(
            "{id:<width$}  {:<7}  {}  {}",
            status_style(record.status).apply_to(record.status),
            format_timestamp(&record.last_updated),
            record.model
        );
    }

    let counts = snapshot.counts();
    println!();
    println!(
        "{} topics: {} success, {} failed",
        snapshot.len(),
        counts.success,
        counts.failed
    );
}

/// Events whose label contains `topic`, keeping only the last `limit`.
pub fn filter_events<'a>(
    events: &'a [HistoryEvent],
    topic: Option<&str>,
    limit: Option<usize>,
) -> Vec<&'a HistoryEvent> {
    let matching: Vec<&HistoryEvent> = events
        .iter()
        .filter(|event| topic.is_none_or(|t| event.topic_label().contains(t)))
        .collect();
    let skip = limit.map_or(0, |n| matching.len().saturating_sub(n));
    matching.into_iter().skip(skip).collect()
}

pub fn print_history(events: &[&HistoryEvent]) {
    if events.is_empty() {
        println!("No processing history.");
        return;
    }
    for event in events {
        println!(
            "{}  {:<7}  {:>7}  {}  {}",
            format_timestamp(&event.timestamp()),
            status_style(event.status()).apply_to(event.status()),
            event.token_count(),
            event.model(),
            event.topic_label()
        );
    }
}
