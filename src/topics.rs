//! Topic list parsing.
//!
//! `topics.txt` holds one topic per line as `code;detailed_query;image_query`.
//! Blank lines and `#` comments are ignored; malformed lines are skipped
//! with a warning so one bad line does not sink the whole batch.

use std::path::Path;

use anyhow::{Context, Result};

/// A unit of work: `code` keys the results snapshot, `query` labels the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub code: String,
    pub query: String,
    pub image_query: String,
}

/// Reads and parses the topic list at `path`.
pub fn read_topics(path: &Path) -> Result<Vec<Topic>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read topics file {}", path.display()))?;
    Ok(parse_topics(&contents))
}

/// Parses topic lines, skipping comments, blanks and malformed entries.
pub fn parse_topics(contents: &str) -> Vec<Topic> {
    let mut topics = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split(';').map(str::trim).collect();
        if parts.len() != 3 {
            tracing::warn!(
                line = line_num,
                fields = parts.len(),
                "skipping topic line: expected 3 fields"
            );
            continue;
        }

        let (code, query, image_query) = (parts[0], parts[1], parts[2]);
        if code.is_empty() {
            tracing::warn!(line = line_num, "skipping topic line: empty code");
            continue;
        }
        // The code names the artifact file.
        if code.contains(['/', '\\']) || code.starts_with('.') {
            tracing::warn!(line = line_num, code, "skipping topic line: code is not a plain file name");
            continue;
        }
        // The query becomes a history label, which is tab-delimited.
        if query.contains('\t') {
            tracing::warn!(line = line_num, code, "skipping topic line: query contains a tab");
            continue;
        }

        topics.push(Topic {
            code: code.to_string(),
            query: query.to_string(),
            image_query: image_query.to_string(),
        });
    }

    topics
}
