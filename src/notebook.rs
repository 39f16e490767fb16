//! Jupyter notebook (nbformat v4) artifacts.
//!
//! Each topic is written as `<code>.ipynb`: the explanation as a markdown
//! cell, followed by the critique and the code example when present.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, json};

use crate::enrichment::Enrichment;
use crate::topics::Topic;

pub const NOTEBOOK_EXTENSION: &str = "ipynb";

const CRITIQUE_HEADING: &str = "## Critique";
const CODE_HEADING: &str = "## Code example\n\nAn illustrative Python example of the core ideas:";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
enum Cell {
    Markdown {
        metadata: Value,
        source: String,
    },
    Code {
        execution_count: Option<u32>,
        metadata: Value,
        outputs: Vec<Value>,
        source: String,
    },
}

/// In-memory notebook, serialized with `serde_json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notebook {
    cells: Vec<Cell>,
    metadata: Value,
    nbformat: u32,
    nbformat_minor: u32,
}

impl Default for Notebook {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            metadata: json!({ "language_info": { "name": "python" } }),
            nbformat: 4,
            nbformat_minor: 4,
        }
    }
}

impl Notebook {
    /// Explanation first, then the non-blank parts of `enrichment`.
    pub fn for_topic(explanation: &str, enrichment: &Enrichment) -> Self {
        let mut nb = Self::default();
        nb.push_markdown(explanation);
        if let Some(critique) = enrichment.critique.as_deref()
            && !critique.trim().is_empty()
        {
            nb.push_markdown(&format!("{CRITIQUE_HEADING}\n\n{critique}"));
        }
        if let Some(code) = enrichment.code_example.as_deref()
            && !code.trim().is_empty()
        {
            nb.push_markdown(CODE_HEADING);
            nb.push_code(code);
        }
        nb
    }

    pub fn push_markdown(&mut self, source: &str) {
        self.cells.push(Cell::Markdown {
            metadata: json!({}),
            source: source.to_string(),
        });
    }

    pub fn push_code(&mut self, source: &str) {
        self.cells.push(Cell::Code {
            execution_count: None,
            metadata: json!({}),
            outputs: Vec::new(),
            source: source.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)
    }
}

/// Writes `<dir>/<code>.ipynb` for `topic` and returns its path.
pub fn write_artifact(
    dir: &Path,
    topic: &Topic,
    explanation: &str,
    enrichment: &Enrichment,
) -> std::io::Result<PathBuf> {
    let path = dir.join(format!("{}.{NOTEBOOK_EXTENSION}", topic.code));
    Notebook::for_topic(explanation, enrichment).write(&path)?;
    Ok(path)
}
