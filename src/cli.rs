//! Command-line interface built on clap.
//!
//! Subcommands: `run` processes topics, `status` prints the results
//! snapshot, `history` prints the processing history. Global flags override
//! the matching `topicbook.toml` settings.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::runner::Selection;

/// Generate topic explanations and track their status across runs.
#[derive(Debug, Parser)]
#[command(name = "topicbook", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory for artifacts and tracking files.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Model identifier for generation.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Enable debug logging on stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate explanations for the topics and record the outcomes.
    #[command(group(ArgGroup::new("selection").args(["skip_succeeded", "only_failed"])))]
    Run {
        /// Topics file (`code;detailed_query;image_query` per line).
        #[arg(long)]
        topics: Option<PathBuf>,

        /// Skip topics whose last recorded outcome is success.
        #[arg(long)]
        skip_succeeded: bool,

        /// Process only topics whose last recorded outcome is failed.
        #[arg(long)]
        only_failed: bool,
    },

    /// Show the latest outcome of every topic.
    Status,

    /// Show the processing history.
    History {
        /// Only events whose topic label contains this text.
        #[arg(long)]
        topic: Option<String>,

        /// Only the last N matching events.
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Command {
    /// Topic selection for `run`; `All` for the other subcommands.
    pub fn selection(&self) -> Selection {
        match self {
            Command::Run {
                skip_succeeded: true,
                ..
            } => Selection::SkipSucceeded,
            Command::Run {
                only_failed: true, ..
            } => Selection::OnlyFailed,
            _ => Selection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from(["topicbook", "run", "--topics", "ir_topics.txt"]);
        match &cli.command {
            Command::Run { topics, .. } => {
                assert_eq!(topics.as_deref(), Some(std::path::Path::new("ir_topics.txt")));
            }
            _ => panic!("expected Run command"),
        }
        assert_eq!(cli.command.selection(), Selection::All);
    }

    #[test]
    fn cli_parses_selection_flags() {
        let cli = Cli::parse_from(["topicbook", "run", "--only-failed"]);
        assert_eq!(cli.command.selection(), Selection::OnlyFailed);

        let cli = Cli::parse_from(["topicbook", "run", "--skip-succeeded"]);
        assert_eq!(cli.command.selection(), Selection::SkipSucceeded);
    }

    #[test]
    fn cli_rejects_conflicting_selection() {
        let result = Cli::try_parse_from(["topicbook", "run", "--only-failed", "--skip-succeeded"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "topicbook",
            "--output-dir",
            "build",
            "--model",
            "claude-haiku-4-5-20251001",
            "--verbose",
            "status",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.output_dir, Some(PathBuf::from("build")));
        assert_eq!(cli.model.as_deref(), Some("claude-haiku-4-5-20251001"));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn cli_parses_history_filters() {
        let cli = Cli::parse_from(["topicbook", "history", "--topic", "ColBERT", "--limit", "5"]);
        match cli.command {
            Command::History { topic, limit } => {
                assert_eq!(topic.as_deref(), Some("ColBERT"));
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected History command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
