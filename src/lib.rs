//! Batch topic explainer with durable progress tracking.
//!
//! The [`tracking`] module is the core: a rewritable [`ResultsSnapshot`]
//! holding the latest outcome per topic and an append-only
//! [`ProcessingHistory`] of every attempt. The rest wires it to an LLM
//! backend and a command-line front end.
//!
//! [`ResultsSnapshot`]: tracking::ResultsSnapshot
//! [`ProcessingHistory`]: tracking::ProcessingHistory

pub mod anthropic;
pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod generator;
pub mod notebook;
pub mod runner;
pub mod topics;
pub mod tracking;
pub mod ui;

pub use error::TrackerError;
