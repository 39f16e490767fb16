use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid status '{0}': expected 'success' or 'failed'")]
    InvalidStatus(String),

    #[error("{field} must not contain tabs or line breaks: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("corrupt results snapshot at {}: {source}", path.display())]
    CorruptSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt processing history at {}, line {line}: {reason}", path.display())]
    CorruptHistory {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_status_display() {
        let err = TrackerError::InvalidStatus("error".into());
        assert_eq!(
            err.to_string(),
            "invalid status 'error': expected 'success' or 'failed'"
        );
    }

    #[test]
    fn corrupt_history_display_names_line() {
        let err = TrackerError::CorruptHistory {
            path: PathBuf::from("out/processing.log"),
            line: 3,
            reason: "expected 5 fields, found 2".into(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt processing history at out/processing.log, line 3: expected 5 fields, found 2"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrackerError>();
    }
}
