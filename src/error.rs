use thiserror::Error;

use crate::sync::status::SyncStatus;

/// Failures callers need to tell apart. Everything else travels as a plain
/// `anyhow::Error`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Board not found: {0}")]
    UnknownBoard(String),

    #[error("List \"{list}\" not found on board \"{board}\"")]
    UnknownList { board: String, list: String },

    #[error(
        "Cards {source_card} ({source_status}) and {placeholder_card} ({placeholder_status}) diverged without an attributable move"
    )]
    UnexplainedDivergence {
        source_card: String,
        placeholder_card: String,
        source_status: SyncStatus,
        placeholder_status: SyncStatus,
    },

    #[error("Invalid action timestamp: {0}")]
    InvalidTimestamp(String),
}
