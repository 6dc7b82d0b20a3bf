use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CardSyncConfig;
use crate::directory::Directory;
use crate::model::board::Card;

/// Where a card sits in the mirrored workflow. Derived on every run from the
/// card's current list, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Todo,
    InProgress,
    Done,
    NotFound,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Todo => "todo",
            SyncStatus::InProgress => "in_progress",
            SyncStatus::Done => "done",
            SyncStatus::NotFound => "not_found",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(card: &Card, directory: &Directory, config: &CardSyncConfig) -> SyncStatus {
    let Some(entry) = directory.list_by_id(&card.id_list) else {
        return SyncStatus::NotFound;
    };
    config
        .board(&entry.board_name)
        .and_then(|board| board.list_names.status_of(&entry.list_name))
        .unwrap_or(SyncStatus::NotFound)
}

/// `None` (card no longer resolves) classifies as `NotFound`.
pub fn classify_opt(card: Option<&Card>, directory: &Directory, config: &CardSyncConfig) -> SyncStatus {
    card.map(|c| classify(c, directory, config))
        .unwrap_or(SyncStatus::NotFound)
}
