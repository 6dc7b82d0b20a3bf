use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;

pub const UPDATE_CARD: &str = "updateCard";
pub const MOVE_CARD_TO_BOARD: &str = "moveCardToBoard";
pub const MOVE_CARD_FROM_BOARD: &str = "moveCardFromBoard";

/// A historical event on a card or board. Immutable; the service returns
/// these newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    #[serde(default)]
    pub data: ActionData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_creator: Option<MemberRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_before: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_after: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `{id, name, ...}` stubs the service embeds in action data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    #[serde(default)]
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    pub fn timestamp(&self) -> Result<DateTime<Utc>, SyncError> {
        DateTime::parse_from_rfc3339(&self.date)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| SyncError::InvalidTimestamp(self.date.clone()))
    }

    pub fn card_id(&self) -> Option<&str> {
        self.data.card.as_ref().and_then(|c| c.id.as_deref())
    }

    pub fn creator_username(&self) -> Option<&str> {
        self.member_creator.as_ref().map(|m| m.username.as_str())
    }

    /// A cross-board move, or a same-board update that changed the list.
    pub fn is_move(&self) -> bool {
        self.kind == MOVE_CARD_FROM_BOARD
            || self.kind == MOVE_CARD_TO_BOARD
            || self.data.list_after.is_some()
    }

    /// Whether this action put its card into `list_id`.
    pub fn entered_list(&self, list_id: &str) -> bool {
        let target = if self.kind == UPDATE_CARD {
            self.data.list_after.as_ref()
        } else if self.kind == MOVE_CARD_TO_BOARD {
            self.data.list.as_ref()
        } else {
            None
        };
        target.and_then(|l| l.id.as_deref()) == Some(list_id)
    }
}
