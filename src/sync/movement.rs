use anyhow::Result;

use crate::error::SyncError;
use crate::model::action::{Action, MOVE_CARD_FROM_BOARD, MOVE_CARD_TO_BOARD, UPDATE_CARD};
use crate::model::board::Card;
use crate::providers::Provider;

fn move_filter() -> String {
    [MOVE_CARD_FROM_BOARD, MOVE_CARD_TO_BOARD, UPDATE_CARD].join(",")
}

/// The latest move among `actions`, by timestamp rather than position.
pub fn latest_move(actions: &[Action]) -> Result<Option<&Action>, SyncError> {
    let mut latest: Option<(&Action, _)> = None;
    for action in actions.iter().filter(|a| a.is_move()) {
        let ts = action.timestamp()?;
        if latest.as_ref().map_or(true, |(_, best)| ts > *best) {
            latest = Some((action, ts));
        }
    }
    Ok(latest.map(|(action, _)| action))
}

/// Pick the most recent move across both sides of a link.
///
/// Returns `None` when neither side moved, or when the latest move was made by
/// the automation account: our own corrections are never a signal.
pub fn pick_latest_movement(
    source_actions: &[Action],
    placeholder_actions: &[Action],
    automation_username: &str,
) -> Result<Option<Action>, SyncError> {
    let source = latest_move(source_actions)?;
    let placeholder = latest_move(placeholder_actions)?;

    let latest = match (source, placeholder) {
        (Some(s), Some(p)) => {
            if p.timestamp()? > s.timestamp()? {
                Some(p)
            } else {
                Some(s)
            }
        }
        (s, p) => s.or(p),
    };

    match latest {
        Some(action) if action.creator_username() == Some(automation_username) => {
            tracing::debug!(action = %action.id, "latest move was ours, ignoring");
            Ok(None)
        }
        other => Ok(other.cloned()),
    }
}

pub async fn find_latest_movement(
    provider: &dyn Provider,
    automation_username: &str,
    source: &Card,
    placeholder: &Card,
) -> Result<Option<Action>> {
    let filter = move_filter();
    let source_actions = provider.card_actions(&source.id, &filter).await?;
    let placeholder_actions = provider.card_actions(&placeholder.id, &filter).await?;
    Ok(pick_latest_movement(
        &source_actions,
        &placeholder_actions,
        automation_username,
    )?)
}
