use anyhow::Result;

use super::lookup::{SyncLink, SyncLookup};
use super::movement::find_latest_movement;
use super::status::{classify_opt, SyncStatus};
use super::SyncContext;
use crate::error::SyncError;
use crate::model::board::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    InSync,
    Diverged,
    Unresolvable,
}

pub fn pair_state(source: SyncStatus, placeholder: SyncStatus) -> PairState {
    if source == SyncStatus::NotFound || placeholder == SyncStatus::NotFound {
        PairState::Unresolvable
    } else if source != placeholder {
        PairState::Diverged
    } else {
        PairState::InSync
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncJob {
    /// Move the stale side of a link into the list for `to`.
    Correct {
        card: Card,
        from: SyncStatus,
        to: SyncStatus,
    },
    /// Forget a link whose card no longer resolves.
    Remove { link: SyncLink },
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub in_sync: usize,
    pub skipped: usize,
    pub corrected: Vec<(String, SyncStatus)>,
    pub removed: Vec<SyncLink>,
}

/// Decide what, if anything, a single link needs.
pub async fn plan_pair(ctx: &SyncContext<'_>, link: &SyncLink) -> Result<Option<SyncJob>> {
    let source = ctx.provider.get_card(&link.source).await?;
    ctx.pacer.wait().await;
    let placeholder = ctx.provider.get_card(&link.placeholder).await?;
    ctx.pacer.wait().await;

    let source_status = classify_opt(source.as_ref(), ctx.directory, ctx.config);
    let placeholder_status = classify_opt(placeholder.as_ref(), ctx.directory, ctx.config);

    let remove = Ok(Some(SyncJob::Remove { link: link.clone() }));
    let (Some(source), Some(placeholder)) = (source, placeholder) else {
        return remove;
    };
    match pair_state(source_status, placeholder_status) {
        PairState::Unresolvable => return remove,
        PairState::InSync => return Ok(None),
        PairState::Diverged => {}
    }

    let movement =
        find_latest_movement(ctx.provider, ctx.automation_username, &source, &placeholder)
            .await?;
    let Some(movement) = movement else {
        return Err(SyncError::UnexplainedDivergence {
            source_card: source.id,
            placeholder_card: placeholder.id,
            source_status,
            placeholder_status,
        }
        .into());
    };

    tracing::info!(
        source = %source.id,
        placeholder = %placeholder.id,
        %source_status,
        %placeholder_status,
        action = %movement.id,
        mover = movement.creator_username().unwrap_or("?"),
        "link diverged"
    );

    let job = if movement.card_id() == Some(source.id.as_str()) {
        println!(
            "Add job move placeholder \"{}\" from \"{placeholder_status}\" to \"{source_status}\"",
            placeholder.name
        );
        SyncJob::Correct {
            card: placeholder,
            from: placeholder_status,
            to: source_status,
        }
    } else {
        println!(
            "Add job move source \"{}\" from \"{source_status}\" to \"{placeholder_status}\"",
            source.name
        );
        SyncJob::Correct {
            card: source,
            from: source_status,
            to: placeholder_status,
        }
    };
    Ok(Some(job))
}

/// Relocate `card` into the list its own board uses for `status`.
pub async fn apply_correction(ctx: &SyncContext<'_>, card: &Card, status: SyncStatus) -> Result<()> {
    let board = ctx
        .directory
        .board_by_id(&card.id_board)
        .ok_or_else(|| SyncError::UnknownBoard(card.id_board.clone()))?;
    let board_config = ctx
        .config
        .board(&board.name)
        .ok_or_else(|| SyncError::UnknownBoard(board.name.clone()))?;
    let list_name = board_config
        .list_names
        .list_for(status)
        .ok_or_else(|| SyncError::UnknownList {
            board: board.name.clone(),
            list: status.to_string(),
        })?;
    let target = ctx.directory.list(&board.name, list_name)?;

    ctx.provider.move_card(&card.id, &target.list.id).await?;
    ctx.pacer.wait().await;
    Ok(())
}

/// Reconcile `links`, applying removals to `lookup`. All pairs are read before
/// any card is moved, so one pass sees a single snapshot of the boards.
pub async fn reconcile(
    ctx: &SyncContext<'_>,
    lookup: &mut SyncLookup,
    links: Vec<SyncLink>,
) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut jobs = Vec::new();

    for link in links {
        match plan_pair(ctx, &link).await {
            Ok(Some(job)) => jobs.push(job),
            Ok(None) => report.in_sync += 1,
            Err(e) if e.downcast_ref::<SyncError>().is_some() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    source = %link.source,
                    placeholder = %link.placeholder,
                    "skipping link this pass: {e:#}"
                );
                report.skipped += 1;
            }
        }
    }

    for job in jobs {
        match job {
            SyncJob::Remove { link } => {
                println!(
                    "Removing sync link {} <-> {}",
                    link.source, link.placeholder
                );
                lookup.remove(&link.source);
                report.removed.push(link);
            }
            SyncJob::Correct { card, from, to } => {
                println!("Executing update card \"{}\" from \"{from}\" to \"{to}\"", card.name);
                apply_correction(ctx, &card, to).await?;
                report.corrected.push((card.id, to));
            }
        }
    }

    tracing::info!(
        in_sync = report.in_sync,
        corrected = report.corrected.len(),
        removed = report.removed.len(),
        skipped = report.skipped,
        "reconciliation finished"
    );
    Ok(report)
}
