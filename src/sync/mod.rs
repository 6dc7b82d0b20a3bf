//! Card mirroring between source boards and a destination board.
//!
//! Each run first links new source cards to fresh placeholders, then
//! reconciles every existing link. Links created during discovery are
//! reconciled on the following run, since a new placeholder always starts in
//! the same status as its source.

pub mod discovery;
pub mod lookup;
pub mod movement;
pub mod reconcile;
pub mod status;

use anyhow::Result;

use crate::config::{AppConfig, CardSyncConfig};
use crate::directory::Directory;
use crate::providers::{Pacer, Provider};
use crate::store;
use lookup::SyncLookup;
use reconcile::ReconcileReport;

/// What the sync stages need, passed explicitly.
pub struct SyncContext<'a> {
    pub provider: &'a dyn Provider,
    pub directory: &'a Directory,
    pub config: &'a CardSyncConfig,
    pub automation_username: &'a str,
    pub pacer: Pacer,
}

pub async fn perform_sync(
    provider: &dyn Provider,
    directory: &Directory,
    config: &AppConfig,
) -> Result<Option<ReconcileReport>> {
    let Some(sync_config) = &config.card_sync else {
        tracing::info!("no [card_sync] section, skipping card sync");
        return Ok(None);
    };
    let ctx = SyncContext {
        provider,
        directory,
        config: sync_config,
        automation_username: &config.trello.automation_username,
        pacer: Pacer::new(config.trello.pacing()),
    };
    let path = &sync_config.persistence_file;

    let mut lookup: SyncLookup = store::load_or_default(path)?;
    let existing = lookup.links();
    let discovered = discovery::discover_and_link(&ctx, &mut lookup).await;
    // Placeholders created before a failure are already on the board.
    store::save_pretty(path, &lookup)?;
    let created = discovered?;
    if !created.is_empty() {
        println!("Linked {} new card(s)", created.len());
    }

    // Links are persisted again only once the whole pass succeeds.
    let report = reconcile::reconcile(&ctx, &mut lookup, existing).await?;
    debug_assert!(lookup.is_consistent());
    store::save_pretty(path, &lookup)?;
    tracing::info!(links = lookup.len(), "sync lookup saved");
    Ok(Some(report))
}
