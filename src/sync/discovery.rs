use anyhow::Result;

use super::lookup::{SyncLink, SyncLookup};
use super::SyncContext;
use crate::model::board::Card;

pub fn placeholder_description(source: &Card) -> String {
    let url = source.short_url.as_deref().unwrap_or_default();
    format!("SYNC-FROM({})\n[Goto source card]({url})\n---\n", source.id)
}

/// Create a placeholder on the destination board for every source "todo" card
/// that isn't linked yet, and record the link.
///
/// Each link is recorded as soon as its placeholder exists, so on error
/// `lookup` still holds every placeholder created before the failure.
pub async fn discover_and_link(
    ctx: &SyncContext<'_>,
    lookup: &mut SyncLookup,
) -> Result<Vec<SyncLink>> {
    let (provider, directory, config) = (ctx.provider, ctx.directory, ctx.config);
    let mut source_cards = Vec::new();
    for board in &config.source_boards {
        let todo = directory.list(&board.name, &board.list_names.todo)?;
        source_cards.extend(provider.list_cards(&todo.list.id).await?);
    }

    let destination = &config.destination_board;
    let placeholder_list = directory.list(&destination.name, &destination.list_names.todo)?;

    let new_cards = lookup.find_new_cards(&source_cards);
    tracing::info!(
        scanned = source_cards.len(),
        new = new_cards.len(),
        "card discovery"
    );

    let mut created = Vec::new();
    for card in new_cards {
        println!("Creating placeholder for {}, \"{}\"", card.id, card.name);
        let placeholder = provider
            .add_card(
                &placeholder_list.list.id,
                &card.name,
                &placeholder_description(card),
            )
            .await?;
        lookup.insert(&card.id, &placeholder.id);
        created.push(SyncLink {
            source: card.id.clone(),
            placeholder: placeholder.id,
        });
    }
    Ok(created)
}
