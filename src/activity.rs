//! Local mirror of the tracked board's history: the action log (newest
//! first) and a snapshot of every card it mentions.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::AppConfig;
use crate::directory::Directory;
use crate::model::action::Action;
use crate::model::board::{Board, Card};
use crate::providers::{ActionQuery, Pacer, Provider, ACTION_PAGE_LIMIT};
use crate::store;

pub const BOARD_ACTION_TYPES: &[&str] = &[
    "addAttachmentToCard",
    "addChecklistToCard",
    "addMemberToCard",
    "commentCard",
    "convertToCardFromCheckItem",
    "copyCard",
    "createCard",
    "deleteCard",
    "emailCard",
    "moveCardFromBoard",
    "moveCardToBoard",
    "removeChecklistFromCard",
    "removeMemberFromCard",
    "updateCard",
    "updateCheckItemStateOnCard",
];

#[derive(Debug, Default)]
pub struct ActivityCache {
    pub actions: Vec<Action>,
    pub cards: BTreeMap<String, Card>,
}

impl ActivityCache {
    pub fn load(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            actions: store::load_or_default(&config.storage.actions_file)?,
            cards: store::load_or_default(&config.storage.cards_file)?,
        })
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        store::save_pretty(&config.storage.actions_file, &self.actions)?;
        store::save_pretty(&config.storage.cards_file, &self.cards)?;
        Ok(())
    }
}

fn history_query() -> ActionQuery {
    ActionQuery {
        filter: BOARD_ACTION_TYPES.join(","),
        limit: ACTION_PAGE_LIMIT,
        ..Default::default()
    }
}

/// Page backwards from the newest action until a short page, stopping at
/// `query.since` when it is set.
async fn page_actions(
    provider: &dyn Provider,
    board: &Board,
    mut query: ActionQuery,
) -> Result<Vec<Action>> {
    let mut all = Vec::new();
    loop {
        let page = provider.board_actions(&board.id, &query).await?;
        let full = page.len() == query.limit;
        tracing::debug!(fetched = page.len(), "action page");
        all.extend(page);
        match all.last() {
            Some(last) if full => query.before = Some(last.id.clone()),
            _ => break,
        }
    }
    Ok(all)
}

pub async fn fetch_all_actions(provider: &dyn Provider, board: &Board) -> Result<Vec<Action>> {
    page_actions(provider, board, history_query()).await
}

/// Everything newer than `newest_id`, newest first.
pub async fn fetch_new_actions(
    provider: &dyn Provider,
    board: &Board,
    newest_id: &str,
) -> Result<Vec<Action>> {
    let query = ActionQuery {
        since: Some(newest_id.to_string()),
        ..history_query()
    };
    page_actions(provider, board, query).await
}

/// Distinct card ids referenced by `actions`, first mention first.
pub fn touched_card_ids(actions: &[Action]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    actions
        .iter()
        .filter_map(|a| a.card_id())
        .filter(|id| seen.insert(*id))
        .map(String::from)
        .collect()
}

/// Re-fetch the given cards. Cards that can't be fetched keep their old
/// snapshot; the next run will try again.
pub async fn refresh_cards(
    provider: &dyn Provider,
    cards: &mut BTreeMap<String, Card>,
    card_ids: &[String],
    pacer: Pacer,
) -> usize {
    let progress = ProgressBar::new(card_ids.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut refreshed = 0;
    for card_id in card_ids {
        progress.set_message(card_id.clone());
        match provider.get_card(card_id).await {
            Ok(Some(card)) => {
                cards.insert(card_id.clone(), card);
                refreshed += 1;
            }
            Ok(None) => tracing::warn!(card = %card_id, "card no longer exists, keeping cached copy"),
            Err(e) => tracing::warn!(card = %card_id, "failed to refresh card: {e:#}"),
        }
        pacer.wait().await;
        progress.inc(1);
    }
    progress.finish_and_clear();
    refreshed
}

pub async fn refresh_activity(
    provider: &dyn Provider,
    directory: &Directory,
    config: &AppConfig,
) -> Result<ActivityCache> {
    let board = directory.board(&config.board.name)?;
    let mut cache = ActivityCache::load(config)?;
    let pacer = Pacer::new(config.trello.pacing());

    let newest = cache.actions.first().map(|a| a.id.clone());
    match newest {
        None => {
            println!("First time setup...");
            cache.actions = fetch_all_actions(provider, board).await?;
            cache.cards = provider
                .board_cards(&board.id)
                .await?
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect();
            println!(
                "Loaded {} actions and {} cards.",
                cache.actions.len(),
                cache.cards.len()
            );
        }
        Some(newest) => {
            println!("Looking for updates...");
            let new_actions = fetch_new_actions(provider, board, &newest).await?;
            println!("{} new actions found.", new_actions.len());

            let touched = touched_card_ids(&new_actions);
            println!("{} cards need to be checked for update", touched.len());
            refresh_cards(provider, &mut cache.cards, &touched, pacer).await;

            cache.actions.splice(0..0, new_actions);
        }
    }

    cache.save(config)?;
    Ok(cache)
}
