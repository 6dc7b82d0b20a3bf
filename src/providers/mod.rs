pub mod trello;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::AppConfig;
use crate::model::action::Action;
use crate::model::board::{Board, Card, List, ListFilter, ListPosition};

/// Page size the service caps action queries at.
pub const ACTION_PAGE_LIMIT: usize = 1000;

/// Board history query. `before` and `since` take action ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionQuery {
    pub filter: String,
    pub limit: usize,
    pub before: Option<String>,
    pub since: Option<String>,
}

/// The remote board service. Action listings come back newest-first.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>>;
    async fn list_lists(&self, board_id: &str, filter: ListFilter) -> Result<Vec<List>>;
    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>>;
    async fn board_cards(&self, board_id: &str) -> Result<Vec<Card>>;
    /// `None` when the id no longer resolves (deleted or inaccessible).
    async fn get_card(&self, card_id: &str) -> Result<Option<Card>>;
    async fn card_actions(&self, card_id: &str, filter: &str) -> Result<Vec<Action>>;
    async fn board_actions(&self, board_id: &str, query: &ActionQuery) -> Result<Vec<Action>>;
    async fn card_attachments(&self, card_id: &str) -> Result<Vec<Value>>;
    async fn add_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card>;
    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<()>;
    async fn move_card_to_board(&self, card_id: &str, board_id: &str, list_id: &str)
        -> Result<()>;
    async fn add_list(&self, board_id: &str, name: &str, position: ListPosition) -> Result<List>;
}

/// Fixed delay between card fetches and moves to stay under rate limits.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

pub fn create_provider(config: &AppConfig) -> Box<dyn Provider> {
    Box::new(trello::TrelloProvider::new(
        config.trello.api_key.clone(),
        config.trello.token.clone(),
    ))
}

#[cfg(test)]
pub mod tests;
