use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{ActionQuery, Pacer, Provider};
use crate::model::action::Action;
use crate::model::board::{Board, Card, List, ListFilter, ListPosition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub card_id: String,
    pub board_id: Option<String>,
    pub list_id: String,
}

#[derive(Default)]
pub struct MockState {
    pub boards: Vec<Board>,
    pub lists: Vec<List>,
    pub closed_lists: Vec<String>,
    pub cards: Vec<Card>,
    pub card_actions: HashMap<String, Vec<Action>>,
    /// Newest first, like the service.
    pub board_actions: Vec<Action>,
    pub attachments: HashMap<String, Vec<Value>>,
    pub unavailable_cards: Vec<String>,
    pub created_cards: Vec<Card>,
    pub created_lists: Vec<List>,
    pub moves: Vec<Move>,
    pub action_queries: Vec<ActionQuery>,
    pub card_fetches: Vec<String>,
    /// Successful `add_card` calls left before the service starts refusing.
    pub add_card_budget: Option<usize>,
    next_id: usize,
}

/// An in-memory board service that records every write.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub state: Arc<Mutex<MockState>>,
}

pub fn make_card(id: &str, name: &str, list_id: &str, board_id: &str) -> Card {
    Card {
        id: id.to_string(),
        name: name.to_string(),
        desc: String::new(),
        id_list: list_id.to_string(),
        id_board: board_id.to_string(),
        short_url: Some(format!("https://trello.com/c/{id}")),
        extra: Map::new(),
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().boards.push(Board {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn list(self, id: &str, board_id: &str, name: &str) -> Self {
        self.state.lock().unwrap().lists.push(List {
            id: id.into(),
            name: name.into(),
            id_board: board_id.into(),
        });
        self
    }

    pub fn closed_list(self, id: &str, board_id: &str, name: &str) -> Self {
        let this = self.list(id, board_id, name);
        this.state.lock().unwrap().closed_lists.push(id.into());
        this
    }

    /// Adds a card to an existing list; the board comes from the list.
    pub fn card(self, id: &str, name: &str, list_id: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let board_id = state
                .lists
                .iter()
                .find(|l| l.id == list_id)
                .map(|l| l.id_board.clone())
                .unwrap_or_default();
            state.cards.push(make_card(id, name, list_id, &board_id));
        }
        self
    }

    pub fn card_action(self, action: Action) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let card_id = action.card_id().unwrap_or_default().to_string();
            state.card_actions.entry(card_id).or_default().push(action);
        }
        self
    }

    pub fn board_action(self, action: Action) -> Self {
        self.state.lock().unwrap().board_actions.push(action);
        self
    }

    pub fn set_add_card_budget(&self, budget: Option<usize>) {
        self.state.lock().unwrap().add_card_budget = budget;
    }

    pub fn unavailable(self, card_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unavailable_cards
            .push(card_id.into());
        self
    }

    pub fn remove_card(&self, card_id: &str) {
        self.state.lock().unwrap().cards.retain(|c| c.id != card_id);
    }

    pub fn set_card_list(&self, card_id: &str, list_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(card) = state.cards.iter_mut().find(|c| c.id == card_id) {
            card.id_list = list_id.to_string();
        }
    }

    pub fn card_list(&self, card_id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .cards
            .iter()
            .find(|c| c.id == card_id)
            .map(|c| c.id_list.clone())
    }

    pub fn moves(&self) -> Vec<Move> {
        self.state.lock().unwrap().moves.clone()
    }

    pub fn created_cards(&self) -> Vec<Card> {
        self.state.lock().unwrap().created_cards.clone()
    }

    pub fn created_lists(&self) -> Vec<List> {
        self.state.lock().unwrap().created_lists.clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn list_boards(&self) -> Result<Vec<Board>> {
        Ok(self.state.lock().unwrap().boards.clone())
    }

    async fn list_lists(&self, board_id: &str, filter: ListFilter) -> Result<Vec<List>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .lists
            .iter()
            .filter(|l| l.id_board == board_id)
            .filter(|l| filter == ListFilter::All || !state.closed_lists.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cards
            .iter()
            .filter(|c| c.id_list == list_id)
            .cloned()
            .collect())
    }

    async fn board_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cards
            .iter()
            .filter(|c| c.id_board == board_id)
            .cloned()
            .collect())
    }

    async fn get_card(&self, card_id: &str) -> Result<Option<Card>> {
        let mut state = self.state.lock().unwrap();
        state.card_fetches.push(card_id.to_string());
        if state.unavailable_cards.iter().any(|id| id == card_id) {
            bail!("card {card_id} unavailable");
        }
        Ok(state.cards.iter().find(|c| c.id == card_id).cloned())
    }

    async fn card_actions(&self, card_id: &str, _filter: &str) -> Result<Vec<Action>> {
        let state = self.state.lock().unwrap();
        Ok(state.card_actions.get(card_id).cloned().unwrap_or_default())
    }

    async fn board_actions(&self, _board_id: &str, query: &ActionQuery) -> Result<Vec<Action>> {
        let mut state = self.state.lock().unwrap();
        state.action_queries.push(query.clone());
        let all = &state.board_actions;
        let position = |id: &str| all.iter().position(|a| a.id == id);

        let mut start = 0;
        let mut end = all.len();
        if let Some(before) = &query.before {
            start = position(before).map(|p| p + 1).unwrap_or(all.len());
        }
        if let Some(since) = &query.since {
            end = position(since).unwrap_or(all.len());
        }
        Ok(all[start..end.max(start)]
            .iter()
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn card_attachments(&self, card_id: &str) -> Result<Vec<Value>> {
        let state = self.state.lock().unwrap();
        Ok(state.attachments.get(card_id).cloned().unwrap_or_default())
    }

    async fn add_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card> {
        let mut state = self.state.lock().unwrap();
        match state.add_card_budget {
            Some(0) => bail!("429 Too Many Requests"),
            Some(n) => state.add_card_budget = Some(n - 1),
            None => {}
        }
        let board_id = state
            .lists
            .iter()
            .find(|l| l.id == list_id)
            .map(|l| l.id_board.clone())
            .context("add_card: unknown list")?;
        state.next_id += 1;
        let mut card = make_card(&format!("new-{}", state.next_id), name, list_id, &board_id);
        card.desc = desc.to_string();
        state.cards.push(card.clone());
        state.created_cards.push(card.clone());
        Ok(card)
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let card = state
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .context("move_card: unknown card")?;
        card.id_list = list_id.to_string();
        state.moves.push(Move {
            card_id: card_id.into(),
            board_id: None,
            list_id: list_id.into(),
        });
        Ok(())
    }

    async fn move_card_to_board(
        &self,
        card_id: &str,
        board_id: &str,
        list_id: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let card = state
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .context("move_card_to_board: unknown card")?;
        card.id_list = list_id.to_string();
        card.id_board = board_id.to_string();
        state.moves.push(Move {
            card_id: card_id.into(),
            board_id: Some(board_id.into()),
            list_id: list_id.into(),
        });
        Ok(())
    }

    async fn add_list(&self, board_id: &str, name: &str, _position: ListPosition) -> Result<List> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let list = List {
            id: format!("list-{}", state.next_id),
            name: name.to_string(),
            id_board: board_id.to_string(),
        };
        state.lists.insert(0, list.clone());
        state.created_lists.push(list.clone());
        Ok(list)
    }
}

#[tokio::test]
async fn mock_moves_update_card_membership() {
    let provider = MockProvider::new()
        .board("b1", "Board")
        .list("l1", "b1", "Todo")
        .list("l2", "b1", "Done")
        .card("c1", "Card", "l1");

    provider.move_card("c1", "l2").await.unwrap();

    assert_eq!(provider.card_list("c1").as_deref(), Some("l2"));
    assert_eq!(provider.list_cards("l2").await.unwrap().len(), 1);
    assert!(provider.move_card("missing", "l2").await.is_err());
}

#[tokio::test]
async fn mock_hides_closed_lists_from_open_filter() {
    let provider = MockProvider::new()
        .board("b1", "Board")
        .list("l1", "b1", "Todo")
        .closed_list("l2", "b1", "Old");

    assert_eq!(provider.list_lists("b1", ListFilter::Open).await.unwrap().len(), 1);
    assert_eq!(provider.list_lists("b1", ListFilter::All).await.unwrap().len(), 2);
}

#[tokio::test]
async fn mock_deleted_card_resolves_to_none() {
    let provider = MockProvider::new()
        .board("b1", "Board")
        .list("l1", "b1", "Todo")
        .card("c1", "Card", "l1");
    provider.remove_card("c1");
    assert!(provider.get_card("c1").await.unwrap().is_none());
}

#[tokio::test]
async fn zero_pacer_returns_immediately() {
    let started = std::time::Instant::now();
    Pacer::new(std::time::Duration::ZERO).wait().await;
    assert!(started.elapsed() < std::time::Duration::from_millis(50));
}
