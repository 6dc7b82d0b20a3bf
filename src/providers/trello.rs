use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ActionQuery, Provider, ACTION_PAGE_LIMIT};
use crate::model::action::Action;
use crate::model::board::{Board, Card, List, ListFilter, ListPosition};

const BASE: &str = "https://api.trello.com/1";

pub struct TrelloProvider {
    api_key: String,
    token: String,
    client: reqwest::Client,
}

impl TrelloProvider {
    pub fn new(api_key: String, token: String) -> Self {
        Self {
            api_key,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn auth_params(&self) -> [(&str, &str); 2] {
        [("key", &self.api_key), ("token", &self.token)]
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let value = self
            .client
            .get(format!("{BASE}/{path}"))
            .query(&self.auth_params())
            .query(query)
            .send()
            .await
            .with_context(|| format!("Trello GET {path} failed"))?
            .error_for_status()
            .with_context(|| format!("Trello GET {path} rejected"))?
            .json()
            .await
            .with_context(|| format!("Trello GET {path} returned unexpected data"))?;
        Ok(value)
    }
}

#[async_trait]
impl Provider for TrelloProvider {
    async fn list_boards(&self) -> Result<Vec<Board>> {
        self.get("members/me/boards", &[("fields", "id,name"), ("filter", "all")])
            .await
    }

    async fn list_lists(&self, board_id: &str, filter: ListFilter) -> Result<Vec<List>> {
        self.get(
            &format!("boards/{board_id}/lists"),
            &[("fields", "id,name,idBoard"), ("filter", filter.as_str())],
        )
        .await
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>> {
        self.get(&format!("lists/{list_id}/cards"), &[]).await
    }

    async fn board_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        self.get(&format!("boards/{board_id}/cards"), &[]).await
    }

    async fn get_card(&self, card_id: &str) -> Result<Option<Card>> {
        let resp = self
            .client
            .get(format!("{BASE}/cards/{card_id}"))
            .query(&self.auth_params())
            .send()
            .await
            .context("Failed to fetch Trello card")?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let card = resp
            .error_for_status()
            .with_context(|| format!("Trello card {card_id} unavailable"))?
            .json()
            .await?;
        Ok(Some(card))
    }

    async fn card_actions(&self, card_id: &str, filter: &str) -> Result<Vec<Action>> {
        let limit = ACTION_PAGE_LIMIT.to_string();
        self.get(
            &format!("cards/{card_id}/actions"),
            &[("filter", filter), ("limit", limit.as_str())],
        )
        .await
    }

    async fn board_actions(&self, board_id: &str, query: &ActionQuery) -> Result<Vec<Action>> {
        let limit = query.limit.to_string();
        let mut params = vec![("filter", query.filter.as_str()), ("limit", limit.as_str())];
        if let Some(before) = &query.before {
            params.push(("before", before.as_str()));
        }
        if let Some(since) = &query.since {
            params.push(("since", since.as_str()));
        }
        self.get(&format!("boards/{board_id}/actions"), &params).await
    }

    async fn card_attachments(&self, card_id: &str) -> Result<Vec<Value>> {
        self.get(&format!("cards/{card_id}/attachments"), &[]).await
    }

    async fn add_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card> {
        let card = self
            .client
            .post(format!("{BASE}/cards"))
            .query(&self.auth_params())
            .query(&[("idList", list_id), ("name", name), ("desc", desc)])
            .send()
            .await
            .context("Failed to create Trello card")?
            .error_for_status()
            .context("Trello rejected card creation")?
            .json()
            .await?;
        Ok(card)
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<()> {
        self.client
            .put(format!("{BASE}/cards/{card_id}"))
            .query(&self.auth_params())
            .query(&[("idList", list_id)])
            .send()
            .await
            .context("Failed to move Trello card")?
            .error_for_status()
            .with_context(|| format!("Trello rejected move of card {card_id}"))?;
        Ok(())
    }

    async fn move_card_to_board(
        &self,
        card_id: &str,
        board_id: &str,
        list_id: &str,
    ) -> Result<()> {
        self.client
            .put(format!("{BASE}/cards/{card_id}"))
            .query(&self.auth_params())
            .query(&[("idBoard", board_id), ("idList", list_id)])
            .send()
            .await
            .context("Failed to move Trello card to board")?
            .error_for_status()
            .with_context(|| format!("Trello rejected move of card {card_id} to board {board_id}"))?;
        Ok(())
    }

    async fn add_list(&self, board_id: &str, name: &str, position: ListPosition) -> Result<List> {
        let list = self
            .client
            .post(format!("{BASE}/boards/{board_id}/lists"))
            .query(&self.auth_params())
            .query(&[("name", name), ("pos", position.as_str())])
            .send()
            .await
            .context("Failed to create Trello list")?
            .error_for_status()
            .context("Trello rejected list creation")?
            .json()
            .await?;
        Ok(list)
    }
}
