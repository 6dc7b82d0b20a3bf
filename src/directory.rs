use anyhow::Result;
use std::collections::HashMap;

use crate::error::SyncError;
use crate::model::board::{Board, List, ListFilter};
use crate::providers::Provider;

/// A list together with the names it is addressed by in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRef {
    pub list: List,
    pub board_name: String,
    pub list_name: String,
}

/// Board and open-list lookups, built once per run and read-only afterwards.
#[derive(Debug, Default)]
pub struct Directory {
    boards: HashMap<String, Board>,
    by_board_and_name: HashMap<String, HashMap<String, ListRef>>,
    by_list_id: HashMap<String, ListRef>,
}

impl Directory {
    pub async fn build(provider: &dyn Provider) -> Result<Self> {
        let boards = provider.list_boards().await?;
        let mut directory = Directory::default();
        for board in boards {
            let lists = provider.list_lists(&board.id, ListFilter::Open).await?;
            directory.insert_board(board, lists);
        }
        tracing::debug!(
            boards = directory.boards.len(),
            lists = directory.by_list_id.len(),
            "directory built"
        );
        Ok(directory)
    }

    fn insert_board(&mut self, board: Board, lists: Vec<List>) {
        let by_name = self.by_board_and_name.entry(board.name.clone()).or_default();
        for list in lists {
            let entry = ListRef {
                board_name: board.name.clone(),
                list_name: list.name.clone(),
                list,
            };
            self.by_list_id.insert(entry.list.id.clone(), entry.clone());
            by_name.insert(entry.list_name.clone(), entry);
        }
        self.boards.insert(board.name.clone(), board);
    }

    pub fn board(&self, name: &str) -> Result<&Board, SyncError> {
        self.boards
            .get(name)
            .ok_or_else(|| SyncError::UnknownBoard(name.to_string()))
    }

    pub fn board_by_id(&self, board_id: &str) -> Option<&Board> {
        self.boards.values().find(|b| b.id == board_id)
    }

    pub fn list(&self, board_name: &str, list_name: &str) -> Result<&ListRef, SyncError> {
        let lists = self
            .by_board_and_name
            .get(board_name)
            .ok_or_else(|| SyncError::UnknownBoard(board_name.to_string()))?;
        lists.get(list_name).ok_or_else(|| SyncError::UnknownList {
            board: board_name.to_string(),
            list: list_name.to_string(),
        })
    }

    pub fn list_by_id(&self, list_id: &str) -> Option<&ListRef> {
        self.by_list_id.get(list_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::tests::MockProvider;

    fn provider() -> MockProvider {
        MockProvider::new()
            .board("b1", "Alpha")
            .board("b2", "Beta")
            .list("a-todo", "b1", "Todo")
            .list("a-done", "b1", "Done")
            .closed_list("a-old", "b1", "Old")
            .list("b-todo", "b2", "Todo")
    }

    #[tokio::test]
    async fn indexes_lists_both_ways() {
        let directory = Directory::build(&provider()).await.unwrap();

        let by_name = directory.list("Beta", "Todo").unwrap();
        assert_eq!(by_name.list.id, "b-todo");

        let by_id = directory.list_by_id("a-done").unwrap();
        assert_eq!(by_id.board_name, "Alpha");
        assert_eq!(by_id.list_name, "Done");

        assert_eq!(directory.board("Alpha").unwrap().id, "b1");
        assert_eq!(directory.board_by_id("b2").unwrap().name, "Beta");
    }

    #[tokio::test]
    async fn closed_lists_are_not_indexed() {
        let directory = Directory::build(&provider()).await.unwrap();
        assert!(directory.list_by_id("a-old").is_none());
        assert!(matches!(
            directory.list("Alpha", "Old"),
            Err(SyncError::UnknownList { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_board_is_an_error() {
        let directory = Directory::build(&provider()).await.unwrap();
        assert!(matches!(
            directory.board("Gamma"),
            Err(SyncError::UnknownBoard(_))
        ));
        assert!(matches!(
            directory.list("Gamma", "Todo"),
            Err(SyncError::UnknownBoard(_))
        ));
    }
}
