use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SyncError;
use crate::sync::status::SyncStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub trello: TrelloConfig,
    pub board: BoardConfig,
    pub storage: StorageConfig,
    pub card_sync: Option<CardSyncConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrelloConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub token: String,
    /// Account the job writes as. Its moves never count as a sync signal.
    pub automation_username: String,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl TrelloConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub done_list_name: String,
    pub archive_board_name: String,
    #[serde(default = "default_sprint_epoch")]
    pub sprint_epoch: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub actions_file: PathBuf,
    pub cards_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardSyncConfig {
    pub persistence_file: PathBuf,
    pub destination_board: SyncBoardConfig,
    pub source_boards: Vec<SyncBoardConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncBoardConfig {
    pub name: String,
    pub list_names: ListNames,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListNames {
    pub todo: String,
    pub in_progress: String,
    pub done: String,
}

impl ListNames {
    pub fn status_of(&self, list_name: &str) -> Option<SyncStatus> {
        if list_name == self.todo {
            Some(SyncStatus::Todo)
        } else if list_name == self.in_progress {
            Some(SyncStatus::InProgress)
        } else if list_name == self.done {
            Some(SyncStatus::Done)
        } else {
            None
        }
    }

    pub fn list_for(&self, status: SyncStatus) -> Option<&str> {
        match status {
            SyncStatus::Todo => Some(&self.todo),
            SyncStatus::InProgress => Some(&self.in_progress),
            SyncStatus::Done => Some(&self.done),
            SyncStatus::NotFound => None,
        }
    }
}

impl CardSyncConfig {
    /// The destination board wins if a name appears on both sides.
    pub fn board(&self, name: &str) -> Option<&SyncBoardConfig> {
        if self.destination_board.name == name {
            return Some(&self.destination_board);
        }
        self.source_boards.iter().find(|b| b.name == name)
    }
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_sprint_epoch() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2023-08-02T00:00:00", "%Y-%m-%dT%H:%M:%S")
        .unwrap_or_default()
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tidyboard")
}

/// Read, apply credential overrides from the environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Ok(key) = std::env::var("TRELLO_API_KEY") {
        config.trello.api_key = key;
    }
    if let Ok(token) = std::env::var("TRELLO_TOKEN") {
        config.trello.token = token;
    }

    config.validate()?;
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        require("trello.api_key", &self.trello.api_key)?;
        require("trello.token", &self.trello.token)?;
        require("trello.automation_username", &self.trello.automation_username)?;
        require("board.name", &self.board.name)?;
        require("board.done_list_name", &self.board.done_list_name)?;
        require("board.archive_board_name", &self.board.archive_board_name)?;

        if let Some(sync) = &self.card_sync {
            sync.validate()?;
        }
        Ok(())
    }
}

impl CardSyncConfig {
    fn validate(&self) -> Result<(), SyncError> {
        if self.source_boards.is_empty() {
            return Err(SyncError::InvalidConfig(
                "card_sync.source_boards must list at least one board".into(),
            ));
        }

        let mut seen = HashSet::new();
        for board in std::iter::once(&self.destination_board).chain(&self.source_boards) {
            require("card_sync board name", &board.name)?;
            if !seen.insert(board.name.as_str()) {
                return Err(SyncError::InvalidConfig(format!(
                    "board \"{}\" appears more than once in card_sync",
                    board.name
                )));
            }

            let names = &board.list_names;
            for list in [&names.todo, &names.in_progress, &names.done] {
                require("card_sync list name", list)?;
            }
            if names.todo == names.in_progress
                || names.todo == names.done
                || names.in_progress == names.done
            {
                return Err(SyncError::InvalidConfig(format!(
                    "board \"{}\" maps two statuses to the same list",
                    board.name
                )));
            }
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidConfig(format!("{key} must not be empty")));
    }
    Ok(())
}
