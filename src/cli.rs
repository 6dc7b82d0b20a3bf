use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::activity;
use crate::archival;
use crate::config::{self, AppConfig};
use crate::directory::Directory;
use crate::model::board::Card;
use crate::providers::{self, Provider};
use crate::sync;

/// Keeps a local copy of a board's history, archives finished cards by sprint
/// and mirrors cards between boards.
#[derive(Debug, Parser)]
#[command(name = "tidyboard", version)]
pub struct Cli {
    /// Config file (defaults to ~/.tidyboard/config.toml)
    #[arg(long, global = true, env = "TIDYBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Refresh activity, archive, then sync cards (default)
    Run,
    /// Only refresh the local action log and card cache
    Refresh,
    /// Refresh activity then archive finished cards
    Archive,
    /// Link new cards and reconcile existing links
    Sync,
    /// Print the stored snapshot and attachments of cards with this name
    ShowCard {
        board: String,
        list: String,
        name: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = config::load_config(self.config.as_deref())?;
        let provider = providers::create_provider(&config);
        let directory = Directory::build(provider.as_ref()).await?;

        match self.command.unwrap_or(Command::Run) {
            Command::Run => {
                let cache = activity::refresh_activity(provider.as_ref(), &directory, &config).await?;
                archive(provider.as_ref(), &directory, &config, &cache).await?;
                sync_cards(provider.as_ref(), &directory, &config).await
            }
            Command::Refresh => {
                activity::refresh_activity(provider.as_ref(), &directory, &config).await?;
                Ok(())
            }
            Command::Archive => {
                let cache = activity::refresh_activity(provider.as_ref(), &directory, &config).await?;
                archive(provider.as_ref(), &directory, &config, &cache).await
            }
            Command::Sync => sync_cards(provider.as_ref(), &directory, &config).await,
            Command::ShowCard { board, list, name } => {
                let found = show_card(provider.as_ref(), &directory, &board, &list, &name).await?;
                if found.is_empty() {
                    println!("Not found");
                }
                Ok(())
            }
        }
    }
}

async fn archive(
    provider: &dyn Provider,
    directory: &Directory,
    config: &AppConfig,
    cache: &activity::ActivityCache,
) -> Result<()> {
    let report = archival::perform_archival(provider, directory, config, &cache.actions).await?;
    println!(
        "Archived {} card(s); {} still in the current sprint.",
        report.archived.len(),
        report.current_sprint
    );
    Ok(())
}

async fn sync_cards(provider: &dyn Provider, directory: &Directory, config: &AppConfig) -> Result<()> {
    if let Some(report) = sync::perform_sync(provider, directory, config).await? {
        println!(
            "Sync: {} in sync, {} corrected, {} link(s) removed, {} skipped.",
            report.in_sync,
            report.corrected.len(),
            report.removed.len(),
            report.skipped
        );
    }
    Ok(())
}

/// Print every card named `name` in the given list, with its attachments.
pub async fn show_card(
    provider: &dyn Provider,
    directory: &Directory,
    board_name: &str,
    list_name: &str,
    name: &str,
) -> Result<Vec<Card>> {
    let board = directory.board(board_name)?;
    let list = directory.list(board_name, list_name)?;
    let found: Vec<Card> = provider
        .board_cards(&board.id)
        .await?
        .into_iter()
        .filter(|c| c.name == name && c.id_list == list.list.id)
        .collect();

    for card in &found {
        println!("# Card\n---\n");
        println!("{}", serde_json::to_string_pretty(card)?);
        println!("\n---\n## Attachments\n");
        for attachment in provider.card_attachments(&card.id).await? {
            println!("{}", serde_json::to_string_pretty(&attachment)?);
        }
    }
    Ok(found)
}
