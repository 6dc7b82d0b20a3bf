//! Moves cards that finished in an earlier sprint off the working board and
//! into per-sprint lists on the archive board.

pub mod sprint;

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::directory::Directory;
use crate::error::SyncError;
use crate::model::action::Action;
use crate::model::board::{Board, Card, List, ListFilter, ListPosition};
use crate::providers::{Pacer, Provider};
use sprint::{format_date, SprintWindow};

#[derive(Debug, Clone, PartialEq)]
pub struct ArchivalJob {
    /// When the card entered the done list, in UTC.
    pub date: NaiveDateTime,
    pub card: Card,
}

#[derive(Debug, Default)]
pub struct ArchivalReport {
    pub archived: Vec<(String, String)>,
    pub current_sprint: usize,
    pub undated: usize,
}

/// Group an action log by the card each action touches. Order is preserved.
pub fn card_action_lookup(actions: &[Action]) -> HashMap<&str, Vec<&Action>> {
    let mut lookup: HashMap<&str, Vec<&Action>> = HashMap::new();
    for action in actions {
        if let Some(card_id) = action.card_id() {
            lookup.entry(card_id).or_default().push(action);
        }
    }
    lookup
}

/// The latest time any of `actions` put the card into `done_list_id`.
pub fn done_entry_date(actions: &[&Action], done_list_id: &str) -> Result<Option<NaiveDateTime>> {
    let mut latest = None;
    for action in actions.iter().filter(|a| a.entered_list(done_list_id)) {
        let ts = action.timestamp()?.naive_utc();
        if latest.map_or(true, |best| ts > best) {
            latest = Some(ts);
        }
    }
    Ok(latest)
}

async fn resolve_done_list(
    provider: &dyn Provider,
    board: &Board,
    done_list_name: &str,
) -> Result<List> {
    let lists = provider.list_lists(&board.id, ListFilter::All).await?;
    let list = lists
        .into_iter()
        .find(|l| l.name == done_list_name)
        .ok_or_else(|| SyncError::UnknownList {
            board: board.name.clone(),
            list: done_list_name.to_string(),
        })?;
    Ok(list)
}

pub async fn find_done_card_archival_jobs(
    provider: &dyn Provider,
    board: &Board,
    done_list_name: &str,
    actions: &[Action],
    report: &mut ArchivalReport,
) -> Result<Vec<ArchivalJob>> {
    let by_card = card_action_lookup(actions);
    let done_list = resolve_done_list(provider, board, done_list_name).await?;

    let mut jobs = Vec::new();
    for card in provider.list_cards(&done_list.id).await? {
        let card_actions = by_card.get(card.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        match done_entry_date(card_actions, &done_list.id)? {
            Some(date) => {
                println!("Add Job Move {} {} to {}.", card.id, card.name, format_date(date));
                jobs.push(ArchivalJob { date, card });
            }
            None => {
                tracing::warn!(card = %card.id, name = %card.name, "no move into done list on record, leaving it");
                report.undated += 1;
            }
        }
    }
    Ok(jobs)
}

pub async fn find_or_create_archive_list(
    provider: &dyn Provider,
    board: &Board,
    name: &str,
) -> Result<List> {
    let lists = provider.list_lists(&board.id, ListFilter::Open).await?;
    if let Some(list) = lists.into_iter().find(|l| l.name == name) {
        return Ok(list);
    }
    tracing::info!(board = %board.name, list = name, "creating archive list");
    provider.add_list(&board.id, name, ListPosition::Top).await
}

pub async fn process_archival_jobs(
    provider: &dyn Provider,
    archive_board: &Board,
    epoch: NaiveDateTime,
    now: NaiveDateTime,
    jobs: Vec<ArchivalJob>,
    pacer: Pacer,
    report: &mut ArchivalReport,
) -> Result<()> {
    let current = SprintWindow::containing(epoch, now);
    for job in jobs {
        let window = SprintWindow::containing(epoch, job.date);
        if window == current {
            report.current_sprint += 1;
            continue;
        }
        let list_name = window.list_name();
        println!("Executing Move {} {} to {}.", job.card.id, job.card.name, list_name);
        let list = find_or_create_archive_list(provider, archive_board, &list_name).await?;
        provider
            .move_card_to_board(&job.card.id, &archive_board.id, &list.id)
            .await?;
        report.archived.push((job.card.id, list_name));
        pacer.wait().await;
    }
    Ok(())
}

pub async fn perform_archival(
    provider: &dyn Provider,
    directory: &Directory,
    config: &AppConfig,
    actions: &[Action],
) -> Result<ArchivalReport> {
    let board = directory.board(&config.board.name)?;
    let archive_board = directory.board(&config.board.archive_board_name)?;
    let mut report = ArchivalReport::default();

    let jobs = find_done_card_archival_jobs(
        provider,
        board,
        &config.board.done_list_name,
        actions,
        &mut report,
    )
    .await?;
    process_archival_jobs(
        provider,
        archive_board,
        config.board.sprint_epoch,
        Utc::now().naive_utc(),
        jobs,
        Pacer::new(config.trello.pacing()),
        &mut report,
    )
    .await?;

    tracing::info!(
        archived = report.archived.len(),
        current_sprint = report.current_sprint,
        undated = report.undated,
        "archival finished"
    );
    Ok(report)
}
