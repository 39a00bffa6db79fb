//! Menu-driven dashboard session.

use std::io::Write;

use anyhow::Result;
use inquire::{InquireError, Select, Text, error::InquireResult};
use tokio::sync::mpsc::UnboundedReceiver;
use weatherboard_core::{Dashboard, Event, Intent, present::city_rows};

use crate::terminal::TerminalSink;

type Board<W> = Dashboard<TerminalSink<W>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SelectCity,
    AddCity,
    RemoveCity,
    Refresh,
    Quit,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::SelectCity => "Show another city",
            Action::AddCity => "Add city",
            Action::RemoveCity => "Remove city",
            Action::Refresh => "Refresh",
            Action::Quit => "Quit",
        })
    }
}

/// Run a blocking prompt off the async workers. `None` means the user
/// backed out with Esc or Ctrl-C.
async fn ask<T, F>(prompt: F) -> Result<Option<T>>
where
    F: FnOnce() -> InquireResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(prompt).await? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn actions<W: Write>(board: &Board<W>) -> Vec<Action> {
    let registry = board.registry();
    let mut actions = Vec::new();
    if registry.len() > 1 {
        actions.push(Action::SelectCity);
    }
    actions.push(Action::AddCity);
    if !registry.is_empty() {
        actions.push(Action::RemoveCity);
        actions.push(Action::Refresh);
    }
    actions.push(Action::Quit);
    actions
}

pub async fn run<W: Write>(board: &mut Board<W>, rx: &mut UnboundedReceiver<Event>) -> Result<()> {
    loop {
        let options = actions(board);
        let Some(action) = ask(move || Select::new("What next?", options).prompt()).await? else {
            return Ok(());
        };

        match action {
            Action::SelectCity => {
                if let Some(index) = choose_city(board, false).await? {
                    board.dispatch(Intent::Select(index));
                }
            }
            Action::AddCity => add_city(board, rx).await?,
            Action::RemoveCity => {
                if let Some(index) = choose_city(board, true).await? {
                    board.dispatch(Intent::Remove(index));
                }
            }
            Action::Refresh => board.dispatch(Intent::Refresh),
            Action::Quit => return Ok(()),
        }

        board.settle(rx).await;
    }
}

/// Pick a city from the saved list and return its index.
async fn choose_city<W: Write>(board: &Board<W>, removable_only: bool) -> Result<Option<usize>> {
    let entries: Vec<(usize, String)> = city_rows(board.registry())
        .into_iter()
        .filter(|row| !removable_only || row.removable)
        .map(|row| (row.index, row.label))
        .collect();

    if entries.is_empty() {
        return Ok(None);
    }

    let labels: Vec<String> = entries.iter().map(|(_, label)| label.clone()).collect();
    let chosen = ask(move || Select::new("City", labels).raw_prompt()).await?;
    Ok(chosen.map(|option| entries[option.index].0))
}

/// Search, pick and add until a city is added or the user backs out.
async fn add_city<W: Write>(board: &mut Board<W>, rx: &mut UnboundedReceiver<Event>) -> Result<()> {
    if !board.add_city_visible() {
        board.dispatch(Intent::ToggleAddCity);
    }

    while board.add_city_visible() {
        let Some(query) = ask(|| Text::new("City name").prompt()).await? else {
            board.dispatch(Intent::ToggleAddCity);
            break;
        };

        board.dispatch(Intent::Query(query));
        board.settle(rx).await;

        let labels: Vec<String> = board.candidates().iter().map(|c| c.label()).collect();
        if labels.is_empty() {
            println!("No matching cities.");
            continue;
        }

        let Some(choice) = ask(move || Select::new("Matches", labels).raw_prompt()).await? else {
            continue;
        };

        board.dispatch(Intent::Pick(choice.index));
        board.dispatch(Intent::Add);
        board.settle(rx).await;
    }

    Ok(())
}
