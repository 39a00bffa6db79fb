use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use weatherboard_core::{
    CityRegistry, Config, Coordinates, Dashboard, Event, Intent, JsonFileStore, KeyValueStore,
    LocatorMode, MemoryStore, OutputSink, Services, geolocation::LOCATION_PROMPT, present::city_rows,
    storage::load_cities,
};

use crate::{interactive, terminal::TerminalSink};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherboard", version, about = "Three-day forecasts for your saved cities")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep cities in memory only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive dashboard (default).
    Dashboard,

    /// List saved cities; the active one is marked with '*'.
    List,

    /// Search for a city and add one of the matches.
    Add {
        /// City name to search for.
        query: String,

        /// Which match to add, counting from 0.
        #[arg(long, default_value_t = 0)]
        pick: usize,
    },

    /// Remove a saved city by its list index.
    Remove { index: usize },

    /// Show the forecast for a saved city (default: the active one).
    Show { index: Option<usize> },

    /// Choose how the device location is found on first run.
    Configure,
}

type Board<W> = Dashboard<TerminalSink<W>>;

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let command = self.command.unwrap_or(Command::Dashboard);

        if let Command::Configure = command {
            return configure(config);
        }

        let store = open_store(&config, self.ephemeral)?;

        if let Command::List = command {
            let registry = CityRegistry::from_saved(load_cities(store.as_ref()).unwrap_or_default());
            let mut sink = TerminalSink::new(io::stdout());
            sink.cities(&city_rows(&registry));
            return Ok(());
        }

        let services = Services::from_config(&config, store)?;
        let (mut board, mut rx) = Dashboard::new(services, TerminalSink::new(io::stdout()));

        if let Command::Dashboard = command {
            board.start().await;
            board.settle(&mut rx).await;
            return interactive::run(&mut board, &mut rx).await;
        }

        // One-shot commands only need the city list, not the startup forecast.
        board.sink_mut().set_muted(true);
        board.hydrate().await;
        board.sink_mut().set_muted(false);

        match command {
            Command::Add { query, pick } => add_city(&mut board, &mut rx, &query, pick).await?,
            Command::Remove { index } => remove_city(&mut board, index)?,
            Command::Show { index } => {
                if board.registry().is_empty() {
                    bail!("{LOCATION_PROMPT}.");
                }
                match index {
                    Some(index) => {
                        ensure_index(&board, index)?;
                        board.dispatch(Intent::Select(index));
                    }
                    None => board.dispatch(Intent::Refresh),
                }
            }
            Command::Dashboard | Command::List | Command::Configure => {}
        }

        board.settle(&mut rx).await;
        Ok(())
    }
}

fn open_store(config: &Config, ephemeral: bool) -> Result<Arc<dyn KeyValueStore>> {
    if ephemeral {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let dir = config.resolve_data_dir()?;
    info!(dir = %dir.display(), "Using city store");
    Ok(Arc::new(JsonFileStore::new(dir)))
}

async fn add_city<W: Write>(
    board: &mut Board<W>,
    rx: &mut UnboundedReceiver<Event>,
    query: &str,
    pick: usize,
) -> Result<()> {
    board.dispatch(Intent::Query(query.to_string()));
    board.settle(rx).await;

    let found = board.candidates().len();
    if found == 0 {
        bail!("No cities found for '{query}'.");
    }
    if pick >= found {
        bail!("Only {found} matches for '{query}'; --pick must be below {found}.");
    }

    board.dispatch(Intent::Pick(pick));
    board.dispatch(Intent::Add);
    if let Some(message) = board.inline_error() {
        bail!("{message}");
    }
    Ok(())
}

/// Remove a city the list shows as removable.
fn remove_city<W: Write>(board: &mut Board<W>, index: usize) -> Result<()> {
    ensure_index(board, index)?;
    if !city_rows(board.registry()).get(index).is_some_and(|row| row.removable) {
        bail!("The device location entry cannot be removed.");
    }
    board.dispatch(Intent::Remove(index));
    Ok(())
}

fn ensure_index<W: Write>(board: &Board<W>, index: usize) -> Result<()> {
    let len = board.registry().len();
    if index >= len {
        bail!("No city at index {index}; there are {len} saved cities. Run `weatherboard list`.");
    }
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    let mode = Select::new("Where should the first city come from?", LocatorMode::all().to_vec())
        .prompt()
        .context("Location mode prompt failed")?;

    match mode {
        LocatorMode::Fixed => {
            let latitude = CustomType::<f64>::new("Latitude").prompt().context("Latitude prompt failed")?;
            let longitude =
                CustomType::<f64>::new("Longitude").prompt().context("Longitude prompt failed")?;

            let coords = Coordinates { latitude, longitude };
            if !coords.is_valid() {
                return Err(anyhow!(
                    "Coordinates out of range: latitude must be -90 to 90, longitude -180 to 180."
                ));
            }
            config.set_fixed_location(coords);
        }
        other => config.location.mode = other,
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
