//! # Cycle Finder Application Entry Point
//!
//! This binary crate wires the ranking library to the CityBikes API and the
//! terminal. It supports a one-shot search driven by command-line flags and an
//! interactive mode where every edit re-ranks the current result.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use cycle_finder_lib::app::{App, Command, Outcome};
use cycle_finder_lib::config::Config;
use cycle_finder_lib::geolocation::FixedLocation;
use cycle_finder_lib::input::{CoordinateRules, MAX_MIN_FREE_BIKES, MAX_RESULTS_LIMIT};
use cycle_finder_lib::provider::CityBikesClient;
use cycle_finder_lib::ranking::SortField;
use cycle_finder_lib::renderer::{draw_ascii, render_providers};
use std::env;
use std::io::{self, BufRead, Write};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: cycle-finder [OPTIONS]

  --list-providers        list bike-share providers and exit
  --provider ID           provider to search
  --lat LAT --lon LON     reference point
  --here                  use the [location] from the config file
  --min-bikes N           minimum free bikes (0-99)
  --max N                 number of stations to show (0-200)
  --sort COLUMN           distance, free_bikes or timestamp
  --desc                  reverse the sort
  --interactive, -i       start an interactive session
  --config PATH           config file (default cycle-config.toml)";

/// Parsed command-line flags.
#[derive(Debug, Default, PartialEq)]
pub struct Options {
    pub list_providers: bool,
    pub interactive: bool,
    pub help: bool,
    pub config_path: Option<String>,
    /// Form edits, applied in order before any search
    pub commands: Vec<Command>,
}

/// Turn flags into form commands.
///
/// Flags are applied in a fixed order (provider, reference, filters, sort)
/// no matter how they were typed.
pub fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut provider = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut here = false;
    let mut min_bikes = None;
    let mut max = None;
    let mut sort: Option<SortField> = None;
    let mut descending = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let flag = arg.as_str();
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} needs a value"))
        };
        match flag {
            "--list-providers" => options.list_providers = true,
            "--interactive" | "-i" => options.interactive = true,
            "--help" | "-h" => options.help = true,
            "--config" => options.config_path = Some(value(flag)?),
            "--provider" => provider = Some(value(flag)?),
            "--lat" => latitude = Some(value(flag)?),
            "--lon" => longitude = Some(value(flag)?),
            "--here" => here = true,
            "--min-bikes" => min_bikes = Some(value(flag)?),
            "--max" => max = Some(value(flag)?),
            "--sort" => {
                let column = value(flag)?;
                sort = Some(column.parse().map_err(anyhow::Error::msg)?);
            }
            "--desc" => descending = true,
            other => bail!("unknown argument '{other}'\n\n{USAGE}"),
        }
    }

    if let Some(id) = provider {
        options.commands.push(Command::Provider(id));
    }
    match (latitude, longitude, here) {
        (Some(latitude), Some(longitude), false) => options.commands.push(Command::At {
            latitude,
            longitude,
        }),
        (None, None, true) => options.commands.push(Command::Here),
        (None, None, false) => {}
        _ => bail!("give either both --lat and --lon, or --here"),
    }
    if let Some(n) = min_bikes {
        options.commands.push(Command::MinBikes(n));
    }
    if let Some(n) = max {
        options.commands.push(Command::MaxResults(n));
    }
    let field = match (sort, descending) {
        (Some(field), _) => Some(field),
        (None, true) => Some(SortField::Distance),
        (None, false) => None,
    };
    if let Some(field) = field {
        // Distance ascending is already active; selecting it again would reverse it
        if field != SortField::Distance {
            options.commands.push(Command::Sort(field));
        }
        if descending {
            options.commands.push(Command::Sort(field));
        }
    }

    Ok(options)
}

/// Form edits implied by the `[search]` section of the config.
///
/// Values above the form limits are clamped so a bad config file cannot stop
/// the program from starting.
fn config_commands(config: &Config) -> Vec<Command> {
    let mut commands = Vec::new();
    if let Some(id) = &config.search.default_provider {
        commands.push(Command::Provider(id.clone()));
    }
    let mut min_free_bikes = config.search.min_free_bikes;
    if min_free_bikes > MAX_MIN_FREE_BIKES {
        warn!(
            min_free_bikes,
            limit = MAX_MIN_FREE_BIKES,
            "search.min_free_bikes clamped"
        );
        min_free_bikes = MAX_MIN_FREE_BIKES;
    }
    let mut max_results = config.search.max_results;
    if max_results > MAX_RESULTS_LIMIT {
        warn!(max_results, limit = MAX_RESULTS_LIMIT, "search.max_results clamped");
        max_results = MAX_RESULTS_LIMIT;
    }
    commands.push(Command::MinBikes(min_free_bikes.to_string()));
    commands.push(Command::MaxResults(max_results.to_string()));
    commands
}

/// Act on one outcome. Returns `Ok(false)` once the user asked to quit.
///
/// A failed fetch leaves the previous result in place and is returned as an
/// error; the interactive loop reports it and carries on.
fn handle(
    rt: &Runtime,
    client: &CityBikesClient,
    app: &mut App<FixedLocation>,
    outcome: Outcome,
) -> anyhow::Result<bool> {
    match outcome {
        Outcome::Render => draw_ascii(app.result(), app.city(), app.sort_spec()),
        Outcome::Fetch(provider) => match rt.block_on(client.stations(&provider)) {
            Ok(list) => {
                app.stations_arrived(list);
                draw_ascii(app.result(), app.city(), app.sort_spec());
            }
            Err(e) => {
                error!(provider = %provider, error = %e, "station fetch failed");
                return Err(e)
                    .with_context(|| format!("could not fetch stations for '{provider}'"));
            }
        },
        Outcome::ListProviders => match rt.block_on(client.providers()) {
            Ok(providers) => print!("{}", render_providers(&providers)),
            Err(e) => {
                error!(error = %e, "provider fetch failed");
                return Err(e).context("could not fetch providers");
            }
        },
        Outcome::Message(text) => println!("{text}"),
        Outcome::Nothing => {}
        Outcome::Quit => return Ok(false),
    }
    Ok(true)
}

fn run_interactive(
    rt: &Runtime,
    client: &CityBikesClient,
    app: &mut App<FixedLocation>,
) -> anyhow::Result<()> {
    println!("Cycle Finder, type 'help' for commands.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = line.parse::<Command>().and_then(|command| app.apply(command));
        match outcome {
            Ok(outcome) => match handle(rt, client, app, outcome) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("{e:#}"),
            },
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;
    if options.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match &options.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    // Create Tokio runtime for async operations
    let rt = Runtime::new()?;
    let client = CityBikesClient::new(&config.api);

    if options.list_providers {
        handle(&rt, &client, &mut new_app(&config), Outcome::ListProviders)?;
        return Ok(());
    }

    let mut app = new_app(&config);
    for command in config_commands(&config).into_iter().chain(options.commands) {
        let outcome = app
            .apply(command.clone())
            .with_context(|| format!("applying {command:?}"))?;
        handle(&rt, &client, &mut app, outcome)?;
    }

    if options.interactive {
        return run_interactive(&rt, &client, &mut app);
    }

    info!("running one-shot search");
    match app.apply(Command::Search) {
        Ok(outcome) => {
            handle(&rt, &client, &mut app, outcome)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{USAGE}");
            Err(e.into())
        }
    }
}

fn new_app(config: &Config) -> App<FixedLocation> {
    App::new(
        CoordinateRules::new(&config.input),
        FixedLocation::new(config.location),
    )
}
