//! # Interactive Application State
//!
//! Glue between user commands, the search form, and the ranking session.
//! Network access stays outside: a search yields [`Outcome::Fetch`] and the
//! host hands the fetched stations back through [`App::stations_arrived`].
//!
//! Every command maps onto exactly one ranking entry point, so the work done
//! per keystroke is what that entry point promises and nothing more.

use crate::geolocation::{GeolocationSource, LocationError};
use crate::input::{Axis, CoordinateRules, SearchForm};
use crate::ranking::{RankedStation, RankingSession, SortField, SortSpec};
use crate::StationList;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search,
    At { latitude: String, longitude: String },
    Here,
    MinBikes(String),
    MaxResults(String),
    Sort(SortField),
    Provider(String),
    Show,
    Providers,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  provider ID      select a bike-share provider
  at LAT LON       set the reference point
  here             use the configured current location
  min N            minimum free bikes (0-99)
  max N            number of stations to show (0-200)
  sort COLUMN      sort by distance, free_bikes or timestamp (again to reverse)
  search           fetch live stations for the selected provider
  show             print the current result
  providers        list available providers
  quit";

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' expects {1}")]
    Usage(&'static str, &'static str),

    #[error("{0}")]
    Sort(String),

    #[error("'{0}' is not accepted here")]
    Rejected(String),

    #[error("select a provider and enter a latitude and longitude first")]
    CannotSearch,

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();
        let one = |usage: &'static str, what: &'static str| match args.as_slice() {
            [value] => Ok(value.to_string()),
            _ => Err(CommandError::Usage(usage, what)),
        };

        match name.to_ascii_lowercase().as_str() {
            "search" | "s" => Ok(Command::Search),
            "at" => match args.as_slice() {
                [latitude, longitude] => Ok(Command::At {
                    latitude: latitude.to_string(),
                    longitude: longitude.to_string(),
                }),
                _ => Err(CommandError::Usage("at", "a latitude and a longitude")),
            },
            "here" => Ok(Command::Here),
            "min" => one("min", "a number of bikes").map(Command::MinBikes),
            "max" => one("max", "a number of stations").map(Command::MaxResults),
            "sort" => {
                let column = one("sort", "a column")?;
                column
                    .parse()
                    .map(Command::Sort)
                    .map_err(CommandError::Sort)
            }
            "provider" => one("provider", "a provider id").map(Command::Provider),
            "show" => Ok(Command::Show),
            "providers" => Ok(Command::Providers),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What the host should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The ranked result changed or was asked for
    Render,
    /// Fetch live stations for this provider, then call `stations_arrived`
    Fetch(String),
    /// Print the provider list
    ListProviders,
    /// Print a message
    Message(String),
    /// Nothing to show
    Nothing,
    Quit,
}

/// Form, ranking session and sort state for one user.
pub struct App<G> {
    form: SearchForm,
    session: Option<RankingSession>,
    sort: SortSpec,
    city: String,
    location: G,
}

impl<G: GeolocationSource> App<G> {
    pub fn new(rules: CoordinateRules, location: G) -> Self {
        Self {
            form: SearchForm::new(rules),
            session: None,
            sort: SortSpec::default(),
            city: String::new(),
            location,
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, CommandError> {
        debug!(?command, "apply");
        match command {
            Command::Search => {
                if !self.form.can_search() {
                    return Err(CommandError::CannotSearch);
                }
                let provider = self.form.provider().unwrap_or_default().to_string();
                Ok(Outcome::Fetch(provider))
            }
            Command::At {
                latitude,
                longitude,
            } => {
                if !self.form.accepts(Axis::Latitude, &latitude) {
                    return Err(CommandError::Rejected(latitude));
                }
                if !self.form.accepts(Axis::Longitude, &longitude) {
                    return Err(CommandError::Rejected(longitude));
                }
                self.form.set_coordinate_text(Axis::Latitude, &latitude);
                self.form.set_coordinate_text(Axis::Longitude, &longitude);
                Ok(self.reference_edited())
            }
            Command::Here => {
                let position = self.location.current_position()?;
                self.form.fill_position(position);
                Ok(self.reference_edited())
            }
            Command::MinBikes(text) => {
                if !self.form.set_min_free_bikes(&text) {
                    return Err(CommandError::Rejected(text));
                }
                Ok(self.filter_edited())
            }
            Command::MaxResults(text) => {
                if !self.form.set_max_results(&text) {
                    return Err(CommandError::Rejected(text));
                }
                Ok(self.filter_edited())
            }
            Command::Sort(field) => match self.session.as_mut() {
                Some(session) => {
                    session.on_sort_changed(field);
                    self.sort = session.sort_spec();
                    Ok(Outcome::Render)
                }
                None => {
                    self.sort = if self.sort.field == field {
                        SortSpec {
                            field,
                            descending: !self.sort.descending,
                        }
                    } else {
                        SortSpec::ascending(field)
                    };
                    Ok(Outcome::Nothing)
                }
            },
            Command::Provider(id) => {
                self.form.select_provider(Some(id));
                Ok(Outcome::Nothing)
            }
            Command::Show => Ok(Outcome::Render),
            Command::Providers => Ok(Outcome::ListProviders),
            Command::Help => Ok(Outcome::Message(HELP.to_string())),
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    /// A fetch requested by [`Outcome::Fetch`] completed.
    ///
    /// Starts a new ranking from the form's current parameters, keeping the
    /// active sort.
    pub fn stations_arrived(&mut self, list: StationList) {
        let Some(params) = self.form.params() else {
            debug!("stations arrived without a valid reference; ignoring");
            return;
        };
        let mut session = RankingSession::with_sort(params, self.sort);
        session.on_stations_replaced(list.stations);
        self.city = list.city;
        self.session = Some(session);
    }

    /// Stations to display; empty before the first search.
    pub fn result(&self) -> &[RankedStation] {
        self.session.as_ref().map(|s| s.result()).unwrap_or(&[])
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn session(&self) -> Option<&RankingSession> {
        self.session.as_ref()
    }

    fn reference_edited(&mut self) -> Outcome {
        match (self.session.as_mut(), self.form.reference()) {
            (Some(session), Some(reference)) => {
                session.on_reference_changed(reference);
                Outcome::Render
            }
            _ => Outcome::Nothing,
        }
    }

    fn filter_edited(&mut self) -> Outcome {
        match self.session.as_mut() {
            Some(session) => {
                session.on_filter_changed(self.form.min_free_bikes(), self.form.max_results());
                Outcome::Render
            }
            None => Outcome::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("search".parse(), Ok(Command::Search));
        assert_eq!(
            "at 51.5 -0.12".parse(),
            Ok(Command::At {
                latitude: "51.5".to_string(),
                longitude: "-0.12".to_string()
            })
        );
        assert_eq!("MIN 3".parse(), Ok(Command::MinBikes("3".to_string())));
        assert_eq!("sort free_bikes".parse(), Ok(Command::Sort(SortField::FreeBikes)));
        assert_eq!("q".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "at 51.5".parse::<Command>(),
            Err(CommandError::Usage("at", "a latitude and a longitude"))
        );
        assert!(matches!(
            "sort name".parse::<Command>(),
            Err(CommandError::Sort(_))
        ));
    }
}
