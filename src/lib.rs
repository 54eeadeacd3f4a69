//! # Cycle Finder Core Library
//!
//! This library provides the data structures and the station ranking engine for
//! the cycle finder application. Given the live station list of a bike-share
//! provider and a reference point, it answers "which stations near me have bikes?".
//!
//! ## Data Flow
//! 1. **Fetch**: provider list and station list come from the CityBikes API ([`provider`])
//! 2. **Annotate**: every station gets its great-circle distance from the reference ([`distance`])
//! 3. **Rank**: filter by minimum free bikes, sort by the active column, cap ([`ranking`])
//! 4. **Display**: the ranked result is rendered as a text table ([`renderer`])
//!
//! The ranking engine is pure: it owns no station data and never mutates the
//! provider payload. Distances live on a separate [`ranking::RankedStation`] record.
//!
//! ## Core Types
//! - [`Coordinate`]: a validated latitude/longitude pair
//! - [`Station`]: a single docking point as reported by the provider
//! - [`Provider`]: a bike-share network

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod app;
pub mod config;
pub mod distance;
pub mod geolocation;
pub mod input;
pub mod provider;
pub mod ranking;
pub mod renderer;

/// Largest absolute latitude, in degrees.
pub const MAX_LATITUDE: f64 = 90.0;
/// Largest absolute longitude, in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Rejected coordinate values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A point on the Earth's surface in decimal degrees.
///
/// Build one with [`Coordinate::new`] at the input boundary; the ranking engine
/// assumes every coordinate it sees has already been validated.
///
/// # Example
/// ```
/// use cycle_finder_lib::Coordinate;
///
/// let london = Coordinate::new(51.5, -0.12).unwrap();
/// assert_eq!(london.latitude, 51.5);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || latitude.abs() > MAX_LATITUDE {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || longitude.abs() > MAX_LONGITUDE {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// A single docking station as reported by its provider.
///
/// Stations are replaced wholesale on every fetch; nothing in the crate
/// merges or mutates them after they are built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Unique within a provider
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    /// Bikes currently available to rent
    pub free_bikes: u32,
    /// When the provider last refreshed this station
    pub last_updated: DateTime<Utc>,
}

/// A bike-share network such as a citywide cycle hire scheme.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// CityBikes network identifier (e.g. "santander-cycles")
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

/// The stations of one provider, as returned by a single fetch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationList {
    /// City the provider operates in, shown next to each station name
    pub city: String,
    pub stations: Vec<Station>,
}
