//! # Station Table Rendering
//!
//! Renders a ranked result as a plain-text table for the terminal. The three
//! sortable headers carry an indicator of the active sort:
//!
//! - `↕` column not active
//! - `↓` active, ascending
//! - `↑` active, descending
//!
//! Rendering is split into pure `render_*` functions returning a `String`
//! and `draw_*` helpers that print them.

use crate::ranking::{RankedStation, SortField, SortSpec};
use crate::Provider;
use chrono::{Local, TimeZone};
use std::fmt::{Display, Write};

/// Decimal places shown for station coordinates.
const COORDINATE_DECIMALS: usize = 8;
/// Decimal places shown for distances.
const DISTANCE_DECIMALS: usize = 3;

const LATITUDE_WIDTH: usize = 13;
const LONGITUDE_WIDTH: usize = 13;
const DISTANCE_WIDTH: usize = 16;
const FREE_BIKES_WIDTH: usize = 13;
const UPDATED_WIDTH: usize = 28;

/// Sort indicator for a header.
pub fn sort_indicator(field: SortField, active: SortSpec) -> char {
    if field != active.field {
        '↕'
    } else if active.descending {
        '↑'
    } else {
        '↓'
    }
}

/// Link that opens a station on Google Maps.
pub fn map_link(station: &RankedStation) -> String {
    let c = station.station.coordinate;
    format!(
        "https://www.google.co.uk/maps/place/{}%20{}",
        c.latitude, c.longitude
    )
}

/// Render the ranked stations, with times shown in `tz`.
pub fn render_table<Tz>(stations: &[RankedStation], city: &str, sort: SortSpec, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let label = |station: &RankedStation| {
        if city.is_empty() {
            station.station.name.clone()
        } else {
            format!("{}, {}", station.station.name, city)
        }
    };
    let name_width = stations
        .iter()
        .map(|s| label(s).chars().count())
        .chain(std::iter::once("Station Name".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<lat$} {:<lon$} {:<dist$} {:<name$} {:<bikes$} {:<upd$} Map",
        "Latitude",
        "Longitude",
        format!("Distance (km) {}", sort_indicator(SortField::Distance, sort)),
        "Station Name",
        format!("Free Bikes {}", sort_indicator(SortField::FreeBikes, sort)),
        format!("Last Updated {}", sort_indicator(SortField::LastUpdated, sort)),
        lat = LATITUDE_WIDTH,
        lon = LONGITUDE_WIDTH,
        dist = DISTANCE_WIDTH,
        name = name_width,
        bikes = FREE_BIKES_WIDTH,
        upd = UPDATED_WIDTH,
    );

    if stations.is_empty() {
        out.push_str("No stations match the current search.\n");
        return out;
    }

    for station in stations {
        let c = station.station.coordinate;
        let updated = station
            .station
            .last_updated
            .with_timezone(tz)
            .format("%H:%M:%S, %a %b %d %Y");
        let _ = writeln!(
            out,
            "{:<lat$.dp$} {:<lon$.dp$} {:<dist$.km$} {:<name$} {:<bikes$} {:<upd$} {}",
            c.latitude,
            c.longitude,
            station.distance_km,
            label(station),
            station.station.free_bikes,
            updated.to_string(),
            map_link(station),
            lat = LATITUDE_WIDTH,
            lon = LONGITUDE_WIDTH,
            dist = DISTANCE_WIDTH,
            name = name_width,
            bikes = FREE_BIKES_WIDTH,
            upd = UPDATED_WIDTH,
            dp = COORDINATE_DECIMALS,
            km = DISTANCE_DECIMALS,
        );
    }
    out
}

/// Print the ranked stations with times in the local timezone.
pub fn draw_ascii(stations: &[RankedStation], city: &str, sort: SortSpec) {
    print!("{}", render_table(stations, city, sort, &Local));
}

/// One line per provider: `id  name (city, country)`.
pub fn render_providers(providers: &[Provider]) -> String {
    let id_width = providers.iter().map(|p| p.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for p in providers {
        let _ = writeln!(
            out,
            "{:<width$}  {} ({}, {})",
            p.id,
            p.name,
            p.city,
            p.country,
            width = id_width
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, Station};
    use chrono::Utc;

    fn ranked(name: &str, free_bikes: u32, distance_km: f64) -> RankedStation {
        RankedStation {
            station: Station {
                id: name.to_lowercase(),
                name: name.to_string(),
                coordinate: Coordinate {
                    latitude: 51.5292,
                    longitude: -0.1099,
                },
                free_bikes,
                last_updated: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            },
            distance_km,
            position: 0,
        }
    }

    #[test]
    fn test_sort_indicators() {
        let asc = SortSpec::ascending(SortField::FreeBikes);
        assert_eq!(sort_indicator(SortField::FreeBikes, asc), '↓');
        assert_eq!(sort_indicator(SortField::Distance, asc), '↕');

        let desc = SortSpec {
            field: SortField::FreeBikes,
            descending: true,
        };
        assert_eq!(sort_indicator(SortField::FreeBikes, desc), '↑');
        assert_eq!(sort_indicator(SortField::LastUpdated, desc), '↕');
    }

    #[test]
    fn test_render_rows() {
        let table = render_table(
            &[ranked("River Street", 7, 3.21), ranked("Soho Square", 2, 0.5)],
            "London",
            SortSpec::default(),
            &Utc,
        );
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Distance (km) ↓"));
        assert!(lines[0].contains("Free Bikes ↕"));
        assert!(lines[0].contains("Last Updated ↕"));

        assert!(lines[1].starts_with("51.52920000"));
        assert!(lines[1].contains("-0.10990000"));
        assert!(lines[1].contains("3.210"));
        assert!(lines[1].contains("River Street, London"));
        assert!(lines[1].contains("10:00:00, Wed May 01 2024"));
        assert!(lines[1].ends_with("https://www.google.co.uk/maps/place/51.5292%20-0.1099"));
        assert!(lines[2].contains("Soho Square, London"));
    }

    #[test]
    fn test_render_empty() {
        let table = render_table(&[], "London", SortSpec::default(), &Utc);
        assert!(table.ends_with("No stations match the current search.\n"));
    }

    #[test]
    fn test_render_providers() {
        let providers = vec![Provider {
            id: "santander-cycles".to_string(),
            name: "Santander Cycles".to_string(),
            city: "London".to_string(),
            country: "GB".to_string(),
        }];
        assert_eq!(
            render_providers(&providers),
            "santander-cycles  Santander Cycles (London, GB)\n"
        );
    }
}
