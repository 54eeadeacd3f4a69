//! # Station Ranking Engine
//!
//! Turns a raw station list plus the user's parameters into the ordered,
//! filtered, capped list that gets displayed.
//!
//! ## Pipeline
//! 1. **Annotate**: pair every station with its distance from the reference
//! 2. **Filter**: keep stations with at least `min_free_bikes` bikes
//! 3. **Sort**: stable sort by the active column, reversed when descending
//! 4. **Cap**: keep the first `max_results` entries
//!
//! [`rank`] runs the whole pipeline in one go. [`RankingSession`] keeps the
//! intermediate stages around so that each kind of user action redoes only
//! the stages it invalidates:
//!
//! | Action                         | Annotate | Filter | Sort            | Cap |
//! |--------------------------------|----------|--------|-----------------|-----|
//! | stations replaced              | yes      | yes    | yes             | yes |
//! | reference moved                | yes      | yes    | yes             | yes |
//! | min bikes changed              |          | yes    | yes             | yes |
//! | max results changed            |          |        |                 | yes |
//! | new sort column                |          |        | yes             | yes |
//! | same sort column clicked again |          |        | reverse in place| yes |

use crate::{distance::distance_km, Coordinate, Station};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Number of stations shown when the user has not asked for a count.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Column a ranked list can be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Distance,
    FreeBikes,
    LastUpdated,
}

impl SortField {
    pub const ALL: [SortField; 3] = [
        SortField::Distance,
        SortField::FreeBikes,
        SortField::LastUpdated,
    ];

    /// Natural ascending order of two ranked stations on this column.
    ///
    /// Ties fall back to provider order, so the result never depends on
    /// which column was sorted before.
    pub fn compare(self, a: &RankedStation, b: &RankedStation) -> Ordering {
        let by_field = match self {
            SortField::Distance => a.distance_km.total_cmp(&b.distance_km),
            SortField::FreeBikes => a.station.free_bikes.cmp(&b.station.free_bikes),
            SortField::LastUpdated => a.station.last_updated.cmp(&b.station.last_updated),
        };
        by_field.then(a.position.cmp(&b.position))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Distance => "distance",
            SortField::FreeBikes => "free_bikes",
            SortField::LastUpdated => "timestamp",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(SortField::Distance),
            "free_bikes" | "free-bikes" | "bikes" => Ok(SortField::FreeBikes),
            "timestamp" | "last_updated" | "last-updated" | "updated" => {
                Ok(SortField::LastUpdated)
            }
            other => Err(format!(
                "unknown sort column '{other}' (expected distance, free_bikes or timestamp)"
            )),
        }
    }
}

/// Active sort column and direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl SortSpec {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }
}

impl Default for SortSpec {
    /// Closest first.
    fn default() -> Self {
        Self::ascending(SortField::Distance)
    }
}

/// User-controlled inputs to a ranking.
///
/// `min_free_bikes` has no upper bound here. The form layer caps what a user
/// can type (see [`crate::input::MAX_MIN_FREE_BIKES`]), but the engine
/// accepts any value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankingParameters {
    pub reference: Coordinate,
    pub min_free_bikes: u32,
    pub max_results: usize,
}

impl RankingParameters {
    /// Parameters with the default filter (no minimum) and cap (5 stations).
    pub fn new(reference: Coordinate) -> Self {
        Self {
            reference,
            min_free_bikes: 0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// A station paired with its distance from the current reference point.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedStation {
    pub station: Station,
    pub distance_km: f64,
    /// Index in the provider's station list
    pub position: usize,
}

/// Final list handed to the display: filtered, sorted, capped.
pub type RankedResult = Vec<RankedStation>;

/// Pair every station with its distance from `reference`.
///
/// The stations are cloned into new records; the provider payload is left
/// untouched.
pub fn annotate(stations: &[Station], reference: Coordinate) -> Vec<RankedStation> {
    stations
        .iter()
        .enumerate()
        .map(|(position, station)| RankedStation {
            distance_km: distance_km(reference, station.coordinate),
            station: station.clone(),
            position,
        })
        .collect()
}

/// Stations with at least `min_free_bikes` bikes, in their original order.
pub fn filter(annotated: &[RankedStation], min_free_bikes: u32) -> Vec<RankedStation> {
    annotated
        .iter()
        .filter(|ranked| ranked.station.free_bikes >= min_free_bikes)
        .cloned()
        .collect()
}

/// Sort by `spec.field` with ties in provider order, then reverse for a
/// descending spec.
///
/// Descending is defined as the exact reverse of ascending (ties included) so
/// that toggling a column by reversing in place lands on the same order as
/// sorting from scratch. The provider-order tie-break makes a sort of an
/// already ordered list agree with a sort of the raw list.
pub fn sort(ranked: &mut [RankedStation], spec: SortSpec) {
    ranked.sort_by(|a, b| spec.field.compare(a, b));
    if spec.descending {
        ranked.reverse();
    }
}

/// Run the full annotate, filter, sort, cap pipeline.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use cycle_finder_lib::ranking::{rank, RankingParameters, SortSpec};
/// use cycle_finder_lib::{Coordinate, Station};
///
/// let station = |id: &str, free_bikes, longitude| Station {
///     id: id.to_string(),
///     name: id.to_string(),
///     coordinate: Coordinate { latitude: 0.0, longitude },
///     free_bikes,
///     last_updated: Utc::now(),
/// };
/// let stations = vec![station("A", 3, 0.0), station("B", 0, 1.0), station("C", 5, 2.0)];
///
/// let mut params = RankingParameters::new(Coordinate { latitude: 0.0, longitude: 0.0 });
/// params.min_free_bikes = 1;
///
/// let result = rank(&stations, &params, SortSpec::default());
/// let ids: Vec<_> = result.iter().map(|r| r.station.id.as_str()).collect();
/// assert_eq!(ids, ["A", "C"]);
/// ```
pub fn rank(stations: &[Station], params: &RankingParameters, spec: SortSpec) -> RankedResult {
    let annotated = annotate(stations, params.reference);
    let mut ranked = filter(&annotated, params.min_free_bikes);
    sort(&mut ranked, spec);
    ranked.truncate(params.max_results);
    ranked
}

/// Incremental ranking state for one interactive user.
///
/// Holds the raw stations, their distance annotations for the current
/// reference, and the filtered list ordered by the active sort. The displayed
/// result is always a prefix of that ordered list.
///
/// The host must serialise calls; the session does no locking of its own.
#[derive(Debug, Clone)]
pub struct RankingSession {
    stations: Vec<Station>,
    annotated: Vec<RankedStation>,
    ordered: Vec<RankedStation>,
    params: RankingParameters,
    sort: SortSpec,
    generation: u64,
}

impl RankingSession {
    /// Empty session; ranks nothing until stations arrive.
    pub fn new(params: RankingParameters) -> Self {
        Self::with_sort(params, SortSpec::default())
    }

    pub fn with_sort(params: RankingParameters, sort: SortSpec) -> Self {
        Self {
            stations: Vec::new(),
            annotated: Vec::new(),
            ordered: Vec::new(),
            params,
            sort,
            generation: 0,
        }
    }

    /// A fresh provider fetch arrived. Replaces the station list outright and
    /// re-ranks with the current reference, filter and sort.
    pub fn on_stations_replaced(&mut self, stations: Vec<Station>) {
        debug!(count = stations.len(), "station list replaced");
        self.stations = stations;
        self.reannotate();
    }

    /// The reference point moved. Every distance is stale.
    pub fn on_reference_changed(&mut self, reference: Coordinate) {
        debug!(
            latitude = reference.latitude,
            longitude = reference.longitude,
            "reference changed"
        );
        self.params.reference = reference;
        self.reannotate();
    }

    /// Minimum bikes or result count changed.
    ///
    /// Distances are reused. A new minimum re-filters and re-applies the
    /// current sort; a new cap alone only changes how much of the ordered
    /// list is shown.
    pub fn on_filter_changed(&mut self, min_free_bikes: u32, max_results: usize) {
        let refilter = min_free_bikes != self.params.min_free_bikes;
        self.params.min_free_bikes = min_free_bikes;
        self.params.max_results = max_results;
        if refilter {
            self.refilter();
        }
        debug!(min_free_bikes, max_results, refilter, "filter changed");
    }

    /// The user picked a sort column.
    ///
    /// Clicking the active column flips the direction and reverses the
    /// ordered list in place. Any other column becomes active in ascending
    /// order. Neither path re-filters or recomputes distances.
    pub fn on_sort_changed(&mut self, field: SortField) {
        if field == self.sort.field {
            self.sort.descending = !self.sort.descending;
            self.ordered.reverse();
        } else {
            self.sort = SortSpec::ascending(field);
            sort(&mut self.ordered, self.sort);
        }
        debug!(field = %self.sort.field, descending = self.sort.descending, "sort changed");
    }

    /// Ranked stations to display.
    pub fn result(&self) -> &[RankedStation] {
        let shown = self.params.max_results.min(self.ordered.len());
        &self.ordered[..shown]
    }

    pub fn params(&self) -> &RankingParameters {
        &self.params
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Number of stations passing the current filter, before the cap.
    pub fn matching(&self) -> usize {
        self.ordered.len()
    }

    /// Incremented every time distances are recomputed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn reannotate(&mut self) {
        self.annotated = annotate(&self.stations, self.params.reference);
        self.generation += 1;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.ordered = filter(&self.annotated, self.params.min_free_bikes);
        sort(&mut self.ordered, self.sort);
    }
}
