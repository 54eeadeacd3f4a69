//! # Search Form Input
//!
//! Validation for the values a user types before a search: the two coordinate
//! boxes, the result count and the minimum free bikes. Rejected keystrokes
//! leave the previous value in place, exactly like a text box that refuses the
//! character.
//!
//! The limits here are input-layer limits. The ranking engine accepts any
//! minimum bike count; only this form caps it below [`MAX_MIN_FREE_BIKES`].

use crate::config::InputConfig;
use crate::ranking::RankingParameters;
use crate::Coordinate;
use regex::Regex;

/// Largest number of stations a user may ask for.
pub const MAX_RESULTS_LIMIT: usize = 200;
/// Largest minimum-free-bikes value the form accepts.
pub const MAX_MIN_FREE_BIKES: u32 = 99;

/// Which coordinate box is being edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Accepts or rejects coordinate box contents.
#[derive(Debug, Clone)]
pub struct CoordinateRules {
    latitude_pattern: Regex,
    longitude_pattern: Regex,
    longitude_bound: f64,
    decimal_places: usize,
}

impl CoordinateRules {
    pub fn new(config: &InputConfig) -> Self {
        let pattern = |integer_digits: usize| {
            Regex::new(&format!(
                r"^-?\d{{1,{integer_digits}}}(\.\d{{0,{}}})?$",
                config.decimal_places
            ))
            .expect("coordinate pattern should be valid")
        };
        let (longitude_digits, longitude_bound) = if config.legacy_longitude_bounds {
            (2, 90.0)
        } else {
            (3, crate::MAX_LONGITUDE)
        };
        Self {
            latitude_pattern: pattern(2),
            longitude_pattern: pattern(longitude_digits),
            longitude_bound,
            decimal_places: config.decimal_places,
        }
    }

    /// Whether `text` may stand in the box for `axis`.
    ///
    /// Empty text and a lone minus sign are accepted as input in progress.
    pub fn accepts(&self, axis: Axis, text: &str) -> bool {
        if text.is_empty() || text == "-" {
            return true;
        }
        let (pattern, bound) = match axis {
            Axis::Latitude => (&self.latitude_pattern, crate::MAX_LATITUDE),
            Axis::Longitude => (&self.longitude_pattern, self.longitude_bound),
        };
        if !pattern.is_match(text) {
            return false;
        }
        text.parse::<f64>()
            .map(|value| value.abs() <= bound)
            .unwrap_or(false)
    }

    /// Format a value the way it is written back into a box.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimal_places, value)
    }
}

impl Default for CoordinateRules {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

/// Search button state, derived purely from the form values.
///
/// Enabled once a provider is chosen and both coordinate boxes hold a number.
pub fn can_search(provider: Option<&str>, latitude_text: &str, longitude_text: &str) -> bool {
    let is_number = |text: &str| text.parse::<f64>().map(f64::is_finite).unwrap_or(false);
    provider.is_some_and(|id| !id.is_empty())
        && is_number(latitude_text)
        && is_number(longitude_text)
}

/// Current contents of the search form.
#[derive(Debug, Clone)]
pub struct SearchForm {
    rules: CoordinateRules,
    provider: Option<String>,
    latitude_text: String,
    longitude_text: String,
    /// `None` while the box is cleared
    max_results: Option<usize>,
    /// `None` while the box is cleared
    min_free_bikes: Option<u32>,
}

impl SearchForm {
    pub fn new(rules: CoordinateRules) -> Self {
        Self {
            rules,
            provider: None,
            latitude_text: String::new(),
            longitude_text: String::new(),
            max_results: Some(crate::ranking::DEFAULT_MAX_RESULTS),
            min_free_bikes: Some(0),
        }
    }

    pub fn select_provider(&mut self, provider: Option<String>) {
        self.provider = provider.filter(|id| !id.is_empty());
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Whether `text` would be kept in the box for `axis`.
    pub fn accepts(&self, axis: Axis, text: &str) -> bool {
        self.rules.accepts(axis, text)
    }

    /// Try to replace a coordinate box. Returns whether the edit was kept.
    pub fn set_coordinate_text(&mut self, axis: Axis, text: &str) -> bool {
        if !self.rules.accepts(axis, text) {
            return false;
        }
        match axis {
            Axis::Latitude => self.latitude_text = text.to_string(),
            Axis::Longitude => self.longitude_text = text.to_string(),
        }
        true
    }

    pub fn coordinate_text(&self, axis: Axis) -> &str {
        match axis {
            Axis::Latitude => &self.latitude_text,
            Axis::Longitude => &self.longitude_text,
        }
    }

    /// Write a located position into both boxes, bypassing keystroke rules.
    pub fn fill_position(&mut self, position: Coordinate) {
        self.latitude_text = self.rules.format(position.latitude);
        self.longitude_text = self.rules.format(position.longitude);
    }

    /// Try to replace the result count. Returns whether the edit was kept.
    pub fn set_max_results(&mut self, text: &str) -> bool {
        match parse_count(text, MAX_RESULTS_LIMIT) {
            Some(value) => {
                self.max_results = value;
                true
            }
            None => false,
        }
    }

    /// Try to replace the minimum free bikes. Returns whether the edit was kept.
    pub fn set_min_free_bikes(&mut self, text: &str) -> bool {
        match parse_count(text, MAX_MIN_FREE_BIKES as usize) {
            Some(value) => {
                self.min_free_bikes = value.map(|v| v as u32);
                true
            }
            None => false,
        }
    }

    /// Result count; a cleared box shows nothing.
    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(0)
    }

    /// Minimum free bikes; a cleared box means no minimum.
    pub fn min_free_bikes(&self) -> u32 {
        self.min_free_bikes.unwrap_or(0)
    }

    pub fn can_search(&self) -> bool {
        can_search(self.provider(), &self.latitude_text, &self.longitude_text)
    }

    /// Reference point typed into the boxes, if both parse and are in range.
    pub fn reference(&self) -> Option<Coordinate> {
        let latitude = self.latitude_text.parse().ok()?;
        let longitude = self.longitude_text.parse().ok()?;
        Coordinate::new(latitude, longitude).ok()
    }

    /// Ranking parameters for the current form, if a reference is set.
    pub fn params(&self) -> Option<RankingParameters> {
        Some(RankingParameters {
            reference: self.reference()?,
            min_free_bikes: self.min_free_bikes(),
            max_results: self.max_results(),
        })
    }
}

/// `Some(None)` for a cleared box, `Some(Some(n))` for an accepted count,
/// `None` for a rejected edit.
fn parse_count(text: &str, limit: usize) -> Option<Option<usize>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    match text.parse::<usize>() {
        Ok(value) if value <= limit => Some(Some(value)),
        _ => None,
    }
}
