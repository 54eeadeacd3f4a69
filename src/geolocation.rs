//! Where is the user? The answer only ever feeds the reference coordinate.

use crate::config::LocationConfig;
use crate::{Coordinate, CoordinateError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LocationError {
    #[error("no location configured (add a [location] section to the config file)")]
    Unavailable,

    #[error("configured location is invalid: {0}")]
    Invalid(#[from] CoordinateError),
}

/// Something that can report the user's current position.
pub trait GeolocationSource {
    fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// A position fixed in configuration, for machines without a location service.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(Option<LocationConfig>);

impl FixedLocation {
    pub fn new(location: Option<LocationConfig>) -> Self {
        Self(location)
    }
}

impl GeolocationSource for FixedLocation {
    fn current_position(&self) -> Result<Coordinate, LocationError> {
        let location = self.0.ok_or(LocationError::Unavailable)?;
        Ok(Coordinate::new(location.latitude, location.longitude)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_location() {
        let source = FixedLocation::new(Some(LocationConfig {
            latitude: 51.5,
            longitude: -0.12,
        }));
        assert_eq!(
            source.current_position(),
            Ok(Coordinate::new(51.5, -0.12).unwrap())
        );
    }

    #[test]
    fn test_unconfigured_location() {
        assert_eq!(
            FixedLocation::new(None).current_position(),
            Err(LocationError::Unavailable)
        );
    }

    #[test]
    fn test_invalid_location() {
        let source = FixedLocation::new(Some(LocationConfig {
            latitude: 95.0,
            longitude: 0.0,
        }));
        assert_eq!(
            source.current_position(),
            Err(LocationError::Invalid(CoordinateError::Latitude(95.0)))
        );
    }
}
