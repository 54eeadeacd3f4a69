//! # CityBikes Provider Data
//!
//! This module handles all network operations against the CityBikes v2 API:
//! the list of bike-share providers and the live station list of one provider.
//!
//! ## Data Source
//! - **Providers**: `GET {base_url}/networks`
//! - **Stations**: `GET {base_url}/networks/{id}`
//! - **Format**: JSON
//!
//! ## Caching Strategy
//! The provider list changes rarely, so it is cached on disk with a TTL
//! (default 60 minutes). A stale, missing or corrupt cache falls back to a
//! fresh fetch, and a failed cache write is ignored.
//!
//! Station lists are live availability and are never cached: every search
//! fetches them again and the result replaces the previous list outright.
//!
//! ## Error Handling
//! All failures surface as [`ProviderError`]. There is no retry; the caller
//! decides whether to show the error and keep the previous list.

use crate::config::ApiConfig;
use crate::{Coordinate, Provider, Station, StationList};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while talking to the provider API.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON shape we expect
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Cache file operations failed (missing, stale, permissions)
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// Client for the CityBikes API.
#[derive(Debug, Clone)]
pub struct CityBikesClient {
    http: reqwest::Client,
    base_url: String,
    cache_path: PathBuf,
    cache_ttl: Duration,
}

impl CityBikesClient {
    pub fn new(api: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            cache_path: PathBuf::from(&api.cache_path),
            cache_ttl: Duration::from_secs(api.provider_cache_ttl_minutes.saturating_mul(60)),
        }
    }

    /// All providers, sorted by name and then city.
    ///
    /// Served from the cache file while it is fresh.
    pub async fn providers(&self) -> Result<Vec<Provider>, ProviderError> {
        match load_cache(&self.cache_path, self.cache_ttl) {
            Ok(providers) => {
                debug!(count = providers.len(), "provider list served from cache");
                return Ok(providers);
            }
            Err(e) => debug!(error = %e, "provider cache unusable"),
        }

        let url = format!("{}/networks", self.base_url);
        let body = self.get(&url).await?;
        let providers = parse_providers(&body)?;
        info!(count = providers.len(), "fetched provider list");

        if let Err(e) = save_cache(&self.cache_path, &providers) {
            warn!(error = %e, path = %self.cache_path.display(), "could not write provider cache");
        }

        Ok(providers)
    }

    /// Live station list of one provider.
    pub async fn stations(&self, provider_id: &str) -> Result<StationList, ProviderError> {
        let url = format!("{}/networks/{}", self.base_url, provider_id);
        let body = self.get(&url).await?;
        let list = parse_stations(&body)?;
        info!(
            provider = provider_id,
            count = list.stations.len(),
            city = %list.city,
            "fetched stations"
        );
        Ok(list)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        debug!(url, "GET");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

// -- Wire format --

#[derive(Deserialize)]
struct NetworksResponse {
    networks: Vec<WireNetwork>,
}

#[derive(Deserialize)]
struct WireNetwork {
    id: String,
    name: String,
    #[serde(default)]
    location: WireLocation,
}

#[derive(Deserialize, Default)]
struct WireLocation {
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct NetworkResponse {
    network: WireNetworkDetail,
}

#[derive(Deserialize)]
struct WireNetworkDetail {
    #[serde(default)]
    location: WireLocation,
    #[serde(default)]
    stations: Vec<WireStation>,
}

#[derive(Deserialize)]
struct WireStation {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
    /// Some providers report null while a dock is offline
    free_bikes: Option<u32>,
    timestamp: String,
}

/// Decode a `/networks` response body into a sorted provider list.
pub fn parse_providers(body: &[u8]) -> Result<Vec<Provider>, ProviderError> {
    let response: NetworksResponse = serde_json::from_slice(body)?;
    let mut providers: Vec<Provider> = response
        .networks
        .into_iter()
        .map(|n| Provider {
            id: n.id,
            name: n.name,
            city: n.location.city,
            country: n.location.country,
        })
        .collect();
    sort_providers(&mut providers);
    Ok(providers)
}

/// Decode a `/networks/{id}` response body.
///
/// Stations with out-of-range coordinates or an unreadable timestamp are
/// dropped with a warning rather than failing the whole list.
pub fn parse_stations(body: &[u8]) -> Result<StationList, ProviderError> {
    let response: NetworkResponse = serde_json::from_slice(body)?;
    let network = response.network;

    let mut stations = Vec::with_capacity(network.stations.len());
    for wire in network.stations {
        let coordinate = match Coordinate::new(wire.latitude, wire.longitude) {
            Ok(c) => c,
            Err(e) => {
                warn!(station = %wire.id, error = %e, "skipping station");
                continue;
            }
        };
        let Some(last_updated) = parse_timestamp(&wire.timestamp) else {
            warn!(station = %wire.id, timestamp = %wire.timestamp, "skipping station with bad timestamp");
            continue;
        };
        stations.push(Station {
            id: wire.id,
            name: wire.name,
            coordinate,
            free_bikes: wire.free_bikes.unwrap_or(0),
            last_updated,
        });
    }

    Ok(StationList {
        city: network.location.city,
        stations,
    })
}

/// Order providers by name, then city, ignoring case.
pub fn sort_providers(providers: &mut [Provider]) {
    providers.sort_by(|a, b| {
        compare_ignoring_case(&a.name, &b.name)
            .then_with(|| compare_ignoring_case(&a.city, &b.city))
    });
}

fn compare_ignoring_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// CityBikes timestamps are RFC 3339, but some feeds omit the offset.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// -- Cache --

/// Load the provider list from `path` if it is younger than `ttl`.
fn load_cache(path: &Path, ttl: Duration) -> Result<Vec<Provider>, ProviderError> {
    let meta = fs::metadata(path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?;

    if age > ttl {
        return Err(io::Error::other("stale").into());
    }

    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn save_cache(path: &Path, providers: &[Provider]) -> Result<(), ProviderError> {
    let data = serde_json::to_vec(providers)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const NETWORKS: &str = r#"{
        "networks": [
            {"id": "velib", "name": "Vélib' Métropole", "location": {"city": "Paris", "country": "FR", "latitude": 48.85, "longitude": 2.35}},
            {"id": "santander-cycles", "name": "Santander Cycles", "location": {"city": "London", "country": "GB", "latitude": 51.5, "longitude": -0.12}},
            {"id": "santander-milton-keynes", "name": "santander cycles", "location": {"city": "Milton Keynes", "country": "GB"}},
            {"id": "bicing", "name": "Bicing", "location": {"city": "Barcelona", "country": "ES"}}
        ]
    }"#;

    const NETWORK: &str = r#"{
        "network": {
            "id": "santander-cycles",
            "name": "Santander Cycles",
            "location": {"city": "London", "country": "GB", "latitude": 51.5, "longitude": -0.12},
            "stations": [
                {"id": "a1", "name": "River Street", "latitude": 51.5292, "longitude": -0.1099, "free_bikes": 7, "empty_slots": 12, "timestamp": "2024-05-01T10:00:00.123000Z"},
                {"id": "a2", "name": "Phillimore Gardens", "latitude": 51.4996, "longitude": -0.1975, "free_bikes": null, "empty_slots": 30, "timestamp": "2024-05-01T10:05:00.000000"},
                {"id": "bad", "name": "Nowhere", "latitude": 123.0, "longitude": 0.0, "free_bikes": 1, "empty_slots": 0, "timestamp": "2024-05-01T10:00:00Z"},
                {"id": "late", "name": "Sometime", "latitude": 51.5, "longitude": 0.0, "free_bikes": 1, "empty_slots": 0, "timestamp": "yesterday"}
            ]
        }
    }"#;

    fn provider(id: &str) -> Provider {
        Provider {
            id: id.to_string(),
            name: id.to_string(),
            city: "City".to_string(),
            country: "GB".to_string(),
        }
    }

    #[test]
    fn test_providers_sorted_by_name_then_city() {
        let providers = parse_providers(NETWORKS.as_bytes()).unwrap();
        let ids: Vec<_> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            ["bicing", "santander-cycles", "santander-milton-keynes", "velib"]
        );
        assert_eq!(providers[1].city, "London");
        assert_eq!(providers[1].country, "GB");
    }

    #[test]
    fn test_parse_stations() {
        let list = parse_stations(NETWORK.as_bytes()).unwrap();
        assert_eq!(list.city, "London");
        assert_eq!(list.stations.len(), 2);

        let river = &list.stations[0];
        assert_eq!(river.id, "a1");
        assert_eq!(river.free_bikes, 7);
        assert_eq!(river.coordinate.latitude, 51.5292);
        assert_eq!(river.last_updated.to_rfc3339(), "2024-05-01T10:00:00.123+00:00");

        let phillimore = &list.stations[1];
        assert_eq!(phillimore.free_bikes, 0);
        assert_eq!(phillimore.last_updated.to_rfc3339(), "2024-05-01T10:05:00+00:00");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_stations(b"not json"),
            Err(ProviderError::Decode(_))
        ));
        assert!(matches!(
            parse_providers(br#"{"nets": []}"#),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_network_is_not_an_error() {
        let list = parse_stations(br#"{"network": {"id": "x", "name": "X"}}"#).unwrap();
        assert!(list.stations.is_empty());
        assert_eq!(list.city, "");
    }

    #[test]
    fn test_cache_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let providers = vec![provider("b"), provider("a")];

        save_cache(temp_file.path(), &providers).unwrap();
        let loaded = load_cache(temp_file.path(), Duration::from_secs(3600)).unwrap();

        assert_eq!(loaded, providers);
    }

    #[test]
    fn test_stale_cache_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        save_cache(temp_file.path(), &[provider("a")]).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(load_cache(temp_file.path(), Duration::ZERO).is_err());
    }

    #[test]
    fn test_corrupt_or_missing_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), b"{ not a list").unwrap();
        assert!(matches!(
            load_cache(temp_file.path(), Duration::from_secs(3600)),
            Err(ProviderError::Decode(_))
        ));
        assert!(matches!(
            load_cache(Path::new("/nonexistent/cache.json"), Duration::from_secs(3600)),
            Err(ProviderError::Cache(_))
        ));
    }

    #[test]
    fn test_client_trims_base_url() {
        let api = ApiConfig {
            base_url: "http://localhost:9000/v2/".to_string(),
            ..ApiConfig::default()
        };
        let client = CityBikesClient::new(&api);
        assert_eq!(client.base_url, "http://localhost:9000/v2");
        assert_eq!(client.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_huge_cache_ttl_saturates() {
        let api = ApiConfig {
            provider_cache_ttl_minutes: u64::MAX,
            ..ApiConfig::default()
        };
        let client = CityBikesClient::new(&api);
        assert_eq!(client.cache_ttl, Duration::from_secs(u64::MAX));
    }
}
