//! Kakao mobility / local API adapter.
//!
//! Directions: `GET {navi}/v1/directions`, time-dependent when a
//! `departure_time` hint is supplied; the server rejects hints it cannot
//! honor, in which case the request is retried once without it.
//! Address search: `GET {local}/v2/local/search/address.json`.

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::model::{Coordinate, RouteLeg};
use crate::traits::RouteOracle;

/// Kakao departure stamps are minute-resolution, `YYYYMMDDHHMM`.
const DEPARTURE_FORMAT: &str = "%Y%m%d%H%M";

#[derive(Debug, Clone)]
pub struct KakaoConfig {
    /// REST API key, sent as `Authorization: KakaoAK {key}`.
    pub rest_key: String,
    pub navi_base_url: String,
    pub local_base_url: String,
    pub timeout_secs: u64,
}

impl Default for KakaoConfig {
    fn default() -> Self {
        Self {
            rest_key: String::new(),
            navi_base_url: "https://apis-navi.kakaomobility.com".to_string(),
            local_base_url: "https://dapi.kakao.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl KakaoConfig {
    pub fn new(rest_key: impl Into<String>) -> Self {
        Self {
            rest_key: rest_key.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct KakaoClient {
    config: KakaoConfig,
    client: reqwest::blocking::Client,
}

impl KakaoClient {
    pub fn new(config: KakaoConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Resolves an address to a coordinate via the first matching
    /// document. Any failure surfaces as `GeocodeFailed`.
    pub fn geocode(&self, address: &str) -> Result<Coordinate> {
        let url = format!("{}/v2/local/search/address.json", self.config.local_base_url);
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("KakaoAK {}", self.config.rest_key))
            .query(&[("query", address)])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<AddressSearchResponse>());

        match response {
            Ok(body) => body
                .documents
                .into_iter()
                .next()
                .and_then(|doc| doc.coordinate())
                .ok_or_else(|| PlannerError::GeocodeFailed {
                    address: address.to_string(),
                }),
            Err(err) => {
                warn!(%err, address, "address search failed");
                Err(PlannerError::GeocodeFailed {
                    address: address.to_string(),
                })
            }
        }
    }

    fn directions(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        departure: Option<&str>,
    ) -> std::result::Result<DirectionsResponse, reqwest::Error> {
        let url = format!("{}/v1/directions", self.config.navi_base_url);
        let mut params = vec![
            ("origin", origin.key()),
            ("destination", destination.key()),
            ("priority", "RECOMMEND".to_string()),
            ("car_type", "1".to_string()),
        ];
        if let Some(stamp) = departure {
            params.push(("departure_time", stamp.to_string()));
        }

        self.client
            .get(url)
            .header("Authorization", format!("KakaoAK {}", self.config.rest_key))
            .query(&params)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<DirectionsResponse>())
    }
}

impl RouteOracle for KakaoClient {
    fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        departure: Option<NaiveDateTime>,
    ) -> RouteLeg {
        if origin.key() == destination.key() {
            return RouteLeg::empty();
        }

        let stamp = departure.map(|dt| dt.format(DEPARTURE_FORMAT).to_string());
        let mut outcome = self.directions(origin, destination, stamp.as_deref());

        // The server rejects departure hints outside its forecast window;
        // retry once without the hint before giving up.
        if stamp.is_some() && matches!(&outcome, Err(err) if err.is_status()) {
            debug!(from = %origin.key(), to = %destination.key(), "departure hint rejected, retrying without it");
            outcome = self.directions(origin, destination, None);
        }

        match outcome {
            Ok(body) => match body.into_leg() {
                Some(leg) => leg,
                None => {
                    warn!(from = %origin.key(), to = %destination.key(), "no route in response, using zero-cost leg");
                    RouteLeg::empty()
                }
            },
            Err(err) => {
                warn!(%err, from = %origin.key(), to = %destination.key(), "directions failed, using zero-cost leg");
                RouteLeg::empty()
            }
        }
    }
}

// Kakao API response types.

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

impl DirectionsResponse {
    /// First route's duration plus its road vertexes flattened into one
    /// path, in section order.
    fn into_leg(self) -> Option<RouteLeg> {
        let route = self.routes.into_iter().next()?;
        let mut path = Vec::new();
        for section in route.sections {
            for road in section.roads {
                for pair in road.vertexes.chunks_exact(2) {
                    path.push(Coordinate::new(pair[0], pair[1]));
                }
            }
        }
        Some(RouteLeg::new(route.summary.duration, path))
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: RouteSummary,
    #[serde(default)]
    sections: Vec<RouteSection>,
}

#[derive(Debug, Deserialize)]
struct RouteSummary {
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct RouteSection {
    #[serde(default)]
    roads: Vec<RoadSegment>,
}

#[derive(Debug, Deserialize)]
struct RoadSegment {
    /// Flat `lon,lat,lon,lat,…` vertex list.
    #[serde(default)]
    vertexes: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct AddressSearchResponse {
    #[serde(default)]
    documents: Vec<AddressDocument>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    x: String,
    y: String,
}

impl AddressDocument {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.x.parse().ok()?, self.y.parse().ok()?))
    }
}
