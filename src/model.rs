//! Core domain types shared across the planner.

use serde::{Deserialize, Serialize};

/// Identifier of a routed node. Node 0 is always the fixed start location.
pub type NodeId = usize;

/// A WGS84 point. The routing API and the route cache use `lon,lat` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "lng", alias = "lon")]
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Stable `lon,lat` string used as cache-key component and API
    /// parameter.
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.lon, self.lat)
    }
}

/// What happens at a node once the crew arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Start,
    Regular,
    Remedial,
    Return,
}

/// A stop in the planning problem. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub coord: Coordinate,
    pub service_minutes: i64,
    pub kind: ServiceKind,
}

impl Node {
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        coord: Coordinate,
        service_minutes: i64,
        kind: ServiceKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            coord,
            service_minutes,
            kind,
        }
    }

    /// The fixed starting point, always node 0 with no on-site work.
    pub fn start(name: impl Into<String>, coord: Coordinate) -> Self {
        Self::new(0, name, coord, 0, ServiceKind::Start)
    }

    /// The final destination. Handled outside the travel matrix as a
    /// trailing leg.
    pub fn destination(id: NodeId, name: impl Into<String>, coord: Coordinate) -> Self {
        Self::new(id, name, coord, 0, ServiceKind::Return)
    }
}

/// One directed travel leg: duration plus path geometry.
///
/// `empty()` doubles as the degraded "unknown, treated as zero cost"
/// value returned when the routing backend cannot answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Travel time in seconds. The persisted cache historically called
    /// this field `time`, which is still accepted on read.
    #[serde(rename = "duration", alias = "time")]
    pub duration_secs: f64,
    #[serde(default)]
    pub path: Vec<Coordinate>,
}

impl RouteLeg {
    pub fn new(duration_secs: f64, path: Vec<Coordinate>) -> Self {
        Self {
            duration_secs,
            path,
        }
    }

    pub fn empty() -> Self {
        Self {
            duration_secs: 0.0,
            path: Vec::new(),
        }
    }
}
