//! Shared test fixtures.
//!
//! Provides a programmable stub oracle (scripted durations, call
//! counting, departure recording), a scripted overtime policy, and small
//! builders for nodes and matrices, including the 4-node reference
//! instance used across the solver tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;

use inspection_planner::matrix::TravelMatrix;
use inspection_planner::model::{Coordinate, Node, NodeId, RouteLeg, ServiceKind};
use inspection_planner::traits::{OvertimeDecision, OvertimePolicy, RouteOracle};

pub fn coord(lon: f64, lat: f64) -> Coordinate {
    Coordinate::new(lon, lat)
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("valid test timestamp")
}

pub fn start_node(lon: f64, lat: f64) -> Node {
    Node::start("office", coord(lon, lat))
}

pub fn site_node(id: NodeId, lon: f64, lat: f64, service_minutes: i64) -> Node {
    Node::new(
        id,
        format!("site-{id}"),
        coord(lon, lat),
        service_minutes,
        ServiceKind::Regular,
    )
}

/// Matrix from explicit `(from, to, duration_secs)` rows, empty paths.
pub fn matrix_from(entries: &[(NodeId, NodeId, f64)]) -> TravelMatrix {
    let mut matrix = TravelMatrix::new();
    for &(from, to, secs) in entries {
        matrix.insert(from, to, RouteLeg::new(secs, Vec::new()));
    }
    matrix
}

/// The 4-node reference instance: start 0 and sites A=1, B=2, C=3.
/// Nearest neighbor from 0 yields `[0, 1, 2, 3]` with closed-loop cost
/// 40, already locally optimal.
pub fn reference_matrix() -> TravelMatrix {
    matrix_from(&[
        (0, 1, 10.0),
        (0, 2, 20.0),
        (0, 3, 15.0),
        (1, 2, 5.0),
        (1, 3, 25.0),
        (2, 3, 10.0),
        (2, 1, 5.0),
        (3, 1, 25.0),
        (3, 2, 10.0),
        (2, 0, 20.0),
        (3, 0, 15.0),
        (1, 0, 10.0),
    ])
}

pub fn reference_nodes() -> Vec<Node> {
    vec![
        start_node(127.0, 37.5),
        site_node(1, 127.1, 37.5, 60),
        site_node(2, 127.2, 37.5, 60),
        site_node(3, 127.3, 37.5, 60),
    ]
}

/// Oracle stub with scripted durations per coordinate pair.
///
/// Counts calls so cache idempotence is observable, and records departure
/// hints so time-dependent re-queries are observable. A failing stub
/// behaves like a degraded adapter and answers `(0, [])` for everything.
pub struct StubOracle {
    durations: HashMap<(String, String), f64>,
    default_duration: f64,
    fail: bool,
    calls: AtomicUsize,
    departures: Mutex<Vec<Option<NaiveDateTime>>>,
}

impl StubOracle {
    pub fn new(default_duration: f64) -> Self {
        Self {
            durations: HashMap::new(),
            default_duration,
            fail: false,
            calls: AtomicUsize::new(0),
            departures: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let mut stub = Self::new(0.0);
        stub.fail = true;
        stub
    }

    pub fn with_leg(mut self, from: &Coordinate, to: &Coordinate, secs: f64) -> Self {
        self.durations.insert((from.key(), to.key()), secs);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn departures(&self) -> Vec<Option<NaiveDateTime>> {
        self.departures.lock().unwrap().clone()
    }
}

impl RouteOracle for StubOracle {
    fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        departure: Option<NaiveDateTime>,
    ) -> RouteLeg {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.departures.lock().unwrap().push(departure);

        if origin.key() == destination.key() || self.fail {
            return RouteLeg::empty();
        }
        let secs = self
            .durations
            .get(&(origin.key(), destination.key()))
            .copied()
            .unwrap_or(self.default_duration);
        RouteLeg::new(secs, vec![*origin, *destination])
    }
}

/// Policy answering from a prerecorded script, in order. Panics when
/// consulted more often than scripted; records what it was shown.
pub struct ScriptedPolicy {
    decisions: VecDeque<OvertimeDecision>,
    pub seen: Vec<(NaiveDateTime, NaiveDateTime)>,
}

impl ScriptedPolicy {
    pub fn new(decisions: Vec<OvertimeDecision>) -> Self {
        Self {
            decisions: decisions.into(),
            seen: Vec::new(),
        }
    }

    /// For schedules that must never raise an overtime decision.
    pub fn unreachable() -> Self {
        Self::new(Vec::new())
    }
}

impl OvertimePolicy for ScriptedPolicy {
    fn decide(
        &mut self,
        projected_finish: NaiveDateTime,
        day_deadline: NaiveDateTime,
    ) -> OvertimeDecision {
        self.seen.push((projected_finish, day_deadline));
        self.decisions
            .pop_front()
            .expect("overtime policy consulted more often than scripted")
    }
}
