//! Directed travel-time matrix construction.
//!
//! The builder resolves every ordered node pair cache-first and fans the
//! misses out over a bounded worker pool, merging each answer back into
//! the matrix and the durable cache as it completes. Optimizers only read
//! a finished matrix; there is no partially-built view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::RouteCache;
use crate::model::{Coordinate, Node, NodeId, RouteLeg};
use crate::traits::RouteOracle;

/// Worker pool width for oracle fan-out.
const FETCH_WORKERS: usize = 8;

/// Complete directed cost matrix over a node set.
///
/// `(a, b)` and `(b, a)` are stored independently; travel times are not
/// symmetric. Missing entries read as `f64::INFINITY`, which keeps tours
/// over them well-defined but non-competitive.
#[derive(Debug, Clone, Default)]
pub struct TravelMatrix {
    legs: HashMap<(NodeId, NodeId), RouteLeg>,
}

impl TravelMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: NodeId, to: NodeId, leg: RouteLeg) {
        self.legs.insert((from, to), leg);
    }

    pub fn leg(&self, from: NodeId, to: NodeId) -> Option<&RouteLeg> {
        self.legs.get(&(from, to))
    }

    /// Duration in seconds, `f64::INFINITY` when the pair is unknown.
    pub fn duration(&self, from: NodeId, to: NodeId) -> f64 {
        self.legs
            .get(&(from, to))
            .map(|leg| leg.duration_secs)
            .unwrap_or(f64::INFINITY)
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

/// Builds the complete matrix for `nodes`, querying the oracle only for
/// pairs the cache cannot answer. The departure stamp applies to every
/// fresh query; the cache is persisted after a build that fetched
/// anything new.
pub fn build_matrix<O>(
    nodes: &[Node],
    departure: NaiveDateTime,
    oracle: &O,
    cache: &mut RouteCache,
) -> TravelMatrix
where
    O: RouteOracle + Sync,
{
    let mut matrix = TravelMatrix::new();
    let mut pending: Vec<(NodeId, NodeId, Coordinate, Coordinate)> = Vec::new();

    for from in nodes {
        for to in nodes {
            if from.id == to.id {
                matrix.insert(from.id, to.id, RouteLeg::empty());
                continue;
            }
            match cache.get(&from.coord, &to.coord) {
                Some(leg) => matrix.insert(from.id, to.id, leg.clone()),
                None => pending.push((from.id, to.id, from.coord, to.coord)),
            }
        }
    }

    let total = nodes.len() * nodes.len().saturating_sub(1);
    info!(
        cached = total - pending.len(),
        fresh = pending.len(),
        "travel matrix lookup split"
    );

    if pending.is_empty() {
        return matrix;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(FETCH_WORKERS)
        .build()
        .expect("failed to build route fetch pool");

    let dispatched = pending.len();
    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    pool.in_place_scope(|scope| {
        let completed = &completed;
        scope.spawn(move |_| {
            pending
                .into_par_iter()
                .for_each_with(tx, |tx, (from, to, origin, destination)| {
                    let leg = oracle.route(&origin, &destination, Some(departure));
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(done, dispatched, "route fetch completed");
                    let _ = tx.send((from, to, RouteCache::key(&origin, &destination), leg));
                });
        });

        // Sole writer: merge each result as it arrives.
        for (from, to, key, leg) in rx.iter() {
            cache.insert(key, leg.clone());
            matrix.insert(from, to, leg);
        }
    });

    if let Err(err) = cache.persist() {
        warn!(%err, "failed to persist route cache");
    }

    matrix
}
