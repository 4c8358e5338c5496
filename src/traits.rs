//! Seams for the planner's external collaborators.
//!
//! The core consumes these as injected implementations so it stays
//! testable without a routing backend or an interactive console: a travel
//! oracle, an overtime decision policy, and a site disambiguation
//! resolver.

use chrono::NaiveDateTime;

use crate::catalog::Site;
use crate::model::{Coordinate, RouteLeg};

/// Directional travel-time and geometry oracle.
///
/// Identical origin and destination must answer `(0, [])` without an
/// external call. A `departure` hint makes the answer time-dependent when
/// the backend supports it. Failure is not surfaced: adapters degrade to
/// `RouteLeg::empty()` so optimization proceeds with partial data.
pub trait RouteOracle {
    fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        departure: Option<NaiveDateTime>,
    ) -> RouteLeg;
}

/// Outcome of an overtime decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvertimeDecision {
    /// Keep working; the projected times stand.
    Continue,
    /// Stop for the night; the next day begins at the given timestamp.
    Defer(NaiveDateTime),
}

/// Decides what happens when a projected finish exceeds the day's work
/// window. A CLI or GUI adapter supplies the interactive version; tests
/// script it.
pub trait OvertimePolicy {
    fn decide(
        &mut self,
        projected_finish: NaiveDateTime,
        day_deadline: NaiveDateTime,
    ) -> OvertimeDecision;
}

/// Picks one site when a catalog lookup matches several records.
/// Returning `None` surfaces as an ambiguity error to the caller.
pub trait SiteResolver {
    fn resolve<'a>(&mut self, name: &str, candidates: &'a [Site]) -> Option<&'a Site>;
}
