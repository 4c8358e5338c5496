//! Day-segmented itinerary simulation.
//!
//! Walks the winning tour in order, re-querying the oracle per leg with
//! the evolving current time as the departure hint, a deliberately
//! distinct cost source from the static matrix used for ranking. Whenever
//! a projected finish exceeds the day's work window, an injected policy
//! decides between working on and deferring to a new day.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PlannerError, Result};
use crate::model::{Coordinate, Node, NodeId, ServiceKind};
use crate::traits::{OvertimeDecision, OvertimePolicy, RouteOracle};

/// Simulation options. The default work limit mirrors the 8-hour field
/// day.
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    pub work_limit_hours: i64,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self { work_limit_hours: 8 }
    }
}

/// One row of the realized itinerary. Append-only; immutable once
/// written.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub order: usize,
    pub day: u32,
    pub date: NaiveDate,
    pub arrival: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub travel_minutes: i64,
    pub service_minutes: i64,
    pub kind: ServiceKind,
    pub name: String,
    pub coord: Coordinate,
}

/// Path geometry for one travelled leg, tagged with the day it was
/// driven.
#[derive(Debug, Clone, Serialize)]
pub struct DayLeg {
    pub day: u32,
    pub from: NodeId,
    pub to: NodeId,
    pub path: Vec<Coordinate>,
}

/// The realized schedule: ordered entries plus per-leg geometry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Itinerary {
    pub entries: Vec<ScheduleEntry>,
    pub legs: Vec<DayLeg>,
}

impl Itinerary {
    /// Calendar days the trip spans.
    pub fn total_days(&self) -> u32 {
        self.entries.last().map(|entry| entry.day).unwrap_or(0)
    }

    /// Overnight stays.
    pub fn nights(&self) -> u32 {
        self.total_days().saturating_sub(1)
    }
}

struct SimState {
    day: u32,
    day_start: NaiveDateTime,
    current: NaiveDateTime,
}

struct ScheduledLeg {
    travel_minutes: i64,
    arrival: NaiveDateTime,
    finish: NaiveDateTime,
    path: Vec<Coordinate>,
}

/// Simulates the realized itinerary for `tour` (index 0 must be the start
/// node) from the supplied start timestamp, then schedules the final leg
/// to `destination` under the same overtime rules. The return entry has
/// zero service and finish equal to arrival.
pub fn simulate<O, P>(
    tour: &[Node],
    destination: &Node,
    start_at: NaiveDateTime,
    oracle: &O,
    policy: &mut P,
    options: &ScheduleOptions,
) -> Result<Itinerary>
where
    O: RouteOracle,
    P: OvertimePolicy,
{
    let mut itinerary = Itinerary::default();
    let Some((start_node, stops)) = tour.split_first() else {
        return Ok(itinerary);
    };

    let mut state = SimState {
        day: 1,
        day_start: start_at,
        current: start_at,
    };
    itinerary.entries.push(ScheduleEntry {
        order: 0,
        day: 1,
        date: start_at.date(),
        arrival: start_at,
        finish: start_at,
        travel_minutes: 0,
        service_minutes: 0,
        kind: start_node.kind,
        name: start_node.name.clone(),
        coord: start_node.coord,
    });
    info!(day = 1, start = %start_at, "itinerary simulation started");

    let mut prev = start_node;
    for (offset, stop) in stops.iter().enumerate() {
        let leg = schedule_leg(
            &mut state,
            &prev.coord,
            &stop.coord,
            stop.service_minutes,
            oracle,
            policy,
            options,
        )?;
        itinerary.legs.push(DayLeg {
            day: state.day,
            from: prev.id,
            to: stop.id,
            path: leg.path,
        });
        itinerary.entries.push(ScheduleEntry {
            order: offset + 1,
            day: state.day,
            date: state.day_start.date(),
            arrival: leg.arrival,
            finish: leg.finish,
            travel_minutes: leg.travel_minutes,
            service_minutes: stop.service_minutes,
            kind: stop.kind,
            name: stop.name.clone(),
            coord: stop.coord,
        });
        state.current = leg.finish;
        prev = stop;
    }

    // Trailing leg to the destination; no on-site work there.
    let leg = schedule_leg(
        &mut state,
        &prev.coord,
        &destination.coord,
        0,
        oracle,
        policy,
        options,
    )?;
    itinerary.legs.push(DayLeg {
        day: state.day,
        from: prev.id,
        to: destination.id,
        path: leg.path,
    });
    itinerary.entries.push(ScheduleEntry {
        order: tour.len(),
        day: state.day,
        date: state.day_start.date(),
        arrival: leg.arrival,
        finish: leg.finish,
        travel_minutes: leg.travel_minutes,
        service_minutes: 0,
        kind: ServiceKind::Return,
        name: destination.name.clone(),
        coord: destination.coord,
    });

    info!(
        days = itinerary.total_days(),
        stops = stops.len(),
        "itinerary simulation finished"
    );
    Ok(itinerary)
}

/// Computes one leg against the current state, raising the overtime
/// decision point when the projected finish exceeds the day's window. A
/// deferral advances to the policy-supplied day start and recomputes the
/// leg against the new departure timestamp.
fn schedule_leg<O, P>(
    state: &mut SimState,
    from: &Coordinate,
    to: &Coordinate,
    service_minutes: i64,
    oracle: &O,
    policy: &mut P,
    options: &ScheduleOptions,
) -> Result<ScheduledLeg>
where
    O: RouteOracle,
    P: OvertimePolicy,
{
    let deadline = state.day_start + Duration::hours(options.work_limit_hours);
    let (mut travel_minutes, mut path) = fetch_leg(oracle, from, to, state.current);
    let mut arrival = state.current + Duration::minutes(travel_minutes);
    let mut finish = arrival + Duration::minutes(service_minutes);

    if finish > deadline {
        warn!(projected = %finish, deadline = %deadline, "projected finish exceeds the work window");
        match policy.decide(finish, deadline) {
            OvertimeDecision::Continue => {}
            OvertimeDecision::Defer(new_start) => {
                if new_start <= state.day_start {
                    return Err(PlannerError::StaleDayStart {
                        proposed: new_start,
                        day_start: state.day_start,
                    });
                }
                state.day += 1;
                state.day_start = new_start;
                state.current = new_start;
                info!(day = state.day, start = %new_start, "deferred to a new day");

                let (minutes, new_path) = fetch_leg(oracle, from, to, state.current);
                travel_minutes = minutes;
                path = new_path;
                arrival = state.current + Duration::minutes(travel_minutes);
                finish = arrival + Duration::minutes(service_minutes);
            }
        }
    }

    Ok(ScheduledLeg {
        travel_minutes,
        arrival,
        finish,
        path,
    })
}

/// Travel minutes are floored to whole minutes, matching the report
/// granularity.
fn fetch_leg<O: RouteOracle>(
    oracle: &O,
    from: &Coordinate,
    to: &Coordinate,
    departure: NaiveDateTime,
) -> (i64, Vec<Coordinate>) {
    let leg = oracle.route(from, to, Some(departure));
    ((leg.duration_secs as i64) / 60, leg.path)
}
