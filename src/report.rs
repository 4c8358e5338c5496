//! Serializable export bundle for external renderers.
//!
//! A renderer gets the ordered stop rows, per-leg geometry tagged with
//! its day, and the trip totals. Markers, colors, and page layout are its
//! own business.

use serde::Serialize;

use crate::model::{Coordinate, ServiceKind};
use crate::schedule::Itinerary;
use crate::solver::{Arbitration, StrategyRun};

#[derive(Debug, Clone, Serialize)]
pub struct StopRow {
    pub order: usize,
    pub name: String,
    pub day: u32,
    pub date: String,
    pub arrival: String,
    pub finish: String,
    pub travel_minutes: i64,
    pub service_minutes: i64,
    pub kind: ServiceKind,
    pub coord: Coordinate,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegPath {
    pub day: u32,
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub cost_minutes: i64,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryReport {
    pub winner: String,
    pub strategies: Vec<StrategyReport>,
    pub total_days: u32,
    pub nights: u32,
    pub stops: Vec<StopRow>,
    pub legs: Vec<LegPath>,
}

pub fn build_report(arbitration: &Arbitration, itinerary: &Itinerary) -> ItineraryReport {
    let stops = itinerary
        .entries
        .iter()
        .map(|entry| StopRow {
            order: entry.order,
            name: entry.name.clone(),
            day: entry.day,
            date: entry.date.format("%Y-%m-%d").to_string(),
            arrival: entry.arrival.format("%H:%M").to_string(),
            finish: entry.finish.format("%H:%M").to_string(),
            travel_minutes: entry.travel_minutes,
            service_minutes: entry.service_minutes,
            kind: entry.kind,
            coord: entry.coord,
        })
        .collect();

    let legs = itinerary
        .legs
        .iter()
        .map(|leg| LegPath {
            day: leg.day,
            path: leg.path.clone(),
        })
        .collect();

    let strategies = vec![
        strategy_report("deep search", &arbitration.deep_search),
        strategy_report("annealing", &arbitration.annealing),
    ];

    ItineraryReport {
        winner: arbitration.winner.label().to_string(),
        strategies,
        total_days: itinerary.total_days(),
        nights: itinerary.nights(),
        stops,
        legs,
    }
}

fn strategy_report(name: &str, run: &StrategyRun) -> StrategyReport {
    StrategyReport {
        name: name.to_string(),
        cost_minutes: (run.cost / 60.0) as i64,
        elapsed_ms: run.elapsed.as_millis(),
    }
}
