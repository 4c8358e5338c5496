//! Field-inspection route planning core.
//!
//! Builds a travel-time matrix over inspection sites (concurrent,
//! cache-backed), pits two tour-optimization strategies against each
//! other, and simulates the winning order into a day-by-day itinerary
//! against a daily work limit with injected overnight decisions.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod kakao;
pub mod matrix;
pub mod model;
pub mod report;
pub mod schedule;
pub mod solver;
pub mod traits;
