//! Durable cache of fetched route legs.
//!
//! Keys are `"originCoord|destCoord"` strings; values are the last-fetched
//! leg for that ordered pair. Entries survive across runs and are never
//! invalidated by time of day, so the cache is an approximation store
//! rather than a time series. The matrix builder is its sole writer during
//! a build.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;
use crate::model::{Coordinate, RouteLeg};

#[derive(Debug, Default)]
pub struct RouteCache {
    path: Option<PathBuf>,
    entries: HashMap<String, RouteLeg>,
}

impl RouteCache {
    /// Cache backed by a JSON file. A missing or unreadable file starts
    /// the cache empty rather than failing the run.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), %err, "route cache unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    /// Cache with no backing file (tests, one-shot runs).
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn key(origin: &Coordinate, destination: &Coordinate) -> String {
        format!("{}|{}", origin.key(), destination.key())
    }

    pub fn get(&self, origin: &Coordinate, destination: &Coordinate) -> Option<&RouteLeg> {
        self.entries.get(&Self::key(origin, destination))
    }

    /// Last-writer-wins per key.
    pub fn insert(&mut self, key: String, leg: RouteLeg) {
        self.entries.insert(key, leg);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the cache back to its backing file. A no-op for in-memory
    /// caches.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
