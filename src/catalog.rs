//! Site catalog lookup.
//!
//! Records come from the data-preparation step's CSV. Lookup is exact
//! name first, substring second; multiple matches are settled by an
//! injected resolver so the core never prompts anyone.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::model::{Coordinate, Node, NodeId, ServiceKind};
use crate::traits::SiteResolver;

/// One catalog record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub address: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Minutes on site for a regular inspection.
    #[serde(rename = "inspection_basic")]
    pub regular_minutes: i64,
    /// Minutes on site for remedial work.
    #[serde(rename = "inspection_hard")]
    pub remedial_minutes: i64,
}

impl Site {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }

    /// Planner node for this site; `kind` selects the regular or remedial
    /// duration.
    pub fn node(&self, id: NodeId, kind: ServiceKind) -> Node {
        let minutes = match kind {
            ServiceKind::Remedial => self.remedial_minutes,
            _ => self.regular_minutes,
        };
        Node::new(id, self.name.clone(), self.coordinate(), minutes, kind)
    }

    /// Planner node with a caller-supplied flat duration (bulk mode:
    /// every site gets the same minutes).
    pub fn node_with_minutes(&self, id: NodeId, minutes: i64) -> Node {
        Node::new(
            id,
            self.name.clone(),
            self.coordinate(),
            minutes,
            ServiceKind::Regular,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: Vec<Site>,
}

impl SiteCatalog {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    /// Reads the catalog from a CSV file with the standard columns
    /// (`name, address, longitude, latitude, inspection_basic,
    /// inspection_hard`).
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut sites = Vec::new();
        for record in reader.deserialize() {
            sites.push(record?);
        }
        Ok(Self { sites })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Exact name matches first; if none, substring matches.
    pub fn search(&self, name: &str) -> Vec<&Site> {
        let exact: Vec<&Site> = self.sites.iter().filter(|site| site.name == name).collect();
        if !exact.is_empty() {
            return exact;
        }
        self.sites
            .iter()
            .filter(|site| site.name.contains(name))
            .collect()
    }

    /// Resolves a name to exactly one site, delegating multi-match
    /// disambiguation to the injected resolver.
    pub fn resolve(&self, name: &str, resolver: &mut dyn SiteResolver) -> Result<Site> {
        let matches = self.search(name);
        match matches.len() {
            0 => Err(PlannerError::SiteNotFound {
                name: name.to_string(),
            }),
            1 => Ok(matches[0].clone()),
            count => {
                let candidates: Vec<Site> = matches.into_iter().cloned().collect();
                resolver
                    .resolve(name, &candidates)
                    .cloned()
                    .ok_or(PlannerError::AmbiguousSite {
                        name: name.to_string(),
                        count,
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, address: &str) -> Site {
        Site {
            name: name.to_string(),
            address: address.to_string(),
            longitude: 127.0,
            latitude: 37.5,
            regular_minutes: 60,
            remedial_minutes: 120,
        }
    }

    fn catalog() -> SiteCatalog {
        SiteCatalog::new(vec![
            site("한강대교", "서울 용산구"),
            site("양화대교", "서울 마포구"),
            site("한강대교", "경기 구리시"),
        ])
    }

    struct PickFirst;

    impl SiteResolver for PickFirst {
        fn resolve<'a>(&mut self, _name: &str, candidates: &'a [Site]) -> Option<&'a Site> {
            candidates.first()
        }
    }

    struct Decline;

    impl SiteResolver for Decline {
        fn resolve<'a>(&mut self, _name: &str, _candidates: &'a [Site]) -> Option<&'a Site> {
            None
        }
    }

    #[test]
    fn exact_match_beats_substring() {
        let catalog = catalog();
        let matches = catalog.search("양화대교");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].address, "서울 마포구");
    }

    #[test]
    fn falls_back_to_substring() {
        let catalog = catalog();
        let matches = catalog.search("양화");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "양화대교");
    }

    #[test]
    fn unknown_name_is_not_found() {
        let catalog = catalog();
        let err = catalog.resolve("없는다리", &mut PickFirst).unwrap_err();
        assert!(matches!(err, PlannerError::SiteNotFound { .. }));
    }

    #[test]
    fn multiple_matches_go_through_the_resolver() {
        let catalog = catalog();
        let chosen = catalog.resolve("한강대교", &mut PickFirst).unwrap();
        assert_eq!(chosen.address, "서울 용산구");
    }

    #[test]
    fn declined_resolution_is_ambiguous() {
        let catalog = catalog();
        let err = catalog.resolve("한강대교", &mut Decline).unwrap_err();
        assert!(matches!(err, PlannerError::AmbiguousSite { count: 2, .. }));
    }

    #[test]
    fn node_kind_selects_duration() {
        let record = site("한강대교", "서울 용산구");
        assert_eq!(record.node(1, ServiceKind::Regular).service_minutes, 60);
        assert_eq!(record.node(1, ServiceKind::Remedial).service_minutes, 120);
        assert_eq!(record.node_with_minutes(1, 45).service_minutes, 45);
    }
}
