//! Matrix builder tests: cache-first lookups, degraded entries,
//! directionality.

mod fixtures;

use fixtures::{StubOracle, coord, dt, reference_nodes, site_node, start_node};
use inspection_planner::cache::RouteCache;
use inspection_planner::matrix::build_matrix;
use inspection_planner::model::Node;

fn all_pairs(nodes: &[Node]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for from in nodes {
        for to in nodes {
            pairs.push((from.id, to.id));
        }
    }
    pairs
}

#[test]
fn builder_fills_every_pair_and_the_diagonal() {
    let nodes = reference_nodes();
    let oracle = StubOracle::new(300.0);
    let mut cache = RouteCache::in_memory();

    let matrix = build_matrix(&nodes, dt("2026-08-10 09:00"), &oracle, &mut cache);

    assert_eq!(matrix.len(), 16);
    for (from, to) in all_pairs(&nodes) {
        if from == to {
            assert_eq!(matrix.duration(from, to), 0.0);
            assert!(matrix.leg(from, to).unwrap().path.is_empty());
        } else {
            assert_eq!(matrix.duration(from, to), 300.0);
        }
    }
    assert_eq!(oracle.calls(), 12);
}

#[test]
fn builder_stores_each_direction_independently() {
    let nodes = vec![start_node(127.0, 37.5), site_node(1, 127.1, 37.5, 60)];
    let oracle = StubOracle::new(100.0)
        .with_leg(&coord(127.0, 37.5), &coord(127.1, 37.5), 600.0)
        .with_leg(&coord(127.1, 37.5), &coord(127.0, 37.5), 900.0);
    let mut cache = RouteCache::in_memory();

    let matrix = build_matrix(&nodes, dt("2026-08-10 09:00"), &oracle, &mut cache);

    assert_eq!(matrix.duration(0, 1), 600.0);
    assert_eq!(matrix.duration(1, 0), 900.0);
}

#[test]
fn warm_cache_issues_no_oracle_calls() {
    let nodes = reference_nodes();
    let mut cache = RouteCache::in_memory();

    let first_oracle = StubOracle::new(300.0);
    let first = build_matrix(&nodes, dt("2026-08-10 09:00"), &first_oracle, &mut cache);
    assert_eq!(first_oracle.calls(), 12);

    let second_oracle = StubOracle::new(999.0);
    let second = build_matrix(&nodes, dt("2026-08-10 09:00"), &second_oracle, &mut cache);

    assert_eq!(second_oracle.calls(), 0, "warm cache must answer everything");
    for (from, to) in all_pairs(&nodes) {
        assert_eq!(first.duration(from, to), second.duration(from, to));
    }
}

#[test]
fn degraded_oracle_yields_zero_cost_entries() {
    let nodes = reference_nodes();
    let oracle = StubOracle::failing();
    let mut cache = RouteCache::in_memory();

    let matrix = build_matrix(&nodes, dt("2026-08-10 09:00"), &oracle, &mut cache);

    // The build completes; unknown legs read as zero cost with no path.
    assert_eq!(matrix.len(), 16);
    for (from, to) in all_pairs(&nodes) {
        assert_eq!(matrix.duration(from, to), 0.0);
        assert!(matrix.leg(from, to).unwrap().path.is_empty());
    }
}

#[test]
fn fresh_results_merge_into_the_cache() {
    let nodes = reference_nodes();
    let oracle = StubOracle::new(300.0);
    let mut cache = RouteCache::in_memory();
    assert!(cache.is_empty());

    build_matrix(&nodes, dt("2026-08-10 09:00"), &oracle, &mut cache);

    assert_eq!(cache.len(), 12);
    let leg = cache
        .get(&nodes[0].coord, &nodes[1].coord)
        .expect("fetched leg lands in the cache");
    assert_eq!(leg.duration_secs, 300.0);
}
