//! Property-based tests for the raft aggregate using proptest.
//!
//! Invariants checked across random operation sequences:
//! - Mass conservation: total mass always equals hull mass plus the
//!   effective mass of exactly the currently connected tiles
//! - No duplicate occupancy in the grid map
//! - Connection graph symmetry and the distance-2 cutoff
//! - Buoyancy stays finite and non-negative for arbitrary depths

use glam::Vec3;
use proptest::prelude::*;
use raftsim::{
    grid_distance, DamageCause, ForceAccumulator, HullBody, RaftBody, RaftParams, TileKind,
    WaveField, WaveSampleCache,
};

const GRID_RANGE: i32 = 4;

#[derive(Clone, Copy, Debug)]
enum Op {
    Add(TileKind, (i32, i32)),
    Remove((i32, i32)),
    Destroy((i32, i32)),
}

fn tile_kind() -> impl Strategy<Value = TileKind> {
    prop_oneof![
        Just(TileKind::Foundation),
        Just(TileKind::Floor),
        Just(TileKind::Sail),
        Just(TileKind::Mast),
        Just(TileKind::Storage),
    ]
}

fn grid_pos() -> impl Strategy<Value = (i32, i32)> {
    (-GRID_RANGE..=GRID_RANGE, -GRID_RANGE..=GRID_RANGE)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (tile_kind(), grid_pos()).prop_map(|(k, p)| Op::Add(k, p)),
        1 => grid_pos().prop_map(Op::Remove),
        1 => grid_pos().prop_map(Op::Destroy),
    ]
}

fn apply(raft: &mut RaftBody, body: &HullBody, op: Op) {
    match op {
        Op::Add(kind, pos) => {
            let _ = raft.add_tile(kind, pos);
        }
        Op::Remove(pos) => {
            if let Some(id) = raft.tile_at(pos) {
                raft.remove_tile(id);
            }
        }
        Op::Destroy(pos) => {
            if let Some(id) = raft.tile_at(pos) {
                raft.destroy_tile(body, id, DamageCause::Collision);
            }
        }
    }
}

proptest! {
    #[test]
    fn mass_conservation_over_random_topology_changes(ops in prop::collection::vec(op(), 1..80)) {
        let params = RaftParams::default();
        let mut raft = RaftBody::new(params);
        let body = HullBody::new(params.hull_mass);

        for op in ops {
            apply(&mut raft, &body, op);

            let expected: f32 = params.hull_mass
                + raft.connected_tiles().map(|(_, t)| t.effective_mass()).sum::<f32>();
            prop_assert!(
                (raft.total_mass() - expected).abs() < 1e-3,
                "mass drifted: {} vs {}", raft.total_mass(), expected
            );
        }
    }

    #[test]
    fn no_duplicate_occupancy(ops in prop::collection::vec(op(), 1..80)) {
        let params = RaftParams::default();
        let mut raft = RaftBody::new(params);
        let body = HullBody::new(params.hull_mass);

        for op in ops {
            apply(&mut raft, &body, op);

            // Grid map and pool agree, and every connected tile maps back
            // to itself through its grid position.
            prop_assert_eq!(raft.tile_count(), raft.connected_tiles().count());
            for (id, tile) in raft.connected_tiles() {
                prop_assert_eq!(raft.tile_at(tile.grid_pos), Some(id));
            }
        }
    }

    #[test]
    fn connection_graph_matches_pairwise_distances(ops in prop::collection::vec(op(), 1..40)) {
        let params = RaftParams::default();
        let mut raft = RaftBody::new(params);
        let body = HullBody::new(params.hull_mass);

        for op in ops {
            apply(&mut raft, &body, op);
        }

        let tiles: Vec<_> = raft.connected_tiles().map(|(id, t)| (id, t.grid_pos)).collect();
        let graph = raft.connection_graph();

        // Exactly one connection per qualifying unordered pair.
        let mut expected = 0usize;
        for (i, &(id_a, pos_a)) in tiles.iter().enumerate() {
            for &(id_b, pos_b) in &tiles[i + 1..] {
                let d = grid_distance(pos_a, pos_b);
                let count = graph
                    .connections()
                    .iter()
                    .filter(|c| {
                        (c.a == id_a && c.b == id_b) || (c.a == id_b && c.b == id_a)
                    })
                    .count();
                if d <= 2 {
                    expected += 1;
                    prop_assert_eq!(count, 1, "pair {:?}/{:?} at distance {}", pos_a, pos_b, d);
                    let conn = graph
                        .connections()
                        .iter()
                        .find(|c| (c.a == id_a && c.b == id_b) || (c.a == id_b && c.b == id_a))
                        .unwrap();
                    prop_assert!((conn.strength - 1.0 / (d + 1) as f32).abs() < 1e-6);
                } else {
                    prop_assert_eq!(count, 0);
                }
            }
        }
        prop_assert_eq!(graph.len(), expected);
    }

    #[test]
    fn buoyancy_is_finite_and_never_pulls_down(
        depth in -20.0f32..20.0,
        kind in tile_kind(),
        storm in 0.0f32..1.0,
    ) {
        let params = RaftParams::default();
        let mut raft = RaftBody::new(params);
        raft.add_tile(kind, (0, 0)).unwrap();

        let mut body = HullBody::new(raft.total_mass());
        body.position = Vec3::new(0.0, depth, 0.0);

        let mut field = WaveField::default();
        field.set_storm_intensity(storm);
        let mut cache = WaveSampleCache::new(params.wave_sample_hz);
        cache.refresh(&field, 3.25, &raft, &body);

        let mut acc = ForceAccumulator::default();
        raft.accumulate_buoyancy(&body, &cache, &mut acc);

        prop_assert!(acc.force.is_finite());
        prop_assert!(acc.torque.is_finite());
        prop_assert!(acc.force.y >= 0.0, "downward buoyancy: {:?}", acc.force);
    }
}
