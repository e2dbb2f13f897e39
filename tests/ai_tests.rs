use std::collections::HashSet;

use rand::{rngs::SmallRng, SeedableRng};
use sea_battle::{Coord, Grid, Orientation, ShotOutcome, Targeting, GRID_SIZE};

#[test]
fn two_hits_in_a_row_extend_only_along_the_row() {
    for seed in 0..32 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ai = Targeting::new();
        ai.handle_shot_result(Coord::new(5, 5), ShotOutcome::Hit, &[]);
        ai.handle_shot_result(Coord::new(5, 6), ShotOutcome::Hit, &[]);
        assert_eq!(ai.orientation(), Some(Orientation::Horizontal));
        let next = ai.choose_target(&mut rng);
        assert!(
            next == Coord::new(5, 4) || next == Coord::new(5, 7),
            "seed {} proposed {}",
            seed,
            next
        );
        assert!(ai.candidates().all(|c| c.row == 5));
    }
}

#[test]
fn sinking_forgets_the_hunt_and_rules_out_the_perimeter() {
    let mut ai = Targeting::new();
    ai.handle_shot_result(Coord::new(5, 5), ShotOutcome::Hit, &[]);
    ai.handle_shot_result(Coord::new(5, 6), ShotOutcome::Hit, &[]);
    let ship = [Coord::new(5, 5), Coord::new(5, 6), Coord::new(5, 7)];
    ai.handle_shot_result(Coord::new(5, 7), ShotOutcome::Sunk, &ship);

    assert!(!ai.is_targeting());
    assert!(ai.unresolved_hits().is_empty());
    assert_eq!(ai.candidates().count(), 0);
    for c in [Coord::new(4, 4), Coord::new(6, 8), Coord::new(5, 8), Coord::new(5, 4)] {
        assert!(ai.tried().contains(c), "{} should be ruled out", c);
    }
    assert!(!ai.tried().contains(Coord::new(3, 5)));
}

#[test]
fn hunt_never_repeats_a_coordinate() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut ai = Targeting::new();
    let mut seen = HashSet::new();
    for _ in 0..GRID_SIZE * GRID_SIZE {
        let c = ai.choose_target(&mut rng);
        assert!(seen.insert(c), "{} chosen twice", c);
        ai.handle_shot_result(c, ShotOutcome::Miss, &[]);
    }
    assert_eq!(ai.tried().count_ones(), GRID_SIZE * GRID_SIZE);
}

#[test]
fn sinks_a_whole_fleet_without_wasting_shots() {
    for seed in 0..8 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut grid = Grid::with_random_fleet(&mut rng);
        let mut ai = Targeting::new();
        let mut seen = HashSet::new();
        let mut shots = 0;
        while !grid.all_sunk() {
            let c = ai.choose_target(&mut rng);
            assert!(seen.insert(c), "seed {}: {} chosen twice", seed, c);
            let report = grid.fire_at(c.row, c.col).unwrap();
            assert_ne!(report.outcome, ShotOutcome::AlreadyShot);
            let cells = match (report.outcome, report.ship) {
                (ShotOutcome::Sunk, Some(ship)) => grid.ship(ship).unwrap().cells().to_vec(),
                _ => Vec::new(),
            };
            ai.handle_shot_result(c, report.outcome, &cells);
            shots += 1;
            assert!(shots <= GRID_SIZE * GRID_SIZE);
        }
        assert!(!ai.is_targeting());
    }
}

#[test]
fn reset_clears_all_memory() {
    let mut ai = Targeting::new();
    ai.handle_shot_result(Coord::new(1, 1), ShotOutcome::Hit, &[]);
    ai.reset();
    assert_eq!(ai, Targeting::new());
}
