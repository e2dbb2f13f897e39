use rand::{rngs::SmallRng, SeedableRng};
use sea_battle::{Coord, Grid, GridError, ShotOutcome, FLEET, GRID_SIZE, TOTAL_SHIP_CELLS};

#[test]
fn single_cell_ship_sinks_with_one_shot() {
    let mut grid = Grid::new();
    assert!(grid.place(1, 0, 0, true));
    let report = grid.fire_at(0, 0).unwrap();
    assert_eq!(report.outcome, ShotOutcome::Sunk);
    assert!(report.ship.is_some());
    assert!(grid.all_sunk());
}

#[test]
fn sinking_marks_the_surrounding_cells() {
    let mut grid = Grid::new();
    assert!(grid.place(2, 3, 3, true));
    assert_eq!(grid.fire_at(3, 3).unwrap().outcome, ShotOutcome::Hit);
    let report = grid.fire_at(3, 4).unwrap();
    assert_eq!(report.outcome, ShotOutcome::Sunk);
    assert!(grid.mark_miss_halo(report.ship.unwrap()));

    for r in 2..=4 {
        for c in 2..=5 {
            let cell = grid.cell(r, c).unwrap();
            if r == 3 && (c == 3 || c == 4) {
                assert!(cell.is_hit(), "({}, {}) should be a hit", r, c);
            } else {
                assert!(cell.is_miss(), "({}, {}) should be a miss", r, c);
                assert!(cell.is_forced_miss());
            }
        }
    }
    assert!(!grid.cell(1, 3).unwrap().is_shot());
    assert!(!grid.cell(3, 6).unwrap().is_shot());
    assert_eq!(grid.ships()[0].hits(), 2);
}

#[test]
fn repeated_shot_changes_nothing() {
    let mut grid = Grid::new();
    assert!(grid.place(2, 0, 0, false));
    assert_eq!(grid.fire_at(0, 0).unwrap().outcome, ShotOutcome::Hit);
    let again = grid.fire_at(0, 0).unwrap();
    assert_eq!(again.outcome, ShotOutcome::AlreadyShot);
    assert_eq!(again.ship, None);
    assert_eq!(grid.ships()[0].hits(), 1);
}

#[test]
fn sunk_ship_cells_report_already_shot() {
    let mut grid = Grid::new();
    assert!(grid.place(2, 5, 5, true));
    grid.fire_at(5, 5).unwrap();
    assert_eq!(grid.fire_at(5, 6).unwrap().outcome, ShotOutcome::Sunk);
    for (r, c) in [(5, 5), (5, 6)] {
        assert_eq!(grid.fire_at(r, c).unwrap().outcome, ShotOutcome::AlreadyShot);
    }
    assert!(grid.ships()[0].is_sunk());
    assert_eq!(grid.ships()[0].hits(), 2);
}

#[test]
fn out_of_range_shot_is_an_error() {
    let mut grid = Grid::new();
    assert_eq!(
        grid.fire_at(GRID_SIZE, 0),
        Err(GridError::OutOfBounds { row: GRID_SIZE, col: 0 })
    );
    assert!(grid.cell(0, GRID_SIZE).is_err());
    assert_eq!(grid.available_targets().len(), GRID_SIZE * GRID_SIZE);
}

#[test]
fn ships_may_not_touch_even_diagonally() {
    let mut grid = Grid::new();
    assert!(grid.place(3, 0, 0, true));
    assert!(!grid.can_place(1, 1, 3, true));
    assert!(!grid.can_place(1, 0, 3, true));
    assert!(!grid.can_place(2, 1, 0, false));
    assert!(grid.can_place(1, 0, 4, true));
    assert!(grid.can_place(1, 2, 0, true));
    assert!(!grid.can_place(4, 0, 7, true));
    assert!(grid.can_place(3, 0, 7, true));
    assert!(!grid.can_place(2, 9, 0, false));
}

#[test]
fn halo_refuses_ships_of_another_grid() {
    let mut a = Grid::new();
    let mut b = Grid::new();
    assert!(a.place(1, 4, 4, true));
    assert!(b.place(1, 4, 4, true));
    let foreign = a.fire_at(4, 4).unwrap().ship.unwrap();
    b.fire_at(4, 4).unwrap();
    assert!(!b.mark_miss_halo(foreign));
    assert!(!b.cell(3, 3).unwrap().is_shot());
    assert!(a.mark_miss_halo(foreign));
}

#[test]
fn halo_requires_a_sunk_ship() {
    let mut grid = Grid::new();
    assert!(grid.place(3, 2, 2, false));
    let report = grid.fire_at(2, 2).unwrap();
    assert_eq!(report.outcome, ShotOutcome::Hit);
    assert!(!grid.mark_miss_halo(report.ship.unwrap()));
    assert!(!grid.cell(1, 1).unwrap().is_shot());
}

#[test]
fn random_fleet_matches_the_template() {
    let mut rng = SmallRng::seed_from_u64(42);
    let grid = Grid::with_random_fleet(&mut rng);
    let mut lengths: Vec<usize> = grid.ships().iter().map(|s| s.len()).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(lengths, FLEET);
    assert_eq!(grid.occupied().count_ones(), TOTAL_SHIP_CELLS);
    assert_eq!(grid.fleet_template(), &FLEET);
    assert!(!grid.all_sunk());
}

#[test]
fn reset_clears_shots_and_replaces_the_fleet() {
    let mut rng = SmallRng::seed_from_u64(5);
    let mut grid = Grid::with_random_fleet(&mut rng);
    for c in 0..GRID_SIZE {
        grid.fire_at(0, c).unwrap();
    }
    assert!(grid.reset_fleet(&mut rng));
    assert_eq!(grid.available_targets().len(), GRID_SIZE * GRID_SIZE);
    assert_eq!(grid.ships().len(), FLEET.len());
    assert!(grid.ships().iter().all(|s| s.hits() == 0));

    grid.clear_fleet();
    assert!(grid.ships().is_empty());
    assert!(grid.occupied().is_empty());
    assert!(!grid.all_sunk());
}

#[test]
fn available_targets_shrink_as_cells_are_shot() {
    let mut grid = Grid::new();
    grid.fire_at(4, 7).unwrap();
    let targets = grid.available_targets();
    assert_eq!(targets.len(), GRID_SIZE * GRID_SIZE - 1);
    assert!(!targets.contains(&Coord::new(4, 7)));
}

#[test]
fn virtual_grid_reveals_reported_sinkings() {
    let mut grid = Grid::new_virtual();
    let hit = grid
        .record_remote_outcome(4, 4, ShotOutcome::Hit, &[])
        .unwrap();
    assert_eq!(hit.outcome, ShotOutcome::Hit);
    assert!(grid.cell(4, 4).unwrap().is_hit());

    let sunk = grid
        .record_remote_outcome(4, 5, ShotOutcome::Sunk, &[Coord::new(4, 4), Coord::new(4, 5)])
        .unwrap();
    assert_eq!(sunk.outcome, ShotOutcome::Sunk);
    let ship = grid.ship(sunk.ship.unwrap()).unwrap();
    assert_eq!(ship.len(), 2);
    assert!(ship.is_sunk());

    assert!(grid.mark_miss_halo(sunk.ship.unwrap()));
    assert!(grid.cell(3, 3).unwrap().is_forced_miss());
    assert!(grid.cell(5, 6).unwrap().is_forced_miss());
    assert!(!grid.all_sunk());

    let again = grid
        .record_remote_outcome(4, 4, ShotOutcome::Miss, &[])
        .unwrap();
    assert_eq!(again.outcome, ShotOutcome::AlreadyShot);
}

#[test]
fn virtual_grid_is_sunk_once_every_ship_is_revealed() {
    let mut grid = Grid::new_virtual();
    let spots = [
        (0, 0), (0, 2), (0, 4), (0, 6), (0, 8),
        (2, 0), (2, 2), (2, 4), (2, 6), (2, 8),
    ];
    for (i, &(r, c)) in spots.iter().enumerate() {
        assert!(!grid.all_sunk(), "sunk after {} ships", i);
        grid.record_remote_outcome(r, c, ShotOutcome::Sunk, &[Coord::new(r, c)])
            .unwrap();
    }
    assert_eq!(grid.sunk_count(), FLEET.len());
    assert!(grid.all_sunk());
}
