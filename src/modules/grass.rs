use rand::Rng;
use rand::seq::SliceRandom;

use crate::modules::grid::{Direction, Grid, Position};

/// Seeds `cells` distinct random cells with one unit of food.
pub fn seed_initial<R: Rng>(grid: &mut Grid, cells: usize, rng: &mut R) {
    let mut positions: Vec<Position> = grid.positions().collect();
    positions.shuffle(rng);
    for pos in positions.into_iter().take(cells) {
        grid.set_food(pos, 1);
    }
}

/// One growth step over the whole field, in place.
///
/// A patch of intensity `v` spreads with probability `1 / v`, doubling one
/// neighboring patch, so dense patches grow slowly. A bare cell sprouts with
/// probability `1 / random_food_probability` (never when that is 0).
pub fn propagate<R: Rng>(grid: &mut Grid, random_food_probability: u32, rng: &mut R) {
    let positions: Vec<Position> = grid.positions().collect();
    for pos in positions {
        let intensity = grid.food(pos);
        if intensity > 0 {
            if rng.gen_range(0..intensity) == 0 {
                spread_from(grid, pos, rng);
            }
        } else if random_food_probability > 0 && rng.gen_range(0..random_food_probability) == 0 {
            grid.set_food(pos, 1);
        }
    }
}

fn spread_from<R: Rng>(grid: &mut Grid, pos: Position, rng: &mut R) {
    let candidates: Vec<Position> = Direction::CARDINAL
        .iter()
        .map(|dir| grid.neighbor(pos, *dir))
        .filter(|n| *n != pos && grid.has_food(*n))
        .collect();
    if let Some(target) = candidates.choose(rng).copied() {
        let doubled = grid.food(target).saturating_mul(2);
        grid.set_food(target, doubled);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn lone_patch_never_grows() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut grid = Grid::new(5, 5).unwrap();
        let pos = Position::new(2, 2);
        grid.set_food(pos, 1);

        for _ in 0..200 {
            propagate(&mut grid, 0, &mut rng);
            assert_eq!(grid.food(pos), 1);
            assert_eq!(grid.food_cells(), 1);
        }
    }

    #[test]
    fn unit_patch_doubles_its_neighbor() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set_food(Position::new(0, 0), 1);
        grid.set_food(Position::new(1, 0), 1);

        propagate(&mut grid, 0, &mut rng);

        // (0, 0) is visited first and always spreads at intensity 1.
        assert_eq!(grid.food(Position::new(1, 0)), 2);
        assert!(matches!(grid.food(Position::new(0, 0)), 1 | 2));
        assert_eq!(grid.food_cells(), 2);
    }

    #[test]
    fn certain_sprouting_fills_bare_cells() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = Grid::new(3, 3).unwrap();
        propagate(&mut grid, 1, &mut rng);
        assert_eq!(grid.food_cells(), 9);
    }

    #[test]
    fn disabled_sprouting_leaves_field_bare() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = Grid::new(3, 3).unwrap();
        for _ in 0..50 {
            propagate(&mut grid, 0, &mut rng);
        }
        assert_eq!(grid.food_cells(), 0);
    }

    #[test]
    fn initial_seeding_hits_distinct_cells() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut grid = Grid::new(10, 10).unwrap();
        seed_initial(&mut grid, 15, &mut rng);
        assert_eq!(grid.food_cells(), 15);
        assert!(grid.positions().all(|p| grid.food(p) <= 1));
    }

    #[test]
    fn doubling_saturates() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut grid = Grid::new(1, 2).unwrap();
        grid.set_food(Position::new(0, 0), 1);
        grid.set_food(Position::new(0, 1), u32::MAX);
        propagate(&mut grid, 0, &mut rng);
        assert_eq!(grid.food(Position::new(0, 1)), u32::MAX);
    }
}
