use serde::{Deserialize, Serialize};

use crate::modules::agent::AgentId;
use crate::modules::error::ConfigError;

/// Food stacked on a single cell; 0 means the cell is bare.
pub type Intensity = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
    Center,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Center,
    ];

    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Center => "center",
        }
    }
}

/// `(n + 1) mod k` for `n` in `[0, k)`.
pub const fn wrap_increment(n: u32, k: u32) -> u32 {
    if n + 1 >= k { 0 } else { n + 1 }
}

/// `(n - 1) mod k` for `n` in `[0, k)`, wrapping 0 to `k - 1`.
pub const fn wrap_decrement(n: u32, k: u32) -> u32 {
    if n == 0 { k - 1 } else { n - 1 }
}

/// Fixed-size toroidal plane holding agent occupancy and the food field.
///
/// North decreases `y`, east increases `x`.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    occupancy: Vec<Option<AgentId>>,
    food: Vec<Intensity>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroDimension { width, height });
        }
        let cells = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            occupancy: vec![None; cells],
            food: vec![0; cells],
        })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    #[inline]
    fn offset(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "position {pos:?} outside grid");
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    pub fn occupant(&self, pos: Position) -> Option<AgentId> {
        self.occupancy[self.offset(pos)]
    }

    pub fn set_occupant(&mut self, pos: Position, agent: Option<AgentId>) {
        let idx = self.offset(pos);
        self.occupancy[idx] = agent;
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.occupant(pos).is_none()
    }

    pub fn food(&self, pos: Position) -> Intensity {
        self.food[self.offset(pos)]
    }

    pub fn set_food(&mut self, pos: Position, intensity: Intensity) {
        let idx = self.offset(pos);
        self.food[idx] = intensity;
    }

    /// Clears the cell's food, returning what was there.
    pub fn take_food(&mut self, pos: Position) -> Intensity {
        let idx = self.offset(pos);
        std::mem::take(&mut self.food[idx])
    }

    pub fn has_food(&self, pos: Position) -> bool {
        self.food(pos) > 0
    }

    pub fn food_cells(&self) -> usize {
        self.food.iter().filter(|v| **v > 0).count()
    }

    pub fn neighbor(&self, pos: Position, direction: Direction) -> Position {
        match direction {
            Direction::North => Position::new(pos.x, wrap_decrement(pos.y, self.height)),
            Direction::East => Position::new(wrap_increment(pos.x, self.width), pos.y),
            Direction::South => Position::new(pos.x, wrap_increment(pos.y, self.height)),
            Direction::West => Position::new(wrap_decrement(pos.x, self.width), pos.y),
            Direction::Center => pos,
        }
    }

    /// Every cell, column by column (`x` outer, `y` inner).
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let (width, height) = (self.width, self.height);
        (0..width).flat_map(move |x| (0..height).map(move |y| Position::new(x, y)))
    }

    pub fn empty_positions(&self) -> Vec<Position> {
        self.positions().filter(|p| self.is_empty(*p)).collect()
    }
}
