//! The contract between the engine and the decision logic bound to each agent.
//!
//! A [`Behavior`] is consulted once per tick for a move and told about the
//! outcomes that concern it. It never touches engine state directly; the
//! only thing it may change is its own agent's fate, through
//! [`Senses::terminate`].

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::warn;

use crate::modules::agent::{Agent, AgentId};
use crate::modules::grid::{Direction, Grid, Position};

/// Glyph reported for a cell holding food.
pub const FOOD_GLYPH: char = '"';
/// Glyph reported for a bare, unoccupied cell.
pub const EMPTY_GLYPH: char = ' ';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Plant,
    Meat,
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diet::Plant => write!(f, "plant"),
            Diet::Meat => write!(f, "meat"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Fast,
    Medium,
    Slow,
}

impl Speed {
    /// Resolution order within a tick.
    pub const PRIORITY: [Speed; 3] = [Speed::Fast, Speed::Medium, Speed::Slow];

    const fn rank(self) -> u8 {
        match self {
            Speed::Fast => 2,
            Speed::Medium => 1,
            Speed::Slow => 0,
        }
    }

    /// `Greater` when `self` is faster than `other`.
    pub fn race(self, other: Speed) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speed::Fast => write!(f, "fast"),
            Speed::Medium => write!(f, "medium"),
            Speed::Slow => write!(f, "slow"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// What an agent sees when it peeks at a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sight {
    Agent(char),
    Food,
    Empty,
}

impl Sight {
    pub const fn glyph(self) -> char {
        match self {
            Sight::Agent(glyph) => glyph,
            Sight::Food => FOOD_GLYPH,
            Sight::Empty => EMPTY_GLYPH,
        }
    }

    pub(crate) fn at(grid: &Grid, agents: &SlotMap<AgentId, Agent>, pos: Position) -> Self {
        if let Some(agent) = grid.occupant(pos).and_then(|id| agents.get(id)) {
            Sight::Agent(agent.glyph())
        } else if grid.has_food(pos) {
            Sight::Food
        } else {
            Sight::Empty
        }
    }
}

/// Decision logic for one species.
///
/// Only the move, diet, speed and glyph are required; the notification
/// hooks default to doing nothing.
pub trait Behavior {
    fn next_move(&mut self, senses: &Senses<'_>) -> Direction;

    fn diet(&self) -> Diet;

    fn speed(&self) -> Speed;

    /// Single character drawn on the board.
    fn glyph(&self) -> char;

    fn color(&self) -> Color {
        Color::GRAY
    }

    /// The hooks below that take [`Senses`] fire mid-tick, so their view
    /// already reflects every move resolved before them.
    fn on_eat(&mut self, _senses: &Senses<'_>) {}

    fn on_win(&mut self, _senses: &Senses<'_>) {}

    fn on_death(&mut self) {}

    /// Called on both parents after a successful mating.
    fn on_mate(&mut self, _peer: &dyn Behavior, _senses: &Senses<'_>) {}
}

/// Read-only view of the world from one agent's cell.
///
/// Built on demand against the live board, so peeks see every move already
/// applied when the view is consulted.
pub struct Senses<'a> {
    agent: &'a Agent,
    grid: &'a Grid,
    agents: &'a SlotMap<AgentId, Agent>,
    tick: u64,
    terminated: Cell<bool>,
}

impl<'a> Senses<'a> {
    pub(crate) fn new(
        agent: &'a Agent,
        grid: &'a Grid,
        agents: &'a SlotMap<AgentId, Agent>,
        tick: u64,
    ) -> Self {
        Self {
            agent,
            grid,
            agents,
            tick,
            terminated: Cell::new(false),
        }
    }

    pub fn x(&self) -> u32 {
        self.agent.position().x
    }

    pub fn y(&self) -> u32 {
        self.agent.position().y
    }

    pub fn position(&self) -> Position {
        self.agent.position()
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn hunger(&self) -> u32 {
        self.agent.hunger()
    }

    pub fn has_mated(&self) -> bool {
        self.agent.has_mated()
    }

    /// False once the agent has died, including right after [`terminate`](Self::terminate)
    /// even though the engine removes the agent only when the callback returns.
    pub fn is_alive(&self) -> bool {
        self.agent.is_alive() && !self.terminated.get()
    }

    pub fn peek(&self, direction: Direction) -> Sight {
        let pos = self.grid.neighbor(self.agent.position(), direction);
        Sight::at(self.grid, self.agents, pos)
    }

    /// Ends this agent's life as soon as the current call returns.
    pub fn terminate(&self) {
        self.terminated.set(true);
    }

    pub(crate) fn terminated(&self) -> bool {
        self.terminated.get()
    }
}

/// Runs a behavior callback, turning a panic into `None` so one faulty
/// species cannot halt the world. `subject` is the agent or species the
/// callback belongs to.
pub(crate) fn guarded<T>(
    subject: impl fmt::Debug,
    hook: &'static str,
    call: impl FnOnce() -> T,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(?subject, hook, "behavior panicked; fault isolated");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faster_speed_wins_the_race() {
        assert_eq!(Speed::Fast.race(Speed::Slow), Ordering::Greater);
        assert_eq!(Speed::Medium.race(Speed::Fast), Ordering::Less);
        assert_eq!(Speed::Slow.race(Speed::Slow), Ordering::Equal);
        assert_eq!(Speed::PRIORITY[0], Speed::Fast);
    }

    #[test]
    fn sight_glyphs() {
        assert_eq!(Sight::Agent('x').glyph(), 'x');
        assert_eq!(Sight::Food.glyph(), FOOD_GLYPH);
        assert_eq!(Sight::Empty.glyph(), EMPTY_GLYPH);
    }

    #[test]
    fn guarded_swallows_panics() {
        let id = AgentId::default();
        assert_eq!(guarded(id, "ok", || 7), Some(7));
        let failed: Option<u8> = guarded(id, "boom", || panic!("behavior fault"));
        assert!(failed.is_none());
    }

    #[test]
    fn senses_read_the_live_board() {
        use crate::modules::agent::Profile;
        use crate::modules::species::SpeciesId;

        let profile = Profile {
            glyph: 'k',
            color: Color::GRAY,
            diet: Diet::Plant,
            speed: Speed::Slow,
        };
        let mut grid = Grid::new(4, 3).unwrap();
        let mut agents = SlotMap::with_key();
        let mut agent = Agent::new(SpeciesId::new(0), Position::new(0, 1), 2, profile);
        agent.starve();
        agent.starve();
        agent.mark_mated();
        let id = agents.insert(agent);
        grid.set_occupant(Position::new(0, 1), Some(id));
        grid.set_food(Position::new(0, 0), 1);

        let senses = Senses::new(&agents[id], &grid, &agents, 7);
        assert_eq!((senses.x(), senses.y()), (0, 1));
        assert_eq!(senses.position(), Position::new(0, 1));
        assert_eq!((senses.width(), senses.height()), (4, 3));
        assert_eq!(senses.tick(), 7);
        assert_eq!(senses.hunger(), 2);
        assert!(senses.has_mated());
        assert_eq!(senses.peek(Direction::Center), Sight::Agent('k'));
        assert_eq!(senses.peek(Direction::North), Sight::Food);
        assert_eq!(senses.peek(Direction::West), Sight::Empty);

        assert!(senses.is_alive());
        assert!(!senses.terminated());
        senses.terminate();
        assert!(senses.terminated());
        assert!(!senses.is_alive());
    }
}
