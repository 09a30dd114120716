use slotmap::new_key_type;

use crate::modules::behavior::{Behavior, Color, Diet, Speed};
use crate::modules::grid::Position;
use crate::modules::species::SpeciesId;

new_key_type! {
    /// Generational handle into the world's agent arena. Two agents are the
    /// same agent only when their handles are equal.
    pub struct AgentId;
}

/// The parts of a behavior the engine reads while resolving a tick.
///
/// Cached on the agent so the board can be inspected while a behavior is
/// borrowed mutably; refreshed after every call into the behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    pub glyph: char,
    pub color: Color,
    pub diet: Diet,
    pub speed: Speed,
}

impl Profile {
    pub fn of(behavior: &dyn Behavior) -> Self {
        Self {
            glyph: behavior.glyph(),
            color: behavior.color(),
            diet: behavior.diet(),
            speed: behavior.speed(),
        }
    }
}

/// Lifecycle state of one critter. `alive` only ever goes from true to
/// false, and `has_mated` only from false to true.
#[derive(Debug)]
pub struct Agent {
    position: Position,
    species: SpeciesId,
    hunger: u32,
    has_mated: bool,
    alive: bool,
    born: u64,
    profile: Profile,
}

impl Agent {
    pub(crate) fn new(species: SpeciesId, position: Position, born: u64, profile: Profile) -> Self {
        Self {
            position,
            species,
            hunger: 0,
            has_mated: false,
            alive: true,
            born,
            profile,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn species(&self) -> SpeciesId {
        self.species
    }

    pub fn hunger(&self) -> u32 {
        self.hunger
    }

    pub fn has_mated(&self) -> bool {
        self.has_mated
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Tick count at the moment this agent was spawned.
    pub fn born(&self) -> u64 {
        self.born
    }

    pub fn glyph(&self) -> char {
        self.profile.glyph
    }

    pub fn color(&self) -> Color {
        self.profile.color
    }

    pub fn diet(&self) -> Diet {
        self.profile.diet
    }

    pub fn speed(&self) -> Speed {
        self.profile.speed
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub(crate) fn refresh(&mut self, profile: Profile) {
        self.profile = profile;
    }

    pub(crate) fn move_to(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn eat(&mut self) {
        self.hunger = 0;
    }

    pub(crate) fn starve(&mut self) {
        self.hunger = self.hunger.saturating_add(1);
    }

    pub(crate) fn has_starved(&self, hunger_limit: u32) -> bool {
        self.hunger >= hunger_limit
    }

    pub(crate) fn mark_mated(&mut self) {
        self.has_mated = true;
    }

    /// Marks the agent dead; returns false if it already was.
    pub(crate) fn kill(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    pub(crate) fn can_mate_with(&self, other: &Agent) -> bool {
        self.species == other.species && !self.has_mated && !other.has_mated
    }
}
