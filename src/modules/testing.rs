//! Behaviors and helpers shared by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::modules::behavior::{Behavior, Color, Diet, Senses, Sight, Speed};
use crate::modules::config::WorldConfig;
use crate::modules::grid::Direction;

/// Always heads the same way.
#[derive(Clone, Copy)]
pub struct Marcher {
    pub direction: Direction,
    pub diet: Diet,
    pub speed: Speed,
    pub glyph: char,
}

impl Marcher {
    pub fn east() -> Self {
        Self {
            direction: Direction::East,
            diet: Diet::Plant,
            speed: Speed::Fast,
            glyph: 'e',
        }
    }
}

impl Behavior for Marcher {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        self.direction
    }

    fn diet(&self) -> Diet {
        self.diet
    }

    fn speed(&self) -> Speed {
        self.speed
    }

    fn glyph(&self) -> char {
        self.glyph
    }

    fn color(&self) -> Color {
        Color::BLUE
    }
}

/// Never moves; slow carnivore.
pub struct Stationary;

impl Behavior for Stationary {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        Direction::Center
    }

    fn diet(&self) -> Diet {
        Diet::Meat
    }

    fn speed(&self) -> Speed {
        Speed::Slow
    }

    fn glyph(&self) -> char {
        'o'
    }
}

/// Steps east only when another agent is standing there.
pub struct Seeker {
    pub glyph: char,
}

impl Behavior for Seeker {
    fn next_move(&mut self, senses: &Senses<'_>) -> Direction {
        match senses.peek(Direction::East) {
            Sight::Agent(_) => Direction::East,
            _ => Direction::Center,
        }
    }

    fn diet(&self) -> Diet {
        Diet::Meat
    }

    fn speed(&self) -> Speed {
        Speed::Medium
    }

    fn glyph(&self) -> char {
        self.glyph
    }
}

/// Plays back a fixed list of moves, then stays put.
pub struct Scripted {
    pub moves: VecDeque<Direction>,
    pub diet: Diet,
    pub speed: Speed,
    pub glyph: char,
}

impl Scripted {
    pub fn new(moves: &[Direction], diet: Diet, speed: Speed, glyph: char) -> Self {
        Self {
            moves: moves.iter().copied().collect(),
            diet,
            speed,
            glyph,
        }
    }
}

impl Behavior for Scripted {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        self.moves.pop_front().unwrap_or(Direction::Center)
    }

    fn diet(&self) -> Diet {
        self.diet
    }

    fn speed(&self) -> Speed {
        self.speed
    }

    fn glyph(&self) -> char {
        self.glyph
    }
}

/// Ends its own life on its first decision.
pub struct Quitter;

impl Behavior for Quitter {
    fn next_move(&mut self, senses: &Senses<'_>) -> Direction {
        senses.terminate();
        Direction::East
    }

    fn diet(&self) -> Diet {
        Diet::Plant
    }

    fn speed(&self) -> Speed {
        Speed::Medium
    }

    fn glyph(&self) -> char {
        'q'
    }
}

/// Panics whenever asked for a move or told about an outcome.
pub struct Faulty;

impl Behavior for Faulty {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        panic!("faulty behavior");
    }

    fn diet(&self) -> Diet {
        Diet::Meat
    }

    fn speed(&self) -> Speed {
        Speed::Fast
    }

    fn glyph(&self) -> char {
        '!'
    }

    fn on_win(&mut self, _senses: &Senses<'_>) {
        panic!("faulty win hook");
    }
}

pub type Journal = Rc<RefCell<Vec<String>>>;

/// Wraps another behavior and writes every notification to a shared journal.
pub struct Recorder<B> {
    pub inner: B,
    pub journal: Journal,
}

impl<B> Recorder<B> {
    fn note(&self, hook: &str) {
        self.journal.borrow_mut().push(hook.to_string());
    }
}

impl<B: Behavior> Behavior for Recorder<B> {
    fn next_move(&mut self, senses: &Senses<'_>) -> Direction {
        self.inner.next_move(senses)
    }

    fn diet(&self) -> Diet {
        self.inner.diet()
    }

    fn speed(&self) -> Speed {
        self.inner.speed()
    }

    fn glyph(&self) -> char {
        self.inner.glyph()
    }

    fn on_eat(&mut self, _senses: &Senses<'_>) {
        self.note("eat");
    }

    fn on_win(&mut self, _senses: &Senses<'_>) {
        self.note("win");
    }

    fn on_death(&mut self) {
        self.note("death");
    }

    fn on_mate(&mut self, peer: &dyn Behavior, _senses: &Senses<'_>) {
        self.note(&format!("mate:{}", peer.glyph()));
    }
}

/// Valid to construct, but panics when asked for its glyph.
pub struct Broken;

impl Behavior for Broken {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        Direction::Center
    }

    fn diet(&self) -> Diet {
        Diet::Plant
    }

    fn speed(&self) -> Speed {
        Speed::Slow
    }

    fn glyph(&self) -> char {
        panic!("no glyph");
    }
}

/// Slow grazer heading east that writes what it sees to the east, from
/// where it stands, each time it eats.
pub struct Watcher {
    pub journal: Journal,
}

impl Behavior for Watcher {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        Direction::East
    }

    fn diet(&self) -> Diet {
        Diet::Plant
    }

    fn speed(&self) -> Speed {
        Speed::Slow
    }

    fn glyph(&self) -> char {
        'w'
    }

    fn on_eat(&mut self, senses: &Senses<'_>) {
        self.journal.borrow_mut().push(format!(
            "ate at {} saw {:?}",
            senses.x(),
            senses.peek(Direction::East)
        ));
    }
}

/// Fast grazer heading east that quits as soon as it has eaten.
pub struct Sated;

impl Behavior for Sated {
    fn next_move(&mut self, _senses: &Senses<'_>) -> Direction {
        Direction::East
    }

    fn diet(&self) -> Diet {
        Diet::Plant
    }

    fn speed(&self) -> Speed {
        Speed::Fast
    }

    fn glyph(&self) -> char {
        's'
    }

    fn on_eat(&mut self, senses: &Senses<'_>) {
        senses.terminate();
    }
}

/// Small quiet world: no random food, no repopulation, generous hunger.
pub fn quiet_config(width: u32, height: u32, seed: u64) -> WorldConfig {
    WorldConfig {
        width,
        height,
        random_food_probability: 0,
        hunger_limit: 1_000,
        initial_population: 0,
        max_active_species: 8,
        initial_food_ratio: 0.0,
        repopulate: false,
        seed: Some(seed),
    }
}
