use std::cmp::Ordering;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, info, trace};

use crate::modules::agent::{Agent, AgentId, Profile};
use crate::modules::behavior::{Behavior, Color, Diet, Senses, Sight, Speed, guarded};
use crate::modules::config::WorldConfig;
use crate::modules::error::WorldError;
use crate::modules::grass;
use crate::modules::grid::{Direction, Grid, Intensity, Position};
use crate::modules::species::{SpeciesCatalog, SpeciesId, SpeciesRegistry};
use crate::modules::stats::PopulationStats;
use crate::modules::view::{AgentSnapshot, SpeciesCount, WorldSnapshot};

/// Glyph used for bare cells in the text rendering.
pub const BOARD_EMPTY_GLYPH: char = '.';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathReason {
    Starvation,
    Fight,
    SelfTermination,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    TickStarted {
        tick: u64,
    },
    TickCompleted {
        tick: u64,
    },
    AgentSpawned {
        agent_id: AgentId,
        species: SpeciesId,
        position: Position,
    },
    AgentMoved {
        agent_id: AgentId,
        from: Position,
        to: Position,
    },
    AgentAte {
        agent_id: AgentId,
        species: SpeciesId,
    },
    AgentsMated {
        parent_a: AgentId,
        parent_b: AgentId,
        child_id: AgentId,
        species: SpeciesId,
    },
    FightResolved {
        winner: AgentId,
        winner_species: SpeciesId,
        loser: AgentId,
        loser_species: SpeciesId,
        position: Position,
    },
    AgentDied {
        agent_id: AgentId,
        species: SpeciesId,
        reason: DeathReason,
    },
    SpeciesActivated {
        species: SpeciesId,
    },
    SpeciesExtinct {
        species: SpeciesId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    pub tick: u64,
    pub events: Vec<Event>,
}

/// The whole simulation: board, critters, species bookkeeping and the
/// shared random source. Everything mutates inside [`World::step`].
pub struct World {
    config: WorldConfig,
    tick: u64,
    rng: StdRng,
    grid: Grid,
    agents: SlotMap<AgentId, Agent>,
    behaviors: SecondaryMap<AgentId, Box<dyn Behavior>>,
    /// Live agents in resolution order.
    order: Vec<AgentId>,
    catalog: SpeciesCatalog,
    registry: SpeciesRegistry,
    events: Vec<Event>,
    stats: PopulationStats,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("agent_count", &self.order.len())
            .field("active_species", &self.registry.active_len())
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl World {
    /// Builds a world, seeds its food and activates the first species.
    pub fn new(config: WorldConfig, catalog: SpeciesCatalog) -> Result<Self, WorldError> {
        let mut world = Self::empty(config, catalog)?;
        let food_cells = world.config.initial_food_cells();
        grass::seed_initial(&mut world.grid, food_cells, &mut world.rng);

        let mut events = Vec::new();
        world.populate(&mut events);
        world.stats.record(&events);
        world.events = events;

        info!(
            width = world.config.width,
            height = world.config.height,
            species = world.registry.active_len(),
            agents = world.order.len(),
            food_cells,
            "world created"
        );
        Ok(world)
    }

    /// A validated world with no food and no active species.
    pub fn empty(config: WorldConfig, catalog: SpeciesCatalog) -> Result<Self, WorldError> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(WorldError::EmptyCatalog);
        }
        for kind in catalog.ids() {
            if catalog.instantiate(kind).is_none() {
                let name = catalog.name(kind).unwrap_or_default();
                return Err(WorldError::InvalidSpecies(name.to_string()));
            }
        }
        let grid = Grid::new(config.width, config.height)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let registry = SpeciesRegistry::new(catalog.ids(), config.max_active_species);

        Ok(Self {
            config,
            tick: 0,
            rng,
            grid,
            agents: SlotMap::with_key(),
            behaviors: SecondaryMap::new(),
            order: Vec::new(),
            catalog,
            registry,
            events: Vec::new(),
            stats: PopulationStats::default(),
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &PopulationStats {
        &self.stats
    }

    /// Events of the most recent tick (or of construction, before any tick).
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Live agents in resolution order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent)> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(*id).map(|agent| (*id, agent)))
    }

    pub fn agent_count(&self) -> usize {
        self.order.len()
    }

    pub fn species_name(&self, species: SpeciesId) -> &str {
        self.catalog.name(species).unwrap_or("?")
    }

    /// Active species with their live counts, by name.
    pub fn species_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .registry
            .active()
            .map(|(species, count)| (self.species_name(species), count))
            .collect();
        counts.sort();
        counts
    }

    pub fn is_repopulating(&self) -> bool {
        self.config.repopulate
    }

    pub fn set_repopulating(&mut self, repopulate: bool) {
        self.config.repopulate = repopulate;
    }

    pub fn sight_at(&self, pos: Position) -> Sight {
        Sight::at(&self.grid, &self.agents, pos)
    }

    pub fn glyph_at(&self, pos: Position) -> char {
        self.sight_at(pos).glyph()
    }

    /// Display color of a cell; `None` for a bare, empty cell.
    pub fn color_at(&self, pos: Position) -> Option<Color> {
        match self.grid.occupant(pos).and_then(|id| self.agents.get(id)) {
            Some(agent) => Some(agent.color()),
            None if self.grid.has_food(pos) => Some(Color::GREEN),
            None => None,
        }
    }

    /// Drops one member of `species` onto `position`, activating the
    /// species if needed (without spawning its initial population).
    pub fn place_agent(&mut self, species: &str, position: Position) -> Result<AgentId, WorldError> {
        let kind = self
            .catalog
            .find(species)
            .ok_or_else(|| WorldError::UnknownSpecies(species.to_string()))?;
        if !self.grid.contains(position) {
            return Err(WorldError::OutOfBounds(position));
        }
        if !self.grid.is_empty(position) {
            return Err(WorldError::Occupied(position));
        }
        let (behavior, profile) = self
            .catalog
            .instantiate(kind)
            .ok_or_else(|| WorldError::InvalidSpecies(species.to_string()))?;
        if !self.registry.is_active(kind) && !self.registry.activate(kind) {
            return Err(WorldError::SpeciesLimit(species.to_string()));
        }
        let id = self.insert_agent(kind, position, behavior, profile);
        self.order.push(id);
        Ok(id)
    }

    pub fn set_food(&mut self, position: Position, intensity: Intensity) -> Result<(), WorldError> {
        if !self.grid.contains(position) {
            return Err(WorldError::OutOfBounds(position));
        }
        self.grid.set_food(position, intensity);
        Ok(())
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let species = self
            .species_counts()
            .into_iter()
            .map(|(name, live)| SpeciesCount {
                name: name.to_string(),
                live,
            })
            .collect();

        let mut agents: Vec<AgentSnapshot> = self
            .agents()
            .map(|(_, agent)| AgentSnapshot {
                position: agent.position(),
                species: self.species_name(agent.species()).to_string(),
                glyph: agent.glyph(),
                hunger: agent.hunger(),
                has_mated: agent.has_mated(),
                born: agent.born(),
            })
            .collect();
        agents.sort_by_key(|a| (a.position.y, a.position.x));

        WorldSnapshot {
            tick: self.tick,
            width: self.grid.width(),
            height: self.grid.height(),
            repopulating: self.config.repopulate,
            food_cells: self.grid.food_cells(),
            species,
            agents,
        }
    }

    /// True when every live agent sits on the cell the grid says it does.
    pub fn occupancy_consistent(&self) -> bool {
        let mut seen = 0usize;
        for id in &self.order {
            let Some(agent) = self.agents.get(*id) else {
                return false;
            };
            if !agent.is_alive() || self.grid.occupant(agent.position()) != Some(*id) {
                return false;
            }
            seen += 1;
        }
        seen == self.agents.len()
    }

    /// Advances the world by one tick.
    pub fn step(&mut self) -> TickResult {
        let tick = self.tick + 1;
        trace!(tick, agents = self.order.len(), "tick started");
        let mut events = vec![Event::TickStarted { tick }];

        let mut intents = self.collect_intents(&mut events);
        for speed in Speed::PRIORITY {
            self.resolve_speed_class(speed, &mut intents, &mut events);
        }
        self.clear_the_dead();
        self.rotate_species(&mut events);
        grass::propagate(
            &mut self.grid,
            self.config.random_food_probability,
            &mut self.rng,
        );

        self.tick = tick;
        events.push(Event::TickCompleted { tick });
        self.stats.record(&events);
        self.events = events.clone();
        trace!(tick, agents = self.order.len(), "tick completed");

        TickResult { tick, events }
    }

    fn collect_intents(&mut self, events: &mut Vec<Event>) -> SecondaryMap<AgentId, Position> {
        let mut intents = SecondaryMap::new();
        for idx in 0..self.order.len() {
            let id = self.order[idx];
            let Some((direction, terminated)) = self.consult(id) else {
                continue;
            };
            self.refresh_profile(id);
            if terminated {
                self.kill(id, DeathReason::SelfTermination, events);
                continue;
            }
            if let Some(agent) = self.agents.get(id) {
                intents.insert(id, self.grid.neighbor(agent.position(), direction));
            }
        }
        intents
    }

    /// Asks a live agent's behavior for its move; a panic counts as Center.
    fn consult(&mut self, id: AgentId) -> Option<(Direction, bool)> {
        let agent = self.agents.get(id).filter(|agent| agent.is_alive())?;
        let behavior = self.behaviors.get_mut(id)?;
        let senses = Senses::new(agent, &self.grid, &self.agents, self.tick);
        let direction =
            guarded(id, "next_move", || behavior.next_move(&senses)).unwrap_or(Direction::Center);
        Some((direction, senses.terminated()))
    }

    /// One pass over the agent list for a single speed class. Offspring are
    /// inserted right after their parent and the cursor steps past them.
    fn resolve_speed_class(
        &mut self,
        speed: Speed,
        intents: &mut SecondaryMap<AgentId, Position>,
        events: &mut Vec<Event>,
    ) {
        let mut cursor = 0;
        while cursor < self.order.len() {
            let id = self.order[cursor];
            cursor += 1;

            let Some(agent) = self.agents.get(id) else {
                continue;
            };
            if !agent.is_alive() || agent.speed() != speed {
                continue;
            }
            let Some(target) = intents.remove(id) else {
                continue;
            };

            if let Some(child) = self.resolve(id, target, events) {
                self.order.insert(cursor, child);
                cursor += 1;
            }
        }
    }

    fn resolve(&mut self, id: AgentId, target: Position, events: &mut Vec<Event>) -> Option<AgentId> {
        let origin = self.agents.get(id)?.position();
        let mut ate = false;
        let mut child = None;

        match self.grid.occupant(target) {
            None => {
                self.move_agent(id, target, events);
                let grazes = self.agents.get(id).is_some_and(|a| a.diet() == Diet::Plant);
                if grazes && self.grid.has_food(target) {
                    self.grid.take_food(target);
                    ate = true;
                }
            }
            Some(other) if other == id => {}
            Some(other) => {
                let mover = self.agents.get(id)?;
                let occupant = self.agents.get(other)?;
                if !occupant.is_alive() {
                    trace!(agent = ?id, ?target, "blocked by a body awaiting cleanup");
                } else if mover.can_mate_with(occupant) {
                    child = self.mate(id, other, origin, target, events);
                } else {
                    ate = self.fight(id, other, target, events);
                }
            }
        }

        if ate {
            self.feed(id, events);
        } else if let Some(agent) = self.agents.get_mut(id) {
            agent.starve();
        }

        let starved = self
            .agents
            .get(id)
            .is_some_and(|a| a.is_alive() && a.has_starved(self.config.hunger_limit));
        if starved {
            self.kill(id, DeathReason::Starvation, events);
        }

        child
    }

    fn move_agent(&mut self, id: AgentId, to: Position, events: &mut Vec<Event>) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        let from = agent.position();
        agent.move_to(to);
        if self.grid.occupant(from) == Some(id) {
            self.grid.set_occupant(from, None);
        }
        self.grid.set_occupant(to, Some(id));
        events.push(Event::AgentMoved {
            agent_id: id,
            from,
            to,
        });
    }

    /// Resolves a fight started by `mover`; returns whether the mover ate.
    fn fight(&mut self, mover: AgentId, defender: AgentId, target: Position, events: &mut Vec<Event>) -> bool {
        let (Some(a), Some(b)) = (self.agents.get(mover), self.agents.get(defender)) else {
            return false;
        };
        let mover_wins = match a.speed().race(b.speed()) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.rng.gen_bool(0.5),
        };
        let (winner, loser) = if mover_wins {
            (mover, defender)
        } else {
            (defender, mover)
        };
        let (Some(winner_species), Some(loser_species)) = (
            self.agents.get(winner).map(Agent::species),
            self.agents.get(loser).map(Agent::species),
        ) else {
            return false;
        };

        debug!(?winner, ?loser, ?target, mover_wins, "fight resolved");
        events.push(Event::FightResolved {
            winner,
            winner_species,
            loser,
            loser_species,
            position: target,
        });

        self.kill(loser, DeathReason::Fight, events);
        if mover_wins {
            self.move_agent(mover, target, events);
        }
        self.notify(winner, "on_win", events, |b, senses| b.on_win(senses));

        let carnivore = self.agents.get(winner).is_some_and(|a| a.diet() == Diet::Meat);
        if mover_wins {
            carnivore
        } else {
            if carnivore {
                self.feed(defender, events);
            }
            false
        }
    }

    /// Places an offspring next to the mover (or else next to its mate).
    /// Without room nothing happens.
    fn mate(
        &mut self,
        parent_a: AgentId,
        parent_b: AgentId,
        origin: Position,
        target: Position,
        events: &mut Vec<Event>,
    ) -> Option<AgentId> {
        let Some(spot) = self
            .random_empty_adjacent(origin)
            .or_else(|| self.random_empty_adjacent(target))
        else {
            trace!(?parent_a, ?parent_b, "no room for offspring");
            return None;
        };
        let species = self.agents.get(parent_a)?.species();
        let child_id = self.spawn_agent(species, spot)?;
        events.push(Event::AgentSpawned {
            agent_id: child_id,
            species,
            position: spot,
        });

        for parent in [parent_a, parent_b] {
            if let Some(agent) = self.agents.get_mut(parent) {
                agent.mark_mated();
            }
        }

        debug!(?parent_a, ?parent_b, ?child_id, species = self.species_name(species), "agents mated");
        events.push(Event::AgentsMated {
            parent_a,
            parent_b,
            child_id,
            species,
        });
        self.notify_mates(parent_a, parent_b, events);
        Some(child_id)
    }

    fn random_empty_adjacent(&mut self, pos: Position) -> Option<Position> {
        let candidates: Vec<Position> = Direction::ALL
            .iter()
            .map(|dir| self.grid.neighbor(pos, *dir))
            .filter(|p| self.grid.is_empty(*p))
            .collect();
        candidates.choose(&mut self.rng).copied()
    }

    /// Births one agent; `None` (and nothing changes) if the species
    /// cannot be instantiated.
    fn spawn_agent(&mut self, species: SpeciesId, position: Position) -> Option<AgentId> {
        let Some((behavior, profile)) = self.catalog.instantiate(species) else {
            debug!(species = self.species_name(species), ?position, "birth skipped");
            return None;
        };
        Some(self.insert_agent(species, position, behavior, profile))
    }

    fn insert_agent(
        &mut self,
        species: SpeciesId,
        position: Position,
        behavior: Box<dyn Behavior>,
        profile: Profile,
    ) -> AgentId {
        let id = self
            .agents
            .insert(Agent::new(species, position, self.tick, profile));
        self.behaviors.insert(id, behavior);
        self.grid.set_occupant(position, Some(id));
        self.registry.record_birth(species);
        id
    }

    fn feed(&mut self, id: AgentId, events: &mut Vec<Event>) {
        let Some(agent) = self.agents.get_mut(id).filter(|a| a.is_alive()) else {
            return;
        };
        agent.eat();
        let species = agent.species();
        events.push(Event::AgentAte {
            agent_id: id,
            species,
        });
        self.notify(id, "on_eat", events, |b, senses| b.on_eat(senses));
    }

    fn kill(&mut self, id: AgentId, reason: DeathReason, events: &mut Vec<Event>) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if !agent.kill() {
            return;
        }
        let species = agent.species();
        if let Some(behavior) = self.behaviors.get_mut(id) {
            guarded(id, "on_death", || behavior.on_death());
        }
        debug!(agent = ?id, species = self.species_name(species), ?reason, "agent died");
        events.push(Event::AgentDied {
            agent_id: id,
            species,
            reason,
        });
    }

    /// Runs a mid-tick hook against the live board, honoring a
    /// termination requested from inside it.
    fn notify(
        &mut self,
        id: AgentId,
        hook: &'static str,
        events: &mut Vec<Event>,
        call: impl FnOnce(&mut dyn Behavior, &Senses<'_>),
    ) {
        let (Some(agent), Some(behavior)) = (self.agents.get(id), self.behaviors.get_mut(id)) else {
            return;
        };
        let senses = Senses::new(agent, &self.grid, &self.agents, self.tick);
        guarded(id, hook, || call(behavior.as_mut(), &senses));
        let terminated = senses.terminated();

        self.refresh_profile(id);
        if terminated {
            self.kill(id, DeathReason::SelfTermination, events);
        }
    }

    /// Tells each parent about the other, mover first.
    fn notify_mates(&mut self, a: AgentId, b: AgentId, events: &mut Vec<Event>) {
        let Some(mut first) = self.behaviors.remove(a) else {
            return;
        };
        let mut quitters = Vec::new();
        if let (Some(agent), Some(second)) = (self.agents.get(a), self.behaviors.get(b)) {
            let senses = Senses::new(agent, &self.grid, &self.agents, self.tick);
            guarded(a, "on_mate", || first.on_mate(second.as_ref(), &senses));
            if senses.terminated() {
                quitters.push(a);
            }
        }
        if let (Some(agent), Some(second)) = (self.agents.get(b), self.behaviors.get_mut(b)) {
            let senses = Senses::new(agent, &self.grid, &self.agents, self.tick);
            guarded(b, "on_mate", || second.on_mate(first.as_ref(), &senses));
            if senses.terminated() {
                quitters.push(b);
            }
        }
        self.behaviors.insert(a, first);
        self.refresh_profile(a);
        self.refresh_profile(b);

        for id in quitters {
            self.kill(id, DeathReason::SelfTermination, events);
        }
    }

    fn refresh_profile(&mut self, id: AgentId) {
        let (Some(agent), Some(behavior)) = (self.agents.get_mut(id), self.behaviors.get(id)) else {
            return;
        };
        if let Some(profile) = guarded(id, "profile", || Profile::of(behavior.as_ref())) {
            agent.refresh(profile);
        }
    }

    /// Purges dead agents from the order, the arena and the board.
    fn clear_the_dead(&mut self) {
        let agents = &self.agents;
        let mut dead = Vec::new();
        self.order.retain(|id| {
            let alive = agents.get(*id).is_some_and(Agent::is_alive);
            if !alive {
                dead.push(*id);
            }
            alive
        });

        for id in dead {
            self.behaviors.remove(id);
            let Some(agent) = self.agents.remove(id) else {
                continue;
            };
            if self.grid.occupant(agent.position()) == Some(id) {
                self.grid.set_occupant(agent.position(), None);
            }
            self.registry.record_death(agent.species());
        }

        assert!(
            self.occupancy_consistent(),
            "occupancy table out of sync with live agents after cleanup"
        );
        trace!(live = self.order.len(), "dead cleared");
    }

    fn rotate_species(&mut self, events: &mut Vec<Event>) {
        for species in self.registry.sweep_extinct() {
            info!(species = self.species_name(species), tick = self.tick, "species went extinct");
            events.push(Event::SpeciesExtinct { species });
        }
        if self.config.repopulate {
            self.populate(events);
        }
    }

    /// Activates random dormant species up to the maximum, each with its
    /// initial population on random empty cells.
    fn populate(&mut self, events: &mut Vec<Event>) {
        let vacancies = self.registry.vacancies();
        if vacancies == 0 {
            return;
        }
        let mut positions = self.grid.empty_positions();
        positions.shuffle(&mut self.rng);

        for species in self.registry.activate_random(vacancies, &mut self.rng) {
            events.push(Event::SpeciesActivated { species });
            let mut spawned = 0u32;
            for _ in 0..self.config.initial_population {
                let Some(position) = positions.pop() else {
                    break;
                };
                if let Some(agent_id) = self.spawn_agent(species, position) {
                    self.order.push(agent_id);
                    events.push(Event::AgentSpawned {
                        agent_id,
                        species,
                        position,
                    });
                    spawned += 1;
                }
            }
            info!(species = self.species_name(species), spawned, "species activated");
        }

        // Kinds that found no free cell go straight back to the pool.
        for species in self.registry.sweep_extinct() {
            debug!(species = self.species_name(species), "no room to spawn species");
            events.push(Event::SpeciesExtinct { species });
        }
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Steps = {}", self.tick)?;
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                let glyph = match self.sight_at(Position::new(x, y)) {
                    Sight::Empty => BOARD_EMPTY_GLYPH,
                    sight => sight.glyph(),
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
