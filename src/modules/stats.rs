use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::modules::species::SpeciesId;
use crate::modules::world::{DeathReason, Event};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesStats {
    pub births: u64,
    pub meals: u64,
    pub matings: u64,
    pub fights_won: u64,
    pub starvations: u64,
    pub fight_deaths: u64,
    pub self_terminations: u64,
    pub activations: u64,
    pub extinctions: u64,
}

impl SpeciesStats {
    pub fn deaths(&self) -> u64 {
        self.starvations + self.fight_deaths + self.self_terminations
    }

    fn record_death(&mut self, reason: DeathReason) {
        let counter = match reason {
            DeathReason::Starvation => &mut self.starvations,
            DeathReason::Fight => &mut self.fight_deaths,
            DeathReason::SelfTermination => &mut self.self_terminations,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Running totals per species since the world was created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationStats {
    pub ticks: u64,
    pub per_species: BTreeMap<SpeciesId, SpeciesStats>,
}

impl PopulationStats {
    pub fn get(&self, species: SpeciesId) -> Option<&SpeciesStats> {
        self.per_species.get(&species)
    }

    pub fn record(&mut self, events: &[Event]) {
        for event in events {
            self.record_event(event);
        }
    }

    fn entry(&mut self, species: SpeciesId) -> &mut SpeciesStats {
        self.per_species.entry(species).or_default()
    }

    fn record_event(&mut self, event: &Event) {
        match event {
            Event::TickCompleted { .. } => self.ticks = self.ticks.saturating_add(1),
            Event::AgentSpawned { species, .. } => {
                let stats = self.entry(*species);
                stats.births = stats.births.saturating_add(1);
            }
            Event::AgentAte { species, .. } => {
                let stats = self.entry(*species);
                stats.meals = stats.meals.saturating_add(1);
            }
            Event::AgentsMated { species, .. } => {
                let stats = self.entry(*species);
                stats.matings = stats.matings.saturating_add(1);
            }
            Event::FightResolved { winner_species, .. } => {
                let stats = self.entry(*winner_species);
                stats.fights_won = stats.fights_won.saturating_add(1);
            }
            Event::AgentDied { species, reason, .. } => self.entry(*species).record_death(*reason),
            Event::SpeciesActivated { species } => {
                let stats = self.entry(*species);
                stats.activations = stats.activations.saturating_add(1);
            }
            Event::SpeciesExtinct { species } => {
                let stats = self.entry(*species);
                stats.extinctions = stats.extinctions.saturating_add(1);
            }
            Event::TickStarted { .. } | Event::AgentMoved { .. } => {}
        }
    }
}
