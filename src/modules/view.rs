use serde::{Deserialize, Serialize};

use crate::modules::grid::Position;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub position: Position,
    pub species: String,
    pub glyph: char,
    pub hunger: u32,
    pub has_mated: bool,
    pub born: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub name: String,
    pub live: usize,
}

/// Read-only copy of the board between ticks, for front-ends and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    pub repopulating: bool,
    pub food_cells: usize,
    pub species: Vec<SpeciesCount>,
    /// Sorted row by row.
    pub agents: Vec<AgentSnapshot>,
}

impl WorldSnapshot {
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    pub fn live_count(&self, species: &str) -> usize {
        self.species
            .iter()
            .find(|count| count.name == species)
            .map_or(0, |count| count.live)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
