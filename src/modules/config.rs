use serde::{Deserialize, Serialize};

use crate::modules::error::ConfigError;

pub const DEFAULT_WIDTH: u32 = 50;
pub const DEFAULT_HEIGHT: u32 = 50;
pub const DEFAULT_RANDOM_FOOD_PROBABILITY: u32 = 512;
pub const DEFAULT_HUNGER_LIMIT: u32 = 50;
pub const DEFAULT_INITIAL_POPULATION: u32 = 25;
pub const DEFAULT_MAX_ACTIVE_SPECIES: usize = 8;
pub const DEFAULT_INITIAL_FOOD_RATIO: f64 = 0.15;

/// Tunables for a simulation world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    /// A bare cell sprouts food with probability `1 / random_food_probability`
    /// each tick; 0 turns random sprouting off.
    pub random_food_probability: u32,
    /// Hunger at which an agent starves.
    pub hunger_limit: u32,
    /// Members spawned for each newly activated species.
    pub initial_population: u32,
    pub max_active_species: usize,
    /// Fraction of cells seeded with a unit of food at construction.
    pub initial_food_ratio: f64,
    /// Activate fresh species after extinctions.
    pub repopulate: bool,
    /// Seed for the world's random source; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            random_food_probability: DEFAULT_RANDOM_FOOD_PROBABILITY,
            hunger_limit: DEFAULT_HUNGER_LIMIT,
            initial_population: DEFAULT_INITIAL_POPULATION,
            max_active_species: DEFAULT_MAX_ACTIVE_SPECIES,
            initial_food_ratio: DEFAULT_INITIAL_FOOD_RATIO,
            repopulate: true,
            seed: None,
        }
    }
}

impl WorldConfig {
    /// Parses a JSON config document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_active_species == 0 {
            return Err(ConfigError::NoActiveSpecies);
        }
        if self.hunger_limit == 0 {
            return Err(ConfigError::ZeroHungerLimit);
        }
        if !(0.0..=1.0).contains(&self.initial_food_ratio) {
            return Err(ConfigError::FoodRatioOutOfRange(self.initial_food_ratio));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Number of cells seeded with food at construction.
    pub fn initial_food_cells(&self) -> usize {
        (self.cell_count() as f64 * self.initial_food_ratio) as usize
    }
}
