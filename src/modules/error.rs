//! Error types for world setup.
//!
//! Every failure here happens before the first tick runs. Faults inside a
//! running tick are either engine bugs (which panic) or behavior panics
//! (which are isolated to the offending agent).

use crate::modules::grid::Position;

/// Invalid tunables in a [`WorldConfig`](crate::WorldConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("max_active_species must be at least 1")]
    NoActiveSpecies,

    #[error("hunger_limit must be at least 1")]
    ZeroHungerLimit,

    #[error("initial_food_ratio must lie in [0, 1] (got {0})")]
    FoodRatioOutOfRange(f64),

    #[error("malformed world config: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors raised while building or staging a [`World`](crate::World).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("species catalog is empty")]
    EmptyCatalog,

    #[error("species `{0}` is registered twice")]
    DuplicateSpecies(String),

    #[error("unknown species `{0}`")]
    UnknownSpecies(String),

    #[error("species `{0}` panicked while being constructed")]
    InvalidSpecies(String),

    #[error("no room to activate species `{0}`")]
    SpeciesLimit(String),

    #[error("position ({}, {}) lies outside the grid", .0.x, .0.y)]
    OutOfBounds(Position),

    #[error("position ({}, {}) is already occupied", .0.x, .0.y)]
    Occupied(Position),
}
