pub mod modules;

pub use modules::agent::{Agent, AgentId, Profile};
pub use modules::behavior::{Behavior, Color, Diet, EMPTY_GLYPH, FOOD_GLYPH, Senses, Sight, Speed};
pub use modules::config::WorldConfig;
pub use modules::error::{ConfigError, WorldError};
pub use modules::grass;
pub use modules::grid::{Direction, Grid, Intensity, Position};
pub use modules::species::{SpeciesCatalog, SpeciesId, SpeciesRegistry};
pub use modules::stats::{PopulationStats, SpeciesStats};
pub use modules::view::{AgentSnapshot, SpeciesCount, WorldSnapshot};
pub use modules::world::{BOARD_EMPTY_GLYPH, DeathReason, Event, TickResult, World};
