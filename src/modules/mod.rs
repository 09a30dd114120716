pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod grass;
pub mod grid;
pub mod species;
pub mod stats;
pub mod view;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;
