//! BONNIE-WOLF: tile-map level core for a Wolfenstein-style shooter
//!
//! Turns ASCII level maps into a static mesh plus collision segments, then
//! runs doors, monsters, medkits and the player against that geometry on a
//! fixed logic timestep. Rendering, input polling and texture decoding live
//! outside this crate; it only exposes buffers, transforms and materials.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod math;
pub mod config;
pub mod assets;
pub mod world;
pub mod game;
