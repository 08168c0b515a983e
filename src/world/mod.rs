//! World module - tile map parsing and static level geometry
//!
//! - `map`: the text map format and the immutable tile grid
//! - `geometry`: mesh, collision segment and spawn generation from a grid

mod geometry;
mod map;

pub use geometry::*;
pub use map::*;
