mod grid;
pub mod kernel;
pub mod partition;
pub mod rules;

pub use grid::{Grid, MAX_PRINTABLE_GRID};
