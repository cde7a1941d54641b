// Domain layer - grid, rule, stencil kernel, partitioning
pub mod domain;

// Engine layer - synchronization substrates and the generation driver
pub mod engine;

// Infrastructure - configuration, timing report, errors
pub mod config;
pub mod error;
pub mod report;

// Re-exports for convenience
pub use config::Config;
pub use domain::{Grid, MAX_PRINTABLE_GRID};
pub use engine::{Engine, GridObserver, RunReport, SyncStrategy};
pub use error::Error;
