// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod earnings;
pub mod error;
pub mod form;
pub mod geo;
pub mod meter;
pub mod runtime;
pub mod tick;
pub mod trip_log;
pub mod util;

pub use error::{Error, Result};
