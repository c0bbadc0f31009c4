// Library surface for the binary and for headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod projector;
pub mod results;
pub mod runtime;
pub mod session;
pub mod ui;

pub use error::{Error, Result};
