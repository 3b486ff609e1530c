//! Callable-function host for house-worker.

pub mod bootstrap;
pub mod callable;
pub mod config;
pub mod logging;
pub mod server;
pub mod shutdown;

pub use bootstrap::{initialize_app, AppState};
pub use config::Config;
