//! House creation for the house-worker callable functions.
//!
//! The handler talks to the database only through [`DocumentStore`], so the
//! same code runs against Firestore, the Firestore emulator, or memory.

pub mod error;
pub mod handler;
pub mod metrics;
pub mod store;
pub mod types;

pub use error::{FunctionError, FunctionsErrorCode};
pub use handler::HouseHandler;
pub use store::{DocumentPath, DocumentStore, Fields, StoreError};
pub use types::*;
