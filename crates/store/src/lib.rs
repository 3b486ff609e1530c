pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreConfig, FirestoreStore, TokenSource};
pub use memory::MemoryStore;
