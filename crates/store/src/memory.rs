use async_trait::async_trait;
use house_worker_core::{DocumentPath, DocumentStore, Fields, StoreError};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::BTreeMap;

const AUTO_ID_LEN: usize = 20;

/// Process-local document store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentPath, Fields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every stored document, in path order.
    pub fn paths(&self) -> Vec<String> {
        self.documents.read().keys().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

/// Random alphanumeric id shaped like a Firestore auto-id.
pub fn generate_auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &DocumentPath, fields: Fields) -> Result<DocumentPath, StoreError> {
        let mut documents = self.documents.write();
        let path = loop {
            let candidate = collection.document(&generate_auto_id())?;
            if !documents.contains_key(&candidate) {
                break candidate;
            }
        };
        documents.insert(path.clone(), fields);
        Ok(path)
    }

    async fn set(&self, document: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        if !document.is_document() {
            return Err(StoreError::InvalidPath(format!("{} is not a document", document)));
        }
        self.documents.write().insert(document.clone(), fields);
        Ok(())
    }

    async fn get(&self, document: &DocumentPath) -> Result<Option<Fields>, StoreError> {
        Ok(self.documents.read().get(document).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
