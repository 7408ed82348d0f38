use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::errors::CoreError;

use super::traits::{Document, DocumentStore, DocumentWatch};

type DocumentKey = (String, String);

/// In-process document store with push-based watches.
///
/// Useful for tests, demos and running two trackers against one shared
/// "cloud" inside a single process.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentKey, watch::Sender<Option<Document>>>>,
    ready: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            ready: AtomicBool::new(true),
        }
    }

    /// Toggle readiness to simulate a store that failed to initialize.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Current contents of a document, without going through the async API.
    pub fn snapshot(&self, collection: &str, doc_id: &str) -> Option<Document> {
        let documents = self.documents.read().ok()?;
        documents
            .get(&key(collection, doc_id))
            .and_then(|tx| (*tx.borrow()).clone())
    }

    fn lock_error() -> CoreError {
        CoreError::Remote("Memory document store lock poisoned".into())
    }

    fn ensure_ready(&self) -> Result<(), CoreError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CoreError::CloudUnavailable)
        }
    }

    fn sender(&self, collection: &str, doc_id: &str) -> Result<watch::Sender<Option<Document>>, CoreError> {
        let mut documents = self.documents.write().map_err(|_| Self::lock_error())?;
        Ok(documents
            .entry(key(collection, doc_id))
            .or_insert_with(|| watch::channel(None).0)
            .clone())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key(collection: &str, doc_id: &str) -> DocumentKey {
    (collection.to_string(), doc_id.to_string())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "Memory"
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>, CoreError> {
        self.ensure_ready()?;
        Ok(self.snapshot(collection, doc_id))
    }

    async fn merge(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Document,
    ) -> Result<(), CoreError> {
        self.ensure_ready()?;
        self.sender(collection, doc_id)?.send_modify(|doc| {
            let doc = doc.get_or_insert_with(Document::new);
            for (field, value) in fields {
                doc.insert(field, value);
            }
        });
        Ok(())
    }

    async fn watch(&self, collection: &str, doc_id: &str) -> Result<DocumentWatch, CoreError> {
        self.ensure_ready()?;
        Ok(self.sender(collection, doc_id)?.subscribe())
    }
}
