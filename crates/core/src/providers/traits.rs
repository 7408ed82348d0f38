use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::errors::CoreError;
use crate::models::price::{PriceQuote, PriceRequest};

/// A cloud document: top-level field name → JSON value.
pub type Document = Map<String, Value>;

/// Receiver side of a document watch. Holds `None` while the document does not exist.
pub type DocumentWatch = watch::Receiver<Option<Document>>;

/// Abstraction over the cloud document store the app mirrors its data into.
///
/// Implementations address documents by `(collection, doc_id)`. All clients
/// of one deployment share the same ids, so a document is effectively a
/// shared mailbox; there is no per-account routing here.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DocumentStore: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the store handle was constructed successfully and can take requests.
    fn is_ready(&self) -> bool;

    /// Fetch a document. `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>, CoreError>;

    /// Upsert `fields` into a document, leaving fields not named here untouched.
    async fn merge(&self, collection: &str, doc_id: &str, fields: Document)
        -> Result<(), CoreError>;

    /// Watch a document. The receiver starts with the current state and is
    /// updated on every change until it is dropped.
    async fn watch(&self, collection: &str, doc_id: &str) -> Result<DocumentWatch, CoreError>;
}

/// Source of current unit prices for a fund, currency or stock.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Look up the latest price for the requested position.
    async fn get_current_price(&self, request: &PriceRequest) -> Result<PriceQuote, CoreError>;
}
