use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::fund_value::FundCurrentValue;
use crate::models::investment::Investment;
use crate::models::settings::CloudConfig;
use crate::providers::firestore::FirestoreDocumentStore;
use crate::providers::traits::{Document, DocumentStore};

/// Collection holding the shared investments document.
pub const INVESTMENTS_COLLECTION: &str = "investments";

/// Collection holding the shared fund-values document.
pub const FUND_VALUES_COLLECTION: &str = "fund-current-values";

const INVESTMENTS_FIELD: &str = "investments";
const FUND_VALUES_FIELD: &str = "values";
const UPDATED_AT_FIELD: &str = "updatedAt";

/// Best-effort mirror of the record set in a shared cloud document.
///
/// Reads degrade to an empty list on any failure; writes report their error
/// so the reconciliation layer can decide what to do with it.
#[derive(Clone)]
pub struct RemoteStore {
    config: Option<CloudConfig>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("document_id", &self.document_id())
            .field("store", &self.store.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl RemoteStore {
    pub fn new(config: CloudConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Some(config),
            store: Some(store),
        }
    }

    /// A remote store that is never available; everything stays local.
    pub fn disabled() -> Self {
        Self {
            config: None,
            store: None,
        }
    }

    /// Build a Firestore-backed store from configuration, or a disabled one
    /// when no configuration is present.
    pub fn from_config(config: Option<CloudConfig>) -> Self {
        match config {
            Some(config) if config.is_complete() => {
                let store = Arc::new(FirestoreDocumentStore::new(config.clone()));
                Self::new(config, store)
            }
            Some(_) => {
                debug!("Cloud configuration incomplete, cloud sync disabled");
                Self::disabled()
            }
            None => Self::disabled(),
        }
    }

    /// Identity of the shared document all clients read and write.
    pub fn document_id(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.document_id.as_str())
    }

    /// Whether remote operations can be attempted right now.
    ///
    /// Evaluated on every call rather than cached: credentials must be
    /// complete and the store handle must exist and report ready.
    pub fn availability(&self) -> bool {
        match (&self.config, &self.store) {
            (Some(config), Some(store)) => config.is_complete() && store.is_ready(),
            _ => false,
        }
    }

    /// All readable records in the shared document, or an empty list when
    /// the document is missing, unreadable or the store is unavailable.
    pub async fn fetch_all(&self) -> Vec<Investment> {
        self.read_investments().await.into_items()
    }

    /// Read the shared records, telling an empty document apart from one
    /// whose entries could not all be decoded and from a failed read.
    pub async fn read_investments(&self) -> CloudRead<Investment> {
        self.read_field(INVESTMENTS_COLLECTION, INVESTMENTS_FIELD).await
    }

    /// Merge `{ investments, updatedAt }` into the shared document.
    /// A no-op when the store is unavailable.
    pub async fn push_all(&self, investments: &[Investment]) -> Result<(), CoreError> {
        self.push_field(INVESTMENTS_COLLECTION, INVESTMENTS_FIELD, investments)
            .await
    }

    pub async fn fetch_fund_values(&self) -> Vec<FundCurrentValue> {
        self.read_fund_values().await.into_items()
    }

    pub async fn read_fund_values(&self) -> CloudRead<FundCurrentValue> {
        self.read_field(FUND_VALUES_COLLECTION, FUND_VALUES_FIELD).await
    }

    pub async fn push_fund_values(&self, values: &[FundCurrentValue]) -> Result<(), CoreError> {
        self.push_field(FUND_VALUES_COLLECTION, FUND_VALUES_FIELD, values)
            .await
    }

    /// Listen for changes to the shared investments document.
    ///
    /// Returns `None` when the store is unavailable or no async runtime is
    /// running. Otherwise the handle is returned right away and the watch is
    /// attached in the background; `on_change` then receives the current
    /// records and the records after every remote change, until the
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, on_change: F) -> Option<Subscription>
    where
        F: Fn(Vec<Investment>) + Send + Sync + 'static,
    {
        if !self.availability() {
            return None;
        }
        let store = self.store.clone()?;
        let doc_id = self.document_id()?.to_string();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("Cannot subscribe to cloud changes outside an async runtime");
                return None;
            }
        };

        let task = runtime.spawn(async move {
            let mut rx = match store.watch(INVESTMENTS_COLLECTION, &doc_id).await {
                Ok(rx) => rx,
                Err(e) => {
                    warn!("Failed to watch cloud investments: {e}");
                    return;
                }
            };
            loop {
                let investments = {
                    let doc = rx.borrow_and_update();
                    decode_field::<Investment>((*doc).as_ref(), INVESTMENTS_FIELD).into_items()
                };
                on_change(investments);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Some(Subscription { task })
    }

    async fn read_field<T: DeserializeOwned>(&self, collection: &str, field: &str) -> CloudRead<T> {
        if !self.availability() {
            return CloudRead::Unreachable;
        }
        let (Some(store), Some(doc_id)) = (&self.store, self.document_id()) else {
            return CloudRead::Unreachable;
        };

        match store.get(collection, doc_id).await {
            Ok(doc) => decode_field(doc.as_ref(), field),
            Err(e) => {
                warn!("Failed to fetch {collection}/{doc_id} from {}: {e}", store.name());
                CloudRead::Unreachable
            }
        }
    }

    async fn push_field<T: Serialize>(
        &self,
        collection: &str,
        field: &str,
        items: &[T],
    ) -> Result<(), CoreError> {
        if !self.availability() {
            debug!("Cloud unavailable, skipping push to {collection}");
            return Ok(());
        }
        let (Some(store), Some(doc_id)) = (&self.store, self.document_id()) else {
            return Ok(());
        };

        let items = serde_json::to_value(items)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize {field}: {e}")))?;
        let mut fields = Document::new();
        fields.insert(field.to_string(), items);
        fields.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        store.merge(collection, doc_id, fields).await
    }
}

/// What a cloud read found in one list field of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum CloudRead<T> {
    /// The store is unavailable or the read failed.
    Unreachable,
    /// No document, no field, or an empty list.
    Empty,
    /// The field holds entries. `items` are the ones that decoded; `skipped`
    /// counts the ones that did not. `items` may be empty when nothing decoded.
    Entries { items: Vec<T>, skipped: usize },
}

impl<T> CloudRead<T> {
    /// The decoded entries; empty unless the field held any.
    pub fn into_items(self) -> Vec<T> {
        match self {
            CloudRead::Entries { items, .. } => items,
            CloudRead::Unreachable | CloudRead::Empty => Vec::new(),
        }
    }
}

/// Decode `doc[field]` entry by entry. An entry that fails to decode is
/// logged and skipped; it never hides the entries around it.
fn decode_field<T: DeserializeOwned>(doc: Option<&Document>, field: &str) -> CloudRead<T> {
    let entries = match doc.and_then(|d| d.get(field)) {
        None | Some(Value::Null) => return CloudRead::Empty,
        Some(Value::Array(entries)) if entries.is_empty() => return CloudRead::Empty,
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            warn!("Cloud field {field} is not a list");
            return CloudRead::Entries {
                items: Vec::new(),
                skipped: 1,
            };
        }
    };

    let mut items = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<T>(entry.clone()) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping unreadable {field} entry {index}: {e}");
                skipped += 1;
            }
        }
    }
    CloudRead::Entries { items, skipped }
}

/// Handle to a running cloud listener. Dropping it stops the listener.
#[derive(Debug)]
pub struct Subscription {
    task: tokio::task::JoinHandle<()>,
}

impl Subscription {
    /// Stop listening. Safe to call before the listener finished attaching.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    /// False once the listener has stopped (unsubscribed, or the watch ended).
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
