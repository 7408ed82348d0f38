use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tokio::sync::watch;

use crate::errors::CoreError;
use crate::models::settings::CloudConfig;

use super::traits::{Document, DocumentStore, DocumentWatch};

const PROVIDER: &str = "Firestore";

/// Cloud Firestore over its REST API.
///
/// - **Reads**: `GET .../documents/{collection}/{doc}`; 404 means "no document".
/// - **Writes**: `PATCH` with an `updateMask` naming only the written fields,
///   which upserts the document and leaves every other field alone.
/// - **Watches**: REST has no push channel, so the document is re-read every
///   `poll_interval` and subscribers are only notified when it changed.
///
/// Values are translated between plain JSON and Firestore's typed value
/// encoding (`stringValue`, `arrayValue`, `mapValue`, ...).
#[derive(Debug, Clone)]
pub struct FirestoreDocumentStore {
    client: Option<Client>,
    config: CloudConfig,
}

impl FirestoreDocumentStore {
    pub fn new(config: CloudConfig) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        let client = match builder.build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to build Firestore HTTP client: {e}");
                None
            }
        };
        Self { client, config }
    }

    fn client(&self) -> Result<&Client, CoreError> {
        self.client.as_ref().ok_or(CoreError::CloudUnavailable)
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.config.base_url, self.config.project_id, collection, doc_id
        )
    }

    async fn fetch(&self, collection: &str, doc_id: &str) -> Result<Option<Document>, CoreError> {
        let resp = self
            .client()?
            .get(self.document_url(collection, doc_id))
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp).await?;

        let body: FirestoreDocument = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse document {collection}/{doc_id}: {e}"),
        })?;
        Ok(Some(decode_fields(body.fields.unwrap_or_default())))
    }
}

// ── Firestore API response types ────────────────────────────────────

#[derive(Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct FirestoreErrorBody {
    error: FirestoreErrorDetail,
}

#[derive(Deserialize)]
struct FirestoreErrorDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<FirestoreErrorBody>(&body) {
        Ok(err) => format!("HTTP {}: {} {}", status.as_u16(), err.error.status, err.error.message),
        Err(_) => format!("HTTP {}", status.as_u16()),
    };
    Err(CoreError::Api {
        provider: PROVIDER.into(),
        message,
    })
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DocumentStore for FirestoreDocumentStore {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn is_ready(&self) -> bool {
        self.client.is_some() && self.config.is_complete()
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>, CoreError> {
        self.fetch(collection, doc_id).await
    }

    async fn merge(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Document,
    ) -> Result<(), CoreError> {
        let mut query: Vec<(&str, &str)> = vec![("key", self.config.api_key.as_str())];
        for field in fields.keys() {
            query.push(("updateMask.fieldPaths", field.as_str()));
        }

        let body = json!({ "fields": encode_fields(&fields) });
        let resp = self
            .client()?
            .patch(self.document_url(collection, doc_id))
            .query(&query)
            .json(&body)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Starts from the current document. If that first read fails the
    /// channel starts empty and the polling loop keeps retrying, so a
    /// transient error never ends the watch.
    async fn watch(&self, collection: &str, doc_id: &str) -> Result<DocumentWatch, CoreError> {
        self.client()?;
        let initial = match self.fetch(collection, doc_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Initial read of {collection}/{doc_id} failed, will keep polling: {e}");
                None
            }
        };
        let (tx, rx) = watch::channel(initial);

        let store = self.clone();
        let collection = collection.to_string();
        let doc_id = doc_id.to_string();
        let interval = self.config.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                match store.fetch(&collection, &doc_id).await {
                    Ok(latest) => {
                        tx.send_if_modified(|current| {
                            if *current == latest {
                                false
                            } else {
                                *current = latest;
                                true
                            }
                        });
                    }
                    Err(e) => debug!("Polling {collection}/{doc_id} failed: {e}"),
                }
            }
            debug!("Stopped watching {collection}/{doc_id}");
        });

        Ok(rx)
    }
}

// ── Value encoding ──────────────────────────────────────────────────

/// Encode a plain JSON object as a Firestore `fields` map.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Encode one plain JSON value as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // Firestore carries 64-bit integers as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a Firestore `fields` map into a plain JSON object.
pub fn decode_fields(fields: Map<String, Value>) -> Document {
    fields
        .into_iter()
        .map(|(k, v)| (k, decode_value(v)))
        .collect()
}

/// Decode one Firestore typed value. Unknown encodings are passed through.
pub fn decode_value(value: Value) -> Value {
    let Value::Object(mut typed) = value else {
        return value;
    };
    if typed.len() != 1 {
        return Value::Object(typed);
    }

    if typed.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(v) = typed.remove("booleanValue") {
        return v;
    }
    if let Some(v) = typed.remove("integerValue") {
        return match &v {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(v),
            _ => v,
        };
    }
    if let Some(v) = typed.remove("doubleValue") {
        return v;
    }
    for string_like in ["stringValue", "timestampValue", "referenceValue", "bytesValue"] {
        if let Some(v) = typed.remove(string_like) {
            return v;
        }
    }
    if let Some(v) = typed.remove("arrayValue") {
        let values = match v {
            Value::Object(mut array) => match array.remove("values") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        return Value::Array(values.into_iter().map(decode_value).collect());
    }
    if let Some(v) = typed.remove("mapValue") {
        let fields = match v {
            Value::Object(mut map) => match map.remove("fields") {
                Some(Value::Object(fields)) => fields,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        return Value::Object(decode_fields(fields));
    }

    Value::Object(typed)
}
