//! Firestore REST order source.
//!
//! Runs one `documents:runQuery` request per poll:
//! `createdAt > <watermark>` on the orders collection, no ordering, no
//! pagination. Firestore answers with a JSON array of result frames; each
//! frame carries a document, a bare read time, or an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::orders::{OrderRecord, OrderSource, OrderStream, StoreError, StoreResult};
use crate::services::auth::{AccessTokenSource, ServiceAccountTokenSource};
use crate::watermark::to_store_timestamp;

const CREATED_AT_FIELD: &str = "createdAt";

pub struct FirestoreOrderSource {
    http: Client,
    base_url: String,
    project_id: String,
    collection: String,
    tokens: Arc<dyn AccessTokenSource>,
}

#[derive(Debug, Deserialize)]
struct RunQueryFrame {
    document: Option<FirestoreDocument>,
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl FirestoreOrderSource {
    /// Connect using the service account from `config`.
    ///
    /// Fails only when the credentials cannot be used at all (bad private
    /// key); network problems surface later, per query.
    pub fn new(config: &Config) -> StoreResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|err| StoreError::network(err.to_string()))?;
        let tokens = ServiceAccountTokenSource::new(&config.service_account, http.clone())?;

        Ok(Self::with_token_source(
            http,
            &config.firestore_api_url,
            &config.service_account.project_id,
            &config.orders_collection,
            Arc::new(tokens),
        ))
    }

    pub fn with_token_source(
        http: Client,
        base_url: &str,
        project_id: &str,
        collection: &str,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            collection: collection.to_string(),
            tokens,
        }
    }

    fn run_query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents:runQuery",
            self.base_url, self.project_id
        )
    }

    fn query_body(&self, after: DateTime<Utc>) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": CREATED_AT_FIELD },
                        "op": "GREATER_THAN",
                        "value": { "stringValue": to_store_timestamp(after) }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl OrderSource for FirestoreOrderSource {
    async fn orders_created_after(&self, after: DateTime<Utc>) -> StoreResult<OrderStream> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(self.run_query_url())
            .bearer_auth(token)
            .json(&self.query_body(after))
            .send()
            .await
            .map_err(|err| StoreError::network(format!("runQuery request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let frames: Vec<RunQueryFrame> = response
            .json()
            .await
            .map_err(|err| StoreError::format(format!("invalid runQuery response: {}", err)))?;

        let results: Vec<StoreResult<OrderRecord>> = frames
            .into_iter()
            .filter_map(|frame| match (frame.document, frame.error) {
                (_, Some(status)) => Some(Err(StoreError::query(format!(
                    "code {}: {}",
                    status.code, status.message
                )))),
                (Some(document), None) => Some(decode_order(document)),
                // Frames with only a read time mark progress, not results.
                (None, None) => None,
            })
            .collect();

        tracing::debug!(
            results = results.len(),
            collection = %self.collection,
            "runQuery completed"
        );

        Ok(stream::iter(results).boxed())
    }

    fn source_name(&self) -> &str {
        "Firestore"
    }
}

fn decode_order(document: FirestoreDocument) -> StoreResult<OrderRecord> {
    let fields: Map<String, Value> = document
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect();

    let mut order: OrderRecord = serde_json::from_value(Value::Object(fields)).map_err(|err| {
        StoreError::format(format!("document {} is not an order: {}", document.name, err))
    })?;

    // Orders written without an `id` field fall back to the document id.
    if order.id.is_none() {
        order.id = document.name.rsplit('/').next().map(str::to_string);
    }

    Ok(order)
}

/// Turn a typed Firestore value (`{"stringValue": "x"}`) into plain JSON.
fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" => inner.clone(),
        // int64 travels as a decimal string.
        "integerValue" => inner
            .as_str()
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(name, value)| (name.clone(), decode_value(value)))
                        .collect::<Map<String, Value>>()
                })
                .unwrap_or_default();
            Value::Object(fields)
        }
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => inner.clone(),
    }
}
