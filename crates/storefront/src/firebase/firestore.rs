//! Firestore REST API client.
//!
//! One client per process, cheaply cloneable via `Arc`. Documents are
//! addressed by relative path under the project's root collection tree,
//! e.g. `users/u1/cart/main` or `products/p-42`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::config::FirebaseConfig;
use crate::firebase::FirestoreError;
use crate::firebase::value::{decode_fields, encode_fields};
use crate::sync::{DocumentMirror, MirrorError, Subscription, TaskGuard};

/// Page size for collection listing.
const LIST_PAGE_SIZE: u32 = 300;

/// A document read from the backend, with its fields decoded to plain JSON.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document ID (last path segment of the resource name).
    pub id: String,
    /// Decoded document fields as a JSON object.
    pub fields: Value,
    /// Backend revision timestamp, used to detect changes when watching.
    pub update_time: Option<String>,
}

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    watch_interval: Duration,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let base_url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            config.project_id
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                base_url,
                api_key: config.api_key.expose_secret().to_string(),
                watch_interval: config.watch_interval,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Fetch a document. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_document(&self, path: &str) -> Result<Option<Document>, FirestoreError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .query(&[("key", self.inner.api_key.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = check_response(response).await?;
        Ok(Some(parse_document(&body)?))
    }

    /// Overwrite a document's entire contents.
    ///
    /// A patch without a field mask replaces the whole document, creating it
    /// if absent. No partial updates are issued anywhere in this crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, fields), fields(path = %path))]
    pub async fn set_document(&self, path: &str, fields: &Value) -> Result<(), FirestoreError> {
        let body = serde_json::json!({ "fields": encode_json(fields) });

        let response = self
            .inner
            .client
            .patch(self.url(path))
            .query(&[("key", self.inner.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        check_response(response).await?;
        Ok(())
    }

    /// Create a document with a server-assigned ID. Returns the new ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self, fields), fields(collection = %collection))]
    pub async fn create_document(
        &self,
        collection: &str,
        fields: &Value,
    ) -> Result<String, FirestoreError> {
        let body = serde_json::json!({ "fields": encode_json(fields) });

        let response = self
            .inner
            .client
            .post(self.url(collection))
            .query(&[("key", self.inner.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let body = check_response(response).await?;
        let doc = parse_document(&body)?;
        Ok(doc.id)
    }

    /// List all documents in a collection, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("key", self.inner.api_key.clone()),
                ("pageSize", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .inner
                .client
                .get(self.url(collection))
                .query(&query)
                .send()
                .await?;

            let body = check_response(response).await?;
            let page: Value = serde_json::from_str(&body)?;

            if let Some(docs) = page.get("documents").and_then(Value::as_array) {
                for doc in docs {
                    documents.push(document_from_json(doc));
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(String::from);
            if page_token.is_none() {
                break;
            }
        }

        debug!(count = documents.len(), "Listed collection");
        Ok(documents)
    }

    /// Delete a document. Deleting a missing document is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete_document(&self, path: &str) -> Result<(), FirestoreError> {
        let response = self
            .inner
            .client
            .delete(self.url(path))
            .query(&[("key", self.inner.api_key.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        check_response(response).await?;
        Ok(())
    }
}

impl DocumentMirror for FirestoreClient {
    /// Watch a document by polling its revision timestamp.
    ///
    /// The first poll always delivers a snapshot (possibly of a missing
    /// document); subsequent polls forward one only when the revision
    /// changes. Transient request failures are logged and polling
    /// continues; there is no reconnect or backoff policy beyond the fixed
    /// interval. Dropping the returned subscription cancels the poller.
    fn subscribe(&self, path: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(8);
        let client = self.clone();
        let path = path.to_owned();
        let interval = self.inner.watch_interval;

        let handle = tokio::spawn(async move {
            let mut seen = false;
            let mut last_revision: Option<String> = None;

            loop {
                match client.get_document(&path).await {
                    Ok(doc) => {
                        let revision = doc.as_ref().and_then(|d| d.update_time.clone());
                        if !seen || revision != last_revision {
                            seen = true;
                            last_revision = revision;
                            let snapshot = doc.map(|d| d.fields);
                            if tx.send(snapshot).await.is_err() {
                                // Subscriber went away
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "Document watch poll failed");
                    }
                }

                tokio::time::sleep(interval).await;
            }
        });

        Subscription::with_guard(rx, TaskGuard::new(handle))
    }

    async fn overwrite(&self, path: &str, fields: Value) -> Result<(), MirrorError> {
        self.set_document(path, &fields).await?;
        Ok(())
    }
}

// =============================================================================
// Response Handling
// =============================================================================

/// Check status, map API errors, and return the response body.
async fn check_response(response: reqwest::Response) -> Result<String, FirestoreError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(FirestoreError::RateLimited(retry_after));
    }

    // Read the body first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        let message = extract_error_message(&body)
            .unwrap_or_else(|| body.chars().take(200).collect::<String>());
        tracing::error!(
            status = %status,
            message = %message,
            "Firestore API returned non-success status"
        );
        return Err(FirestoreError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

/// Pull `error.message` out of an API error body, if present.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}

fn parse_document(body: &str) -> Result<Document, FirestoreError> {
    let value: Value = serde_json::from_str(body)?;
    Ok(document_from_json(&value))
}

/// Build a [`Document`] from a Firestore document resource.
fn document_from_json(value: &Value) -> Document {
    let id = value
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .unwrap_or_default()
        .to_string();

    let fields = decode_fields(value.get("fields").unwrap_or(&Value::Null));

    let update_time = value
        .get("updateTime")
        .and_then(Value::as_str)
        .map(String::from);

    Document {
        id,
        fields,
        update_time,
    }
}

/// Encode a plain JSON object as a Firestore `fields` map.
fn encode_json(fields: &Value) -> Value {
    match fields.as_object() {
        Some(map) => encode_fields(map),
        None => Value::Object(serde_json::Map::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_document_from_json() {
        let wire = json!({
            "name": "projects/p/databases/(default)/documents/products/p-42",
            "fields": {
                "name": { "stringValue": "Smart Watch" },
                "price": { "doubleValue": 149.99 }
            },
            "createTime": "2026-01-01T00:00:00Z",
            "updateTime": "2026-01-02T00:00:00Z"
        });

        let doc = document_from_json(&wire);
        assert_eq!(doc.id, "p-42");
        assert_eq!(doc.fields["name"], json!("Smart Watch"));
        assert_eq!(doc.update_time.as_deref(), Some("2026-01-02T00:00:00Z"));
    }

    #[test]
    fn test_document_from_json_no_fields() {
        let wire = json!({
            "name": "projects/p/databases/(default)/documents/users/u1/cart/main"
        });

        let doc = document_from_json(&wire);
        assert_eq!(doc.id, "main");
        assert_eq!(doc.fields, json!({}));
        assert!(doc.update_time.is_none());
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error":{"code":403,"message":"Missing or insufficient permissions","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Missing or insufficient permissions")
        );
        assert!(extract_error_message("not json").is_none());
    }
}
