//! Firestore REST API client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the v1 REST API, one document per request
//! - Documents cross this boundary as plain JSON objects; the typed-value
//!   encoding lives in [`value`]
//! - Requests carry the project's web API key and, when a user is signed in,
//!   their ID token as a bearer token
//!
//! # Endpoints
//!
//! - `GET    documents/{collection}/{id}` - read a document
//! - `PATCH  documents/{collection}/{id}?updateMask.fieldPaths=..&currentDocument.exists=true`
//!   - overwrite listed fields of an existing document
//! - `POST   documents/{collection}?documentId=..` - create a document
//! - `GET    documents/{collection}?pageToken=..` - list documents

pub mod value;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::FirestoreConfig;

const API_ROOT: &str = "https://firestore.googleapis.com/v1/";
const PAGE_SIZE: &str = "300";

/// Errors that can occur when talking to Firestore.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Firestore answered with a non-success status.
    #[error("Firestore returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FirestoreError {
    /// Whether the document (or the collection path) does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

/// A document as plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Last path segment of the document name.
    pub id: String,
    /// Decoded fields.
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Self {
            id: raw.name.rsplit('/').next().unwrap_or_default().to_string(),
            fields: value::decode_fields(&raw.fields),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

// =============================================================================
// FirestoreClient
// =============================================================================

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `.../documents/`, always with a trailing slash.
    base: Url,
    api_key: String,
    id_token: Option<String>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::InvalidUrl` if the project or database ID
    /// cannot form a URL.
    pub fn new(config: &FirestoreConfig) -> Result<Self, FirestoreError> {
        let base = Url::parse(API_ROOT)?.join(&format!(
            "projects/{}/databases/{}/documents/",
            config.project_id, config.database
        ))?;

        Ok(Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                base,
                api_key: config.api_key.expose_secret().to_string(),
                id_token: config.bearer().map(str::to_string),
            }),
        })
    }

    /// URL of a document or collection path relative to the database root.
    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FirestoreError> {
        let mut url = self.inner.base.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("key", &self.inner.api_key);
        }
        Ok(url)
    }

    /// Send a request and return the parsed body, or `None` for a 404.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Option<Value>, FirestoreError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = &self.inner.id_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| {
                    body.pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| text.chars().take(200).collect());
            tracing::error!(status = %status, %message, "Firestore returned non-success status");
            return Err(FirestoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Read a document. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, FirestoreError> {
        let url = self.url(&format!("{collection}/{id}"), &[])?;
        let Some(body) = self.send(Method::GET, url, None).await? else {
            return Ok(None);
        };
        let raw: RawDocument = serde_json::from_value(body)?;
        Ok(Some(raw.into()))
    }

    /// Overwrite one field of an existing document, leaving the others alone.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Api` with status 404 if the document does not
    /// exist, or another `FirestoreError` if the request fails.
    #[instrument(skip(self, new_value))]
    pub async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        new_value: &Value,
    ) -> Result<(), FirestoreError> {
        let url = self.url(
            &format!("{collection}/{id}"),
            &[
                ("updateMask.fieldPaths", field),
                ("currentDocument.exists", "true"),
            ],
        )?;
        let mut fields = Map::new();
        fields.insert(field.to_string(), value::encode(new_value));
        let body = json!({ "fields": fields });

        match self.send(Method::PATCH, url, Some(&body)).await? {
            Some(_) => {
                debug!("Field updated");
                Ok(())
            }
            None => Err(FirestoreError::Api {
                status: 404,
                message: format!("{collection}/{id} does not exist"),
            }),
        }
    }

    /// Create a document from already-encoded fields. With `id` of `None`
    /// Firestore picks one. Returns the new document's id.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Api` with status 409 if the document already
    /// exists, or another `FirestoreError` if the request fails.
    #[instrument(skip(self, fields))]
    pub async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<String, FirestoreError> {
        let query: Vec<(&str, &str)> = id.map(|id| ("documentId", id)).into_iter().collect();
        let url = self.url(collection, &query)?;
        let body = json!({ "fields": fields });

        let created = self
            .send(Method::POST, url, Some(&body))
            .await?
            .ok_or_else(|| FirestoreError::Api {
                status: 404,
                message: format!("collection {collection} not found"),
            })?;
        let raw: RawDocument = serde_json::from_value(created)?;
        Ok(Document::from(raw).id)
    }

    /// List every document in a collection, following page tokens.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let url = self.url(collection, &query)?;

            let Some(body) = self.send(Method::GET, url, None).await? else {
                break;
            };
            let page: ListResponse = serde_json::from_value(body)?;
            documents.extend(page.documents.into_iter().map(Document::from));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }
}
