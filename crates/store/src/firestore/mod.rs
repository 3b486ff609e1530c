mod constants;
mod token;
mod types;
pub mod value;

pub use constants::{DEFAULT_DATABASE_ID, EMULATOR_HOST_ENV, FIRESTORE_BASE_URL};
pub use token::TokenSource;

use async_trait::async_trait;
use constants::*;
use house_worker_core::{DocumentPath, DocumentStore, Fields, StoreError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use types::*;

pub struct FirestoreConfig {
    pub project_id: String,
    pub database_id: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Points at a local emulator, `host` being `host:port`.
    pub fn emulator(project_id: impl Into<String>, host: &str) -> Self {
        Self {
            base_url: format!("http://{}", host),
            ..Self::new(project_id)
        }
    }
}

/// Firestore through its REST API.
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    tokens: TokenSource,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig, tokens: TokenSource) -> Result<Self, StoreError> {
        if config.project_id.is_empty() {
            return Err(StoreError::InvalidPath("project id is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let documents_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            config.base_url.trim_end_matches('/'),
            config.project_id,
            config.database_id
        );

        tracing::info!("Firestore store using {}", documents_url);

        Ok(Self {
            client,
            documents_url,
            tokens,
        })
    }

    fn url_for(&self, path: &DocumentPath) -> String {
        let encoded: Vec<String> = path
            .segments()
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}", self.documents_url, encoded.join("/"))
    }

    async fn send_write(
        &self,
        request: reqwest::RequestBuilder,
        fields: &Fields,
    ) -> Result<DocumentResponse, StoreError> {
        let token = self.tokens.access_token(&self.client).await?;
        let body = WriteDocumentRequest {
            fields: value::encode_fields(fields),
        };

        let response = request
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json::<DocumentResponse>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(parsed) if !parsed.error.status.is_empty() => {
            format!("{} {}", parsed.error.status, parsed.error.message)
        }
        Ok(parsed) => parsed.error.message,
        Err(_) => text,
    };

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(&self, collection: &DocumentPath, fields: Fields) -> Result<DocumentPath, StoreError> {
        if !collection.is_collection() {
            return Err(StoreError::InvalidPath(format!("{} is not a collection", collection)));
        }

        let request = self.client.post(self.url_for(collection));
        let document = self.send_write(request, &fields).await?;

        let id = document
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Parse(format!("bad document name: {}", document.name)))?;

        tracing::debug!(
            name = %document.name,
            create_time = ?document.create_time,
            "Document added"
        );
        collection.document(id)
    }

    async fn set(&self, document: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        if !document.is_document() {
            return Err(StoreError::InvalidPath(format!("{} is not a document", document)));
        }

        // PATCH without an update mask replaces the whole document.
        let request = self.client.patch(self.url_for(document));
        let written = self.send_write(request, &fields).await?;

        tracing::debug!(
            name = %written.name,
            update_time = ?written.update_time,
            "Document set"
        );
        Ok(())
    }

    async fn get(&self, document: &DocumentPath) -> Result<Option<Fields>, StoreError> {
        if !document.is_document() {
            return Err(StoreError::InvalidPath(format!("{} is not a document", document)));
        }

        let token = self.tokens.access_token(&self.client).await?;
        let response = self
            .client
            .get(self.url_for(document))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let document: DocumentResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        value::decode_fields(&document.fields).map(Some)
    }

    fn name(&self) -> &str {
        "firestore"
    }
}
