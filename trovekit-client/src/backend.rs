//! HTTP access to the trovekit backend service.
//!
//! The backend is an external collaborator consumed through the narrow
//! [`Backend`] trait. Requests are one-shot: no retries, no stored network
//! state. Failures come back as [`NetworkError`] values for the caller to
//! surface and recover from.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use trovekit_lib::request::{
    ClaimRequest, ClaimResponse, CreateResponse, ExistsRequest, ExistsResponse, PlantRequest,
    PlantResponse,
};
use trovekit_lib::PublicKey;

use crate::errors::NetworkError;

/// The backend wire contract.
#[async_trait]
pub trait Backend {
    /// Register a treasure. The request is assumed assembled and signed.
    async fn plant(&self, request: &PlantRequest) -> Result<PlantResponse, NetworkError>;

    /// Transfer a treasure to the claiming account.
    async fn claim(&self, request: &ClaimRequest) -> Result<ClaimResponse, NetworkError>;

    /// Whether a treasure has been planted.
    async fn treasure_exists(&self, treasure: &PublicKey) -> Result<bool, NetworkError>;

    /// Ask the server to mint a treasure identity with rendered QR markup.
    async fn create_treasure(&self) -> Result<CreateResponse, NetworkError>;
}

/// [`Backend`] over HTTP.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Point the client at a backend, e.g. `https://trovekit.app`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, NetworkError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "backend request");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                url: url.clone(),
                source,
            })?;
        read_json(url, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkError> {
        let url = self.url(path);
        debug!(%url, "backend request");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                url: url.clone(),
                source,
            })?;
        read_json(url, response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn plant(&self, request: &PlantRequest) -> Result<PlantResponse, NetworkError> {
        self.post_json("api/plant", request).await
    }

    async fn claim(&self, request: &ClaimRequest) -> Result<ClaimResponse, NetworkError> {
        self.post_json("api/claim", request).await
    }

    async fn treasure_exists(&self, treasure: &PublicKey) -> Result<bool, NetworkError> {
        let request = ExistsRequest {
            treasure_public_key: treasure.encode(),
        };
        let response: ExistsResponse = self.post_json("api/exists", &request).await?;
        Ok(response.treasure_exists)
    }

    async fn create_treasure(&self) -> Result<CreateResponse, NetworkError> {
        self.get_json("api/create").await
    }
}

async fn read_json<T: DeserializeOwned>(
    url: String,
    response: reqwest::Response,
) -> Result<T, NetworkError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NetworkError::Status {
            url,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|source| NetworkError::Body { url, source })
}
