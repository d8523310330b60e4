//! Typed client for a node's HTTP API, used by the `cbn bucket` commands.

use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use common::bucket::{BucketMessage, DataRef};

use super::CreateRequest;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("no bucket named {0}")]
    UnknownBucket(String),
}

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct Failure {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ClientError> {
        Ok(Self {
            remote: remote.clone(),
            client: Client::builder().build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.remote.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Pass successful responses through, turn `{"error": ..}` bodies into
    /// [`ClientError::HttpStatus`].
    async fn checked(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        let msg = serde_json::from_str::<Failure>(&text)
            .map(|f| f.error)
            .unwrap_or(text);
        Err(ClientError::HttpStatus(status, msg))
    }

    async fn data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let envelope: Data<T> = Self::checked(response).await?.json().await?;
        Ok(envelope.data)
    }

    pub async fn create_bucket(&self, name: &str) -> Result<BucketMessage, ClientError> {
        let request = CreateRequest {
            name: name.to_string(),
        };
        let response = self
            .client
            .post(self.url(&["buckets"])?)
            .json(&request)
            .send()
            .await?;
        Self::data(response).await
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketMessage>, ClientError> {
        let response = self.client.get(self.url(&["buckets"])?).send().await?;
        Self::data(response).await
    }

    pub async fn bucket_content(&self, hash: &str) -> Result<Vec<String>, ClientError> {
        let response = self
            .client
            .get(self.url(&["buckets", hash])?)
            .send()
            .await?;
        Self::data(response).await
    }

    pub async fn upload(
        &self,
        hash: &str,
        name: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> Result<DataRef, ClientError> {
        let response = self
            .client
            .post(self.url(&["buckets", hash, name])?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        Self::data(response).await
    }

    /// The raw download response, for the caller to stream.
    pub async fn download(&self, hash: &str, name: &str) -> Result<Response, ClientError> {
        let response = self
            .client
            .get(self.url(&["buckets", hash, name])?)
            .send()
            .await?;
        Self::checked(response).await
    }

    /// Accept a bucket hash as is, otherwise look the name up among the
    /// node's buckets.
    pub async fn resolve_bucket(&self, name_or_hash: &str) -> Result<String, ClientError> {
        if name_or_hash.len() == 64 && name_or_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(name_or_hash.to_string());
        }
        self.list_buckets()
            .await?
            .into_iter()
            .find(|b| b.name == name_or_hash)
            .map(|b| b.hash)
            .ok_or_else(|| ClientError::UnknownBucket(name_or_hash.to_string()))
    }
}
