use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use sql_dataset_core::{Context, DatasetClient, DatasetRow, Result, Schema};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.geckoboard.com";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 4xx answer, carries the message found in the response body.
    #[error("response error: {0}")]
    Response(String),
    #[error("Unexpected server error response from the dataset API")]
    Unexpected,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct DataPayload<'a> {
    data: &'a [DatasetRow],
}

/// Dataset API client authenticating with the API key as the basic auth user.
#[derive(Debug, Clone)]
pub struct HttpDatasetClient {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

impl HttpDatasetClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_api_url(api_key, DEFAULT_API_URL)
    }

    pub fn with_api_url(api_key: impl Into<String>, api_url: impl AsRef<str>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("While building the http client")?;
        Ok(Self {
            http_client,
            api_url: api_url.as_ref().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.api_url, path))
            .basic_auth(&self.api_key, Some(""))
    }

    async fn send(&self, method: Method, path: String, request: RequestBuilder) -> Result<()> {
        let response = request
            .send()
            .await
            .with_context(|| format!("While sending {} {}", method, path))?;
        handle_response(response).await
    }
}

async fn handle_response(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    if status.is_client_error() {
        let body: ErrorBody = response.json().await.unwrap_or_default();
        return Err(ApiError::Response(body.error.message).into());
    }
    log::debug!("Dataset API answered with status {}", status);
    Err(ApiError::Unexpected.into())
}

impl DatasetClient for HttpDatasetClient {
    async fn upsert_schema(&self, schema: &Schema) -> Result<()> {
        let path = format!("/datasets/{}", schema.id());
        let request = self.request(Method::PUT, &path).json(schema);
        self.send(Method::PUT, path, request).await
    }

    async fn replace_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
        let path = format!("/datasets/{dataset}/data");
        let request = self
            .request(Method::PUT, &path)
            .json(&DataPayload { data: rows });
        self.send(Method::PUT, path, request).await
    }

    async fn append_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
        let path = format!("/datasets/{dataset}/data");
        let request = self
            .request(Method::POST, &path)
            .json(&DataPayload { data: rows });
        self.send(Method::POST, path, request).await
    }

    async fn delete_dataset(&self, dataset: &str) -> Result<()> {
        let path = format!("/datasets/{dataset}");
        let request = self.request(Method::DELETE, &path);
        self.send(Method::DELETE, path, request).await
    }
}
