//! Generic REST client wrapper around reqwest.

use crate::error::RestError;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generic REST client for making HTTP requests.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client with the given base URL.
    ///
    /// # Arguments
    /// * `base_url` - Base URL for all requests (e.g., "https://openapi.koreainvestment.com:9443")
    /// * `timeout` - Request timeout duration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::RequestBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new REST client with default timeout.
    pub fn with_default_timeout(base_url: &str) -> Result<Self, RestError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request with URL-encoded query parameters.
    ///
    /// # Arguments
    /// * `path` - Request path (e.g., "/uapi/domestic-stock/v1/quotations/inquire-price")
    /// * `query` - Query parameters, encoded by reqwest
    /// * `headers` - Additional headers
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T, RestError> {
        let url = self.build_url(path);
        tracing::debug!(url = %url, "GET request");

        let request = with_headers(self.client.get(&url).query(query), headers);
        let response = request.send().await?;
        handle_response(response).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<T, RestError> {
        let url = self.build_url(path);
        tracing::debug!(url = %url, "POST request (json)");

        let request = with_headers(self.client.post(&url).json(body), headers);
        let response = request.send().await?;
        handle_response(response).await
    }

    /// Make a POST request with a form-encoded body.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T, RestError> {
        let url = self.build_url(path);
        tracing::debug!(url = %url, "POST request (form)");

        let request = with_headers(self.client.post(&url).form(form), headers);
        let response = request.send().await?;
        handle_response(response).await
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> RequestBuilder {
    for (key, value) in headers {
        request = request.header(*key, *value);
    }
    request
}

/// Handle HTTP response and deserialize JSON body.
async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, RestError> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(body = %body, error = %e, "Failed to parse response");
            RestError::Parse(e.to_string())
        })
    } else {
        let body = response.text().await.unwrap_or_default();

        Err(RestError::HttpError {
            status: status.as_u16(),
            message: body,
        })
    }
}
