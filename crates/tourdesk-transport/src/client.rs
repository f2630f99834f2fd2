//! REST client for the back-office API, built on [`reqwest`].
//!
//! Every request builder handed out by [`ApiClient`] already carries the
//! current value of the shared Authorization slot, so screens that list
//! hotels or post a mission order never deal with tokens themselves.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{AuthorizationReader, TransportError};

/// HTTP client bound to one API base URL and one Authorization slot.
///
/// Cloning is cheap: `reqwest::Client` is reference-counted internally
/// and the slot reader is an `Arc`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthorizationReader,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `https://api.agence.tn/v1`).
    pub fn new(base_url: impl Into<String>, auth: AuthorizationReader) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, auth)
    }

    /// Creates a client whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns [`TransportError::Request`] if the TLS backend fails to
    /// initialise.
    pub fn with_timeout(
        base_url: impl Into<String>,
        auth: AuthorizationReader,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, auth))
    }

    /// Creates a client reusing an existing [`reqwest::Client`]
    /// (shares its connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        auth: AuthorizationReader,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client,
            base_url,
            auth,
        }
    }

    /// The base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Starts a request with the current Authorization header attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.auth.current() {
            Some(value) => builder.header(AUTHORIZATION, value),
            None => builder,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Sends a request and rejects any non-2xx status.
    pub async fn send(
        &self,
        builder: RequestBuilder,
    ) -> Result<Response, TransportError> {
        let response = builder.send().await?;
        Self::ensure_success(response).await
    }

    /// `GET path` and decode the JSON body.
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, TransportError> {
        let response = self.send(self.get(path)).await?;
        Ok(response.json::<R>().await?)
    }

    /// `POST path` with a JSON body and decode the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, TransportError> {
        let response = self.send(self.post(path).json(body)).await?;
        Ok(response.json::<R>().await?)
    }

    // ---- private helpers ----

    /// Returns the response unchanged on success, or an error carrying
    /// the status and body text.
    async fn ensure_success(
        response: Response,
    ) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_owned();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        tracing::debug!(status = status.as_u16(), %url, "API request rejected");

        if status == reqwest::StatusCode::UNAUTHORIZED {
            Err(TransportError::Unauthorized { body })
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthorizationSlot;

    fn client(base: &str) -> ApiClient {
        let (_writer, reader) = AuthorizationSlot::new();
        ApiClient::new(base, reader)
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = client("http://localhost:8080/api/");

        assert_eq!(api.base_url(), "http://localhost:8080/api");
        assert_eq!(api.url("/auth/login"), "http://localhost:8080/api/auth/login");
        assert_eq!(api.url("hotels"), "http://localhost:8080/api/hotels");
    }

    #[test]
    fn test_request_without_token_has_no_authorization() {
        let api = client("http://localhost");

        let req = api.get("/agences").build().unwrap();

        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_request_picks_up_token_set_after_construction() {
        let (writer, reader) = AuthorizationSlot::new();
        let api = ApiClient::new("http://localhost", reader);

        writer.set_bearer("tok-7").unwrap();
        let req = api.post("/bus").build().unwrap();

        assert_eq!(req.headers()[AUTHORIZATION], "Bearer tok-7");

        writer.clear();
        let req = api.post("/bus").build().unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }
}
