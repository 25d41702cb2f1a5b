//! HTTP Request Executor
//!
//! `HttpNotesClient` talks to the remote NoteHub REST service with `reqwest`.
//! All connection settings arrive through an explicit `ClientConfig` at
//! construction; there is no process-wide client state.
//!
//! # Endpoints
//!
//! - `GET    {base}/notes?page=&perPage=[&search=][&tag=]` - list page
//! - `POST   {base}/notes` - create
//! - `GET    {base}/notes/{id}` - fetch one
//! - `DELETE {base}/notes/{id}` - delete
//!
//! Every request carries `Authorization: Bearer <credential>`. Nothing is
//! retried here; retry is a caller policy.

use crate::client::{ApiError, NotesApi};
use crate::models::{ListResult, NewNote, Note, ViewParams};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Callback fired whenever the service rejects the credential
pub type AuthFailureHook = Arc<dyn Fn() + Send + Sync>;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the Request Executor
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the notes API, e.g. `https://notehub-public.goit.study/api/`
    pub base_endpoint: String,

    /// Static bearer token
    pub credential: String,

    /// Invoked once per request that fails with HTTP 401
    pub on_auth_failure: Option<AuthFailureHook>,

    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_endpoint: base_endpoint.into(),
            credential: credential.into(),
            on_auth_failure: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_auth_failure_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_auth_failure = Some(Arc::new(hook));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_endpoint", &self.base_endpoint)
            .field("credential", &"<redacted>")
            .field("on_auth_failure", &self.on_auth_failure.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Error body returned by the service on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Request Executor backed by the remote REST service
pub struct HttpNotesClient {
    http: reqwest::Client,
    base: Url,
    config: ClientConfig,
}

impl HttpNotesClient {
    /// Build a client from its configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the base endpoint is not a valid
    /// absolute URL or the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut base = config.base_endpoint.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| {
            ApiError::InvalidConfig(format!("base endpoint '{}': {}", config.base_endpoint, e))
        })?;

        if config.credential.trim().is_empty() {
            tracing::warn!("NoteHub credential is missing; requests will be rejected");
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;

        Ok(Self { http, base, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidConfig(format!("path '{}': {}", path, e)))
    }

    /// URL for a list request; empty search and absent tag are omitted
    fn list_url(&self, params: &ViewParams) -> Result<Url, ApiError> {
        let mut url = self.url("notes")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &params.page().to_string());
            query.append_pair("perPage", &params.page_size().to_string());
            if !params.search().is_empty() {
                query.append_pair("search", params.search());
            }
            if let Some(tag) = params.tag() {
                query.append_pair("tag", tag.as_str());
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        if self.config.credential.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.credential)
        }
    }

    /// Send a request and decode a JSON body, mapping failures onto `ApiError`
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::warn!("NoteHub request failed before a response: {}", e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                tracing::error!("Failed to decode NoteHub response: {}", e);
                ApiError::Decode(e.to_string())
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("NoteHub credential rejected (401); it may be invalid or expired");
            if let Some(hook) = &self.config.on_auth_failure {
                hook();
            }
            return Err(ApiError::Auth);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(ErrorBody {
                message: Some(message),
            }) => message,
            _ => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        tracing::error!("NoteHub error [{}]: {}", status.as_u16(), message);
        Err(ApiError::network(Some(status.as_u16()), message))
    }
}

#[async_trait]
impl NotesApi for HttpNotesClient {
    async fn list_notes(&self, params: &ViewParams) -> Result<ListResult, ApiError> {
        let url = self.list_url(params)?;
        tracing::debug!("Fetching notes: {}", url);
        self.send(self.http.get(url)).await
    }

    async fn create_note(&self, note: &NewNote) -> Result<Note, ApiError> {
        let url = self.url("notes")?;
        self.send(self.http.post(url).json(note)).await
    }

    async fn delete_note(&self, id: &str) -> Result<Note, ApiError> {
        let url = self.url(&format!("notes/{}", id))?;
        self.send(self.http.delete(url))
            .await
            .map_err(|e| not_found_for(e, id))
    }

    async fn fetch_note(&self, id: &str) -> Result<Note, ApiError> {
        let url = self.url(&format!("notes/{}", id))?;
        self.send(self.http.get(url))
            .await
            .map_err(|e| not_found_for(e, id))
    }
}

fn not_found_for(error: ApiError, id: &str) -> ApiError {
    match error {
        ApiError::Network {
            status: Some(404), ..
        } => ApiError::not_found(id),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteTag;

    fn client(base: &str) -> HttpNotesClient {
        HttpNotesClient::new(ClientConfig::new(base, "token")).unwrap()
    }

    #[test]
    fn test_base_endpoint_gets_trailing_slash() {
        let client = client("https://notehub.example/api");
        assert_eq!(
            client.url("notes").unwrap().as_str(),
            "https://notehub.example/api/notes"
        );
    }

    #[test]
    fn test_invalid_base_endpoint_is_rejected() {
        let result = HttpNotesClient::new(ClientConfig::new("not a url", "token"));
        assert!(matches!(result, Err(ApiError::InvalidConfig(_))));
    }

    #[test]
    fn test_list_url_omits_empty_filters() {
        let client = client("https://notehub.example/api/");
        let url = client.list_url(&ViewParams::initial(12, None)).unwrap();
        assert_eq!(url.query(), Some("page=1&perPage=12"));
    }

    #[test]
    fn test_list_url_includes_search_and_tag() {
        let client = client("https://notehub.example/api/");
        let params = ViewParams::new(" shopping list ", Some(NoteTag::Shopping), 3, 12);
        let url = client.list_url(&params).unwrap();
        assert_eq!(
            url.query(),
            Some("page=3&perPage=12&search=shopping+list&tag=Shopping")
        );
    }

    #[test]
    fn test_debug_redacts_credential() {
        let config = ClientConfig::new("https://notehub.example/api/", "secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
