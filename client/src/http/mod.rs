//! Outbound HTTP to the monitoring API.
//!
//! Credentials are injected per request from the [`SessionStore`]; there is
//! no shared default header to keep in sync. A 401 from any endpoint clears
//! the stored session and is announced on the [`SessionEvent`] channel, and
//! the original failure is still returned to the caller.

use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use crate::session::SessionStore;
use reqwest::{Client, RequestBuilder, StatusCode, Url, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::broadcast;
use tracing::{debug, error, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Standard envelope wrapping every API response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Session changes made by the adapter on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the stored credentials and they were cleared.
    Expired,
}

#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: Url,
    session: SessionStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionStore) -> ClientResult<Self> {
        let mut base = config.api_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::validation(format!("Invalid API_URL '{}': {}", base, e)))?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::network(format!("Failed to create HTTP client: {}", e)))?;

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            http_client,
            base_url,
            session,
            events,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Subscribes to sessions being cleared by the adapter.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::validation(format!("Invalid request path '{}': {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.http_client.get(self.url(path)?).query(query);
        self.send(request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.http_client.post(self.url(path)?).json(body);
        self.send(request).await
    }

    /// Attaches credentials, sends, and maps the response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let request_id = Uuid::now_v7().to_string();
        let mut request = request.header(REQUEST_ID_HEADER, &request_id);

        if let Some(token) = self.session.token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            debug!(%request_id, "Transport failure: {}", e);
            ClientError::network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::network(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized().await;
            return Err(ClientError::http(status.as_u16(), body));
        }

        if !status.is_success() {
            debug!(%request_id, status = status.as_u16(), "Request rejected");
            return Err(ClientError::http(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ClientError::decode(format!("Unexpected response body: {}", e)))
    }

    async fn handle_unauthorized(&self) {
        if let Err(e) = self.session.clear().await {
            error!("Failed to clear session after 401: {}", e);
        }
        warn!("Unauthorized. Session cleared.");
        // Nobody listening is fine
        let _ = self.events.send(SessionEvent::Expired);
    }
}
