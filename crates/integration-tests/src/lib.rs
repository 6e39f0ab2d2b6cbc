//! Integration tests for the Bob's Corn purchase client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bobs-corn-integration-tests
//! ```
//!
//! No external services are needed: [`FakeCornServer`] serves the purchase
//! endpoint in-process on an ephemeral port, replays scripted responses and
//! records every request it receives.
//!
//! # Test Categories
//!
//! - `purchase_client` - HTTP request shape and outcome classification
//! - `purchase_flow` - controller, identity store and HTTP client end to end

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use bobs_corn_storefront::config::{ApiConfig, ConfigError};
use bobs_corn_storefront::purchase::CLIENT_ID_HEADER;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One canned reply of the fake server.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    status: StatusCode,
    retry_after: Option<String>,
    body: String,
    delay: Option<Duration>,
}

impl ScriptedResponse {
    /// 200 with `ok: true` and the given purchase time.
    #[must_use]
    pub fn success(bought_at_millis: i64) -> Self {
        Self::raw(
            StatusCode::OK,
            json!({ "ok": true, "boughtAt": bought_at_millis }).to_string(),
        )
    }

    /// 429 with an optional `Retry-After` header and body hint.
    #[must_use]
    pub fn rate_limited(header_secs: Option<u32>, body_secs: Option<u32>) -> Self {
        let body = body_secs.map_or_else(
            || json!({ "ok": false }),
            |secs| json!({ "ok": false, "retryAfterSeconds": secs }),
        );
        Self {
            retry_after: header_secs.map(|secs| secs.to_string()),
            ..Self::raw(StatusCode::TOO_MANY_REQUESTS, body.to_string())
        }
    }

    /// Any status with a verbatim body.
    #[must_use]
    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
            delay: None,
        }
    }

    /// Set a raw `Retry-After` header value.
    #[must_use]
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    /// Hold the reply back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as seen by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Value of the client identity header.
    pub client_id: Option<String>,
    /// Value of the `Content-Type` header.
    pub content_type: Option<String>,
    /// Raw request body.
    pub body: String,
}

#[derive(Clone, Default)]
struct ServerState {
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process stand-in for the purchase server.
///
/// Serves `POST /api/buy`. Replies are taken from the script in order; once
/// the script runs out every request gets a 500.
pub struct FakeCornServer {
    addr: SocketAddr,
    state: ServerState,
    task: JoinHandle<()>,
}

impl FakeCornServer {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(
        script: impl IntoIterator<Item = ScriptedResponse>,
    ) -> std::io::Result<Self> {
        let state = ServerState {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            requests: Arc::default(),
        };

        let app = Router::new()
            .route("/api/buy", post(buy))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake purchase server stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    /// API base URL, without the `/buy` suffix.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is rejected.
    pub fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        ApiConfig::with_base_url(&self.api_base())
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for FakeCornServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn buy(State(state): State<ServerState>, headers: HeaderMap, body: String) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value: &HeaderValue| value.to_str().ok())
            .map(ToOwned::to_owned)
    };
    let request = RecordedRequest {
        client_id: header(CLIENT_ID_HEADER),
        content_type: header(CONTENT_TYPE.as_str()),
        body,
    };
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);

    let scripted = state
        .script
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
        .unwrap_or_else(|| {
            ScriptedResponse::raw(StatusCode::INTERNAL_SERVER_ERROR, "script exhausted")
        });

    if let Some(delay) = scripted.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = Response::new(Body::from(scripted.body));
    *response.status_mut() = scripted.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(value) = scripted
        .retry_after
        .and_then(|value| HeaderValue::from_str(&value).ok())
    {
        response.headers_mut().insert(RETRY_AFTER, value);
    }
    response
}
