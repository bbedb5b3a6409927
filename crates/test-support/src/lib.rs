//! Helpers for toolbox integration tests: process handling, readiness polling, a minimal
//! JSON-RPC client, and an in-process fake of the Azure Blob list-containers endpoint.

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::Child;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Kills the child process when dropped so a failed test never leaks a server.
pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// The port is not reserved; another process may still take it first.
///
/// # Errors
///
/// Returns an error if an ephemeral localhost port cannot be bound.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll `url` with GET until it answers 2xx.
///
/// # Errors
///
/// Returns an error if `timeout_dur` elapses first.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let deadline = Instant::now() + timeout_dur;
    loop {
        if let Ok(resp) = client.get(url).send().await
            && resp.status().is_success()
        {
            return Ok(());
        }
        anyhow::ensure!(Instant::now() < deadline, "timed out waiting for {url}");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Stateless JSON-RPC client for the toolbox's `POST /mcp` endpoint.
pub struct McpHttpClient {
    client: reqwest::Client,
    url: String,
    next_id: u64,
}

impl McpHttpClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/mcp", base_url.trim_end_matches('/')),
            next_id: 1,
        }
    }

    /// Send one request and return the decoded JSON-RPC response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-200 status, or a non-JSON body.
    pub async fn request(
        &mut self,
        method: &str,
        params: Value,
        authorization: Option<&str>,
    ) -> anyhow::Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let mut req = self
            .client
            .post(&self.url)
            .json(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }));
        if let Some(auth) = authorization {
            req = req.header(AUTHORIZATION, auth);
        }
        let resp = req.send().await.with_context(|| format!("POST {method}"))?;
        anyhow::ensure!(
            resp.status().as_u16() == 200,
            "{method} returned {}",
            resp.status()
        );
        let body: Value = resp.json().await.context("decode JSON-RPC response")?;
        anyhow::ensure!(body.get("id") == Some(&json!(id)), "unexpected id in {body}");
        Ok(body)
    }

    /// Call a tool and return the text of its first content item.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the result has no text content.
    pub async fn call_tool_text(
        &mut self,
        name: &str,
        arguments: Value,
        authorization: Option<&str>,
    ) -> anyhow::Result<String> {
        let body = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
                authorization,
            )
            .await?;
        body.pointer("/result/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .with_context(|| format!("no text content in {body}"))
    }
}

#[derive(Default)]
struct FakeBlobState {
    containers: Vec<String>,
    page_size: usize,
    accepted_token: String,
    seen_authorization: Mutex<Vec<String>>,
}

/// In-process stand-in for `https://{account}.blob.core.windows.net/?comp=list`.
///
/// Serves `GET /{account}?comp=list[&marker=N]`, paging `page_size` names at a time, and
/// answers 403 unless the bearer token matches.
pub struct FakeBlobService {
    base_url: String,
    state: Arc<FakeBlobState>,
}

impl FakeBlobService {
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(
        containers: &[&str],
        page_size: usize,
        accepted_token: &str,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(FakeBlobState {
            containers: containers.iter().map(|c| (*c).to_string()).collect(),
            page_size: page_size.max(1),
            accepted_token: accepted_token.to_string(),
            seen_authorization: Mutex::default(),
        });

        let app = Router::new()
            .route("/{account}", get(list_containers))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind fake blob service")?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
        })
    }

    /// Endpoint template suitable for `--storage-endpoint`.
    #[must_use]
    pub fn endpoint_template(&self) -> String {
        format!("{}/{{account}}", self.base_url)
    }

    /// `Authorization` values received so far, in arrival order.
    #[must_use]
    pub fn seen_authorization(&self) -> Vec<String> {
        self.state
            .seen_authorization
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn list_containers(
    State(state): State<Arc<FakeBlobState>>,
    Path(account): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state
        .seen_authorization
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(authorization.clone());

    if query.get("comp").map(String::as_str) != Some("list") {
        return (StatusCode::BAD_REQUEST, "expected comp=list").into_response();
    }
    if authorization != format!("Bearer {}", state.accepted_token) {
        return (
            StatusCode::FORBIDDEN,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>AuthorizationPermissionMismatch</Code></Error>",
        )
            .into_response();
    }

    let start: usize = query
        .get("marker")
        .and_then(|m| m.parse().ok())
        .unwrap_or(0);
    let end = (start + state.page_size).min(state.containers.len());
    let items: String = state.containers[start.min(end)..end]
        .iter()
        .map(|name| format!("<Container><Name>{name}</Name><Properties /></Container>"))
        .collect();
    let next_marker = if end < state.containers.len() {
        end.to_string()
    } else {
        String::new()
    };

    let body = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <EnumerationResults ServiceEndpoint=\"https://{account}.blob.core.windows.net/\">\
         <Containers>{items}</Containers><NextMarker>{next_marker}</NextMarker></EnumerationResults>"
    );
    (StatusCode::OK, [("content-type", "application/xml")], body).into_response()
}
