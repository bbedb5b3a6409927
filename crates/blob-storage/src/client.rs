//! Blob service client contract + a REST implementation of "List Containers".
//!
//! The toolbox only needs one operation (enumerate the containers visible to a credential), so
//! this is deliberately not a general storage SDK.

use crate::credential::TokenCredential;
use crate::endpoint::redact_url;
use crate::error::{BlobStorageError, Result};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

/// REST API version sent with every request. Bearer auth needs 2017-11-09 or later.
pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// Upper bound on listing pages followed for one call.
const MAX_PAGES: usize = 1000;

static CONTAINER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Container>.*?<Name>(.*?)</Name>").expect("valid container regex")
});
static NEXT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<NextMarker>(.*?)</NextMarker>").expect("valid marker regex"));
static ERROR_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Code>(.*?)</Code>").expect("valid error code regex"));

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerItem {
    pub name: String,
}

/// A storage client bound to one account endpoint and one credential.
#[async_trait]
pub trait BlobServiceClient: Send + Sync {
    /// List every container visible to the client's credential, following continuation markers.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential fails, the service rejects the request, or the
    /// response cannot be decoded.
    async fn list_containers(&self) -> Result<Vec<ContainerItem>>;
}

/// Builds per-request clients. Shared across requests; the clients it returns are not.
pub trait BlobServiceConnector: Send + Sync {
    fn connect(
        &self,
        endpoint: Url,
        credential: Arc<dyn TokenCredential>,
    ) -> Arc<dyn BlobServiceClient>;
}

/// Connector backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct RestBlobServiceConnector {
    http: reqwest::Client,
}

impl RestBlobServiceConnector {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (TLS backend init).
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("unrelated-blob-storage/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }

    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl BlobServiceConnector for RestBlobServiceConnector {
    fn connect(
        &self,
        endpoint: Url,
        credential: Arc<dyn TokenCredential>,
    ) -> Arc<dyn BlobServiceClient> {
        Arc::new(RestBlobServiceClient {
            http: self.http.clone(),
            endpoint,
            credential,
        })
    }
}

pub struct RestBlobServiceClient {
    http: reqwest::Client,
    endpoint: Url,
    credential: Arc<dyn TokenCredential>,
}

impl RestBlobServiceClient {
    fn list_url(&self, marker: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut q = url.query_pairs_mut();
            q.clear();
            q.append_pair("comp", "list");
            if let Some(m) = marker {
                q.append_pair("marker", m);
            }
        }
        url
    }

    async fn list_page(&self, marker: Option<&str>) -> Result<ListPage> {
        let token = self.credential.get_token().await?;
        let url = self.list_url(marker);

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(token.secret())
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(
                "x-ms-date",
                Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            )
            .send()
            .await?;

        let status = resp.status();
        let header_code = resp
            .headers()
            .get("x-ms-error-code")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;

        if !status.is_success() {
            let code = header_code.or_else(|| {
                ERROR_CODE_RE
                    .captures(&body)
                    .map(|c| unescape_xml(c[1].trim()))
            });
            tracing::debug!(
                url = %redact_url(&url),
                status = status.as_u16(),
                code = code.as_deref().unwrap_or(""),
                "list containers request rejected"
            );
            return Err(BlobStorageError::Status {
                status: status.as_u16(),
                code,
            });
        }

        parse_list_page(&body)
    }
}

#[async_trait]
impl BlobServiceClient for RestBlobServiceClient {
    async fn list_containers(&self) -> Result<Vec<ContainerItem>> {
        let mut containers = Vec::new();
        let mut marker: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.list_page(marker.as_deref()).await?;
            containers.extend(page.containers);
            match page.next_marker {
                Some(m) => marker = Some(m),
                None => return Ok(containers),
            }
        }

        Err(BlobStorageError::Decode(format!(
            "listing did not finish after {MAX_PAGES} pages"
        )))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ListPage {
    containers: Vec<ContainerItem>,
    next_marker: Option<String>,
}

fn parse_list_page(body: &str) -> Result<ListPage> {
    if !body.contains("<EnumerationResults") {
        return Err(BlobStorageError::Decode(
            "missing EnumerationResults element".to_string(),
        ));
    }

    let containers = CONTAINER_NAME_RE
        .captures_iter(body)
        .map(|c| ContainerItem {
            name: unescape_xml(c[1].trim()),
        })
        .collect();

    let next_marker = NEXT_MARKER_RE
        .captures(body)
        .map(|c| unescape_xml(c[1].trim()))
        .filter(|m| !m.is_empty());

    Ok(ListPage {
        containers,
        next_marker,
    })
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
