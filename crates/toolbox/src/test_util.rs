//! Fakes shared by unit tests.

use crate::config::{HostInfo, StorageSettings};
use crate::context::ToolServices;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use unrelated_blob_storage::client::{BlobServiceClient, BlobServiceConnector, ContainerItem};
use unrelated_blob_storage::credential::TokenCredential;
use unrelated_blob_storage::error::{BlobStorageError, Result};
use url::Url;

#[derive(Default)]
struct FakeState {
    connects: AtomicUsize,
    lists: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    endpoints: Mutex<Vec<String>>,
}

/// In-memory blob service that records what it was asked to do.
#[derive(Clone)]
pub struct FakeBlobConnector {
    containers: Option<Vec<String>>,
    state: Arc<FakeState>,
}

impl FakeBlobConnector {
    pub fn listing(names: &[&str]) -> Self {
        Self {
            containers: Some(names.iter().map(|n| (*n).to_string()).collect()),
            state: Arc::default(),
        }
    }

    /// Every listing fails with a 403.
    pub fn failing() -> Self {
        Self {
            containers: None,
            state: Arc::default(),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn list_count(&self) -> usize {
        self.state.lists.load(Ordering::SeqCst)
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.state.tokens.lock().expect("tokens lock").clone()
    }

    pub fn seen_endpoints(&self) -> Vec<String> {
        self.state.endpoints.lock().expect("endpoints lock").clone()
    }
}

impl BlobServiceConnector for FakeBlobConnector {
    fn connect(
        &self,
        endpoint: Url,
        credential: Arc<dyn TokenCredential>,
    ) -> Arc<dyn BlobServiceClient> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state
            .endpoints
            .lock()
            .expect("endpoints lock")
            .push(endpoint.to_string());
        Arc::new(FakeBlobClient {
            containers: self.containers.clone(),
            credential,
            state: self.state.clone(),
        })
    }
}

struct FakeBlobClient {
    containers: Option<Vec<String>>,
    credential: Arc<dyn TokenCredential>,
    state: Arc<FakeState>,
}

#[async_trait]
impl BlobServiceClient for FakeBlobClient {
    async fn list_containers(&self) -> Result<Vec<ContainerItem>> {
        self.state.lists.fetch_add(1, Ordering::SeqCst);
        let token = self.credential.get_token().await?;
        self.state
            .tokens
            .lock()
            .expect("tokens lock")
            .push(token.secret().to_string());

        match &self.containers {
            Some(names) => Ok(names
                .iter()
                .map(|name| ContainerItem { name: name.clone() })
                .collect()),
            None => Err(BlobStorageError::Status {
                status: 403,
                code: Some("AuthorizationFailure".to_string()),
            }),
        }
    }
}

pub fn services_with(storage: StorageSettings, fake: &FakeBlobConnector) -> ToolServices {
    ToolServices {
        host: Arc::new(HostInfo::new(Some("test-host".to_string()), "0.0.0-test")),
        storage: Arc::new(storage),
        blob_connector: Arc::new(fake.clone()),
    }
}

pub fn services() -> ToolServices {
    services_with(StorageSettings::default(), &FakeBlobConnector::listing(&[]))
}

/// One tracing event with its fields rendered as strings.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub target: String,
    pub level: Level,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Layer that records every event it sees.
#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedEvents {
    pub fn take(&self) -> Vec<CapturedEvent> {
        std::mem::take(&mut *self.0.lock().expect("events lock"))
    }
}

#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        self.0.lock().expect("events lock").push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            fields: fields.0,
        });
    }
}
