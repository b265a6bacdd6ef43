use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{LcaError, Result};
use crate::model::{Entity, EntityKind};
use crate::store::traits::{Backend, Descriptor};

/// JSON-RPC error code the service uses for missing documents
const NOT_FOUND_CODE: i64 = 404;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Client for the modeling service's JSON-RPC interface
pub struct IpcBackend {
    client: reqwest::Client,
    url: String,
    endpoint: String,
    config: ServiceConfig,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl IpcBackend {
    /// Build the client and probe the service once, so an unreachable
    /// endpoint fails here rather than on first use
    pub async fn connect(config: &ServiceConfig) -> Result<Self> {
        let endpoint = config.endpoint();
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LcaError::connection(&endpoint, e))?;
        let backend = Self {
            client,
            url: config.url(),
            endpoint,
            config: config.clone(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        };
        backend
            .call("data/get/descriptors", json!({ "@type": EntityKind::ProductSystem }))
            .await?
            .map_err(|e| backend.service_error(e))?;
        log::info!("connected to modeling service at {}", backend.endpoint);
        Ok(backend)
    }

    fn service_error(&self, e: RpcError) -> LcaError {
        LcaError::connection(
            &self.endpoint,
            format!("service error {}: {}", e.code, e.message),
        )
    }

    /// One JSON-RPC round trip with retries on transient transport failures.
    ///
    /// The outer error is transport level; the inner one is the service's
    /// own JSON-RPC error object.
    async fn call(&self, method: &str, params: Value) -> Result<std::result::Result<Value, RpcError>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LcaError::connection(&self.endpoint, "connection is closed"));
        }
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            method,
            params,
        };

        let mut attempt = 0;
        let response = loop {
            match self.client.post(&self.url).json(&request).send().await {
                Ok(response) => break response,
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.config.retries => {
                    attempt += 1;
                    log::warn!(
                        "{} to {} failed ({}), retry {}/{}",
                        method,
                        self.endpoint,
                        e,
                        attempt,
                        self.config.retries
                    );
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
                Err(e) => return Err(LcaError::connection(&self.endpoint, e)),
            }
        };

        if !response.status().is_success() {
            return Err(LcaError::connection(
                &self.endpoint,
                format!("HTTP {}", response.status()),
            ));
        }
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LcaError::connection(&self.endpoint, e))?;

        match (body.error, body.result) {
            (Some(error), _) => Ok(Err(error)),
            (None, result) => Ok(Ok(result.unwrap_or(Value::Null))),
        }
    }
}

#[async_trait::async_trait]
impl Backend for IpcBackend {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Descriptor>> {
        let result = self
            .call("data/get/descriptors", json!({ "@type": kind }))
            .await?
            .map_err(|e| self.service_error(e))?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result)
            .map_err(|e| LcaError::Schema(format!("descriptors of {}: {}", kind, e)))
    }

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> Result<Entity> {
        log::debug!("service fetch {} {}", kind, id);
        let result = match self
            .call("data/get", json!({ "@type": kind, "@id": id }))
            .await?
        {
            Ok(Value::Null) => return Err(LcaError::NotFound { kind, id }),
            Ok(value) => value,
            Err(e) if e.code == NOT_FOUND_CODE => return Err(LcaError::NotFound { kind, id }),
            Err(e) => return Err(self.service_error(e)),
        };
        let entity: Entity = serde_json::from_value(result)
            .map_err(|e| LcaError::Schema(format!("{} {}: {}", kind, id, e)))?;
        if entity.kind() != kind || entity.id() != id {
            return Err(LcaError::Schema(format!(
                "requested {} {} but the service returned {} {}",
                kind,
                id,
                entity.kind(),
                entity.id()
            )));
        }
        Ok(entity)
    }

    async fn write(&self, entity: &Entity) -> Result<()> {
        let params = serde_json::to_value(entity)
            .map_err(|e| LcaError::Schema(format!("cannot encode {}: {}", entity.id(), e)))?;
        self.call("data/put", params)
            .await?
            .map_err(|e| self.service_error(e))?;
        log::info!("wrote {} {} to {}", entity.kind(), entity.id(), self.endpoint);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("disconnected from {}", self.endpoint);
        }
        Ok(())
    }
}
