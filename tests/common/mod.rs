#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use up_report::config::ServiceConfig;
use up_report::EntityKind;
use uuid::Uuid;

pub const SYSTEM_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000001";
pub const PROCESS_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000002";
pub const ELECTRICITY_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000003";
pub const ENERGY_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000004";
pub const GAS_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000005";
pub const UNITS_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000006";
pub const MWH_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000007";
pub const TEXAS_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000010";
pub const PARAM_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000020";
pub const OWNER_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000030";
pub const REVIEWER_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000031";
pub const SOURCE_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000040";
pub const GLOBAL_USED_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000050";
pub const GLOBAL_UNUSED_ID: &str = "5f2b8a6e-1c3d-4e5f-8a9b-000000000051";

pub fn id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap()
}

/// The ERCOT 2030 grid mix: one product system, its reference process and
/// everything the process points at
pub fn ercot_2030() -> Vec<Value> {
    vec![
        json!({
            "@type": "ProductSystem",
            "@id": SYSTEM_ID,
            "name": "ERCOT 2030",
            "category": "Electricity",
            "refProcess": {"@type": "Process", "@id": PROCESS_ID, "name": "Electricity, at grid, ERCOT, 2030"},
            "processes": [{"@type": "Process", "@id": PROCESS_ID}],
            "targetAmount": 1.0
        }),
        json!({
            "@type": "Process",
            "@id": PROCESS_ID,
            "name": "Electricity, at grid, ERCOT, 2030",
            "category": "Electricity/Grid",
            "description": "Grid mix for the ERCOT region in 2030.",
            "version": "00.00.001",
            "processType": "UNIT_PROCESS",
            "defaultAllocationMethod": "PHYSICAL_ALLOCATION",
            "location": {"@type": "Location", "@id": TEXAS_ID, "name": "US-TX"},
            "exchanges": [
                {
                    "internalId": 1,
                    "amount": 1.0,
                    "isInput": false,
                    "isQuantitativeReference": true,
                    "flow": {"@type": "Flow", "@id": ELECTRICITY_ID, "name": "electricity, at grid"},
                    "unit": {"@type": "Unit", "@id": MWH_ID, "name": "MWh"},
                    "flowProperty": {"@type": "FlowProperty", "@id": ENERGY_ID, "name": "Energy"}
                },
                {
                    "internalId": 2,
                    "amount": 1234.56,
                    "amountFormula": "heat_rate * 164.608 * (1 + grid_loss)",
                    "isInput": true,
                    "isQuantitativeReference": false,
                    "flow": {"@type": "Flow", "@id": GAS_ID, "name": "natural gas"},
                    "unit": {"@type": "Unit", "@id": MWH_ID, "name": "MWh"},
                    "dqEntry": "(1;2;3;4;5)"
                }
            ],
            "parameters": [
                {
                    "@type": "Parameter",
                    "@id": PARAM_ID,
                    "name": "heat_rate",
                    "parameterScope": "PROCESS_SCOPE",
                    "isInputParameter": true,
                    "value": 7.5
                }
            ],
            "processDocumentation": {
                "validFrom": "2030-01-01",
                "validUntil": "2030-12-31",
                "creationDate": "2024-05-01T10:00:00Z",
                "technologyDescription": "Dispatch-weighted mix of generators.",
                "reviewer": {"@type": "Actor", "@id": OWNER_ID, "name": "Jo Analyst"},
                "dataSetOwner": {"@type": "Actor", "@id": OWNER_ID, "name": "Jo Analyst"},
                "sources": [{"@type": "Source", "@id": SOURCE_ID, "name": "eGRID"}]
            }
        }),
        json!({
            "@type": "Flow",
            "@id": ELECTRICITY_ID,
            "name": "electricity, at grid",
            "category": "Technosphere Flows",
            "flowType": "PRODUCT_FLOW",
            "flowProperties": [
                {
                    "flowProperty": {"@type": "FlowProperty", "@id": ENERGY_ID, "name": "Energy"},
                    "conversionFactor": 1.0,
                    "isRefFlowProperty": true
                }
            ]
        }),
        json!({
            "@type": "Flow",
            "@id": GAS_ID,
            "name": "natural gas",
            "category": "Resources",
            "flowType": "ELEMENTARY_FLOW",
            "flowProperties": [
                {
                    "flowProperty": {"@type": "FlowProperty", "@id": ENERGY_ID, "name": "Energy"},
                    "conversionFactor": 1.0,
                    "isRefFlowProperty": true
                }
            ]
        }),
        json!({
            "@type": "FlowProperty",
            "@id": ENERGY_ID,
            "name": "Energy",
            "flowPropertyType": "PHYSICAL_QUANTITY",
            "unitGroup": {"@type": "UnitGroup", "@id": UNITS_ID, "name": "Units of energy"}
        }),
        json!({
            "@type": "UnitGroup",
            "@id": UNITS_ID,
            "name": "Units of energy",
            "defaultFlowProperty": {"@type": "FlowProperty", "@id": ENERGY_ID},
            "units": [
                {"@id": MWH_ID, "name": "MWh", "conversionFactor": 1.0, "isRefUnit": true}
            ]
        }),
        json!({
            "@type": "Location",
            "@id": TEXAS_ID,
            "name": "US-TX",
            "code": "US-TX"
        }),
        json!({
            "@type": "Actor",
            "@id": OWNER_ID,
            "name": "Jo Analyst",
            "email": "jo@example.org"
        }),
        json!({
            "@type": "Actor",
            "@id": REVIEWER_ID,
            "name": "Sam Reviewer"
        }),
        json!({
            "@type": "Source",
            "@id": SOURCE_ID,
            "name": "eGRID",
            "year": 2022,
            "textReference": "Emissions & Generation Resource Integrated Database",
            "url": "https://www.epa.gov/egrid"
        }),
        json!({
            "@type": "Parameter",
            "@id": GLOBAL_USED_ID,
            "name": "grid_loss",
            "parameterScope": "GLOBAL_SCOPE",
            "isInputParameter": true,
            "value": 0.05
        }),
        json!({
            "@type": "Parameter",
            "@id": GLOBAL_UNUSED_ID,
            "name": "unrelated_factor",
            "parameterScope": "GLOBAL_SCOPE",
            "isInputParameter": true,
            "value": 2.0
        }),
    ]
}

/// The same dataset with the process location pointing at an actor
pub fn ercot_2030_misfiled_location() -> Vec<Value> {
    let mut docs = ercot_2030();
    for doc in docs.iter_mut() {
        if doc["@id"] == PROCESS_ID {
            doc["location"] = json!({"@id": OWNER_ID, "name": "US-TX"});
        }
    }
    docs
}

/// The same dataset with `count` copies of the reference exchange
pub fn ercot_2030_functional_units(count: usize) -> Vec<Value> {
    let mut docs = ercot_2030();
    for doc in docs.iter_mut() {
        if doc["@id"] == PROCESS_ID {
            let exchanges = doc["exchanges"].as_array_mut().unwrap();
            let reference = exchanges.remove(0);
            for n in 0..count {
                let mut copy = reference.clone();
                copy["internalId"] = json!(10 + n);
                exchanges.push(copy);
            }
        }
    }
    docs
}

/// Write `docs` as a JSON-LD zip, one `<folder>/<uuid>.json` entry per
/// document, in the given order
pub fn write_archive(dir: &Path, name: &str, docs: &[Value]) -> PathBuf {
    write_archive_as(dir, name, docs, &[])
}

/// Like `write_archive`, but the documents at the given positions go to the
/// named folder instead of the one their `@type` implies
pub fn write_archive_as(
    dir: &Path,
    name: &str,
    docs: &[Value],
    folders: &[(usize, &str)],
) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (i, doc) in docs.iter().enumerate() {
        let folder = match folders.iter().find(|(at, _)| *at == i) {
            Some((_, folder)) => folder.to_string(),
            None => EntityKind::from_type_name(doc["@type"].as_str().unwrap())
                .unwrap()
                .folder()
                .to_string(),
        };
        let entry = format!("{}/{}.json", folder, doc["@id"].as_str().unwrap());
        zip.start_file(entry, options).unwrap();
        zip.write_all(serde_json::to_string_pretty(doc).unwrap().as_bytes())
            .unwrap();
    }
    zip.finish().unwrap();
    path
}

/// In-process stand-in for the modeling service's JSON-RPC interface
#[derive(Clone, Default)]
pub struct MockService {
    docs: Arc<Mutex<Vec<Value>>>,
    calls: Arc<AtomicUsize>,
    /// Requests still to be answered only after `STALL`
    stalled: Arc<AtomicUsize>,
}

/// Longer than any client timeout used in tests
pub const STALL: Duration = Duration::from_secs(3);

impl MockService {
    pub fn new(docs: Vec<Value>) -> Self {
        Self {
            docs: Arc::new(Mutex::new(docs)),
            ..Self::default()
        }
    }

    /// Hold back the next `n` replies past the client timeout
    pub fn stall_next(&self, n: usize) {
        self.stalled.store(n, Ordering::SeqCst);
    }

    /// Requests received so far, stalled ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn document(&self, kind: &str, id: &str) -> Option<Value> {
        self.docs
            .lock()
            .iter()
            .find(|d| d["@type"] == kind && d["@id"] == id)
            .cloned()
    }

    fn dispatch(&self, method: &str, params: &Value) -> Result<Value, (i64, String)> {
        let mut docs = self.docs.lock();
        match method {
            "data/get/descriptors" => Ok(Value::Array(
                docs.iter()
                    .filter(|d| d["@type"] == params["@type"])
                    .map(descriptor)
                    .collect(),
            )),
            "data/get" => docs
                .iter()
                .find(|d| d["@type"] == params["@type"] && d["@id"] == params["@id"])
                .cloned()
                .ok_or_else(|| (404, format!("{} not found", params["@id"]))),
            "data/put" => {
                let reply = descriptor(params);
                match docs
                    .iter_mut()
                    .find(|d| d["@type"] == params["@type"] && d["@id"] == params["@id"])
                {
                    Some(existing) => *existing = params.clone(),
                    None => docs.push(params.clone()),
                }
                Ok(reply)
            }
            other => Err((-32601, format!("unknown method {}", other))),
        }
    }
}

fn descriptor(doc: &Value) -> Value {
    let mut out = json!({"@type": doc["@type"], "@id": doc["@id"]});
    for key in ["name", "category"] {
        if let Some(value) = doc.get(key) {
            out[key] = value.clone();
        }
    }
    out
}

async fn rpc(State(service): State<MockService>, Json(request): Json<Value>) -> Json<Value> {
    service.calls.fetch_add(1, Ordering::SeqCst);
    let stall = service
        .stalled
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if stall {
        tokio::time::sleep(STALL).await;
    }
    let method = request["method"].as_str().unwrap_or_default();
    let reply = match service.dispatch(method, &request["params"]) {
        Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": {"code": code, "message": message}
        }),
    };
    Json(reply)
}

fn router(service: &MockService) -> Router {
    Router::new()
        .route("/", post(rpc))
        .with_state(service.clone())
}

/// Serve `docs` on an ephemeral local port
pub async fn spawn_service(docs: Vec<Value>) -> (ServiceConfig, MockService) {
    let service = MockService::new(docs);
    let app = router(&service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (service_config(port), service)
}

/// Serve `docs` on a port that only starts listening after `delay`;
/// until then connections are refused
pub async fn spawn_service_after(docs: Vec<Value>, delay: Duration) -> (ServiceConfig, MockService) {
    let service = MockService::new(docs);
    let app = router(&service);
    let port = closed_port().await;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });
    (service_config(port), service)
}

pub fn service_config(port: u16) -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port,
        timeout_secs: 5,
        retries: 0,
        retry_backoff_ms: 10,
    }
}

/// A local port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
