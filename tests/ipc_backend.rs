mod common;

use std::time::Duration;

use common::*;
use up_report::store::IpcBackend;
use up_report::{Backend, BackendConfig, Depth, Entity, EntityKind, EntityStore, LcaError};

async fn connect(config: &up_report::config::ServiceConfig) -> EntityStore {
    EntityStore::connect(&BackendConfig::Service(config.clone()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unreachable_service_is_connection_error() {
    let port = closed_port().await;
    let err = IpcBackend::connect(&service_config(port)).await.err().unwrap();
    match err {
        LcaError::Connection { endpoint, .. } => assert_eq!(endpoint, format!("127.0.0.1:{}", port)),
        other => panic!("expected connection error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connect_retries_until_service_listens() {
    let (mut config, service) =
        spawn_service_after(ercot_2030(), Duration::from_millis(50)).await;
    config.retries = 3;
    config.retry_backoff_ms = 200;

    let backend = IpcBackend::connect(&config).await.unwrap();
    assert_eq!(service.calls(), 1);
    let systems = backend.list(EntityKind::ProductSystem).await.unwrap();
    assert_eq!(systems.len(), 1);
}

#[tokio::test]
async fn test_refused_without_retries_is_connection_error() {
    let (config, _service) =
        spawn_service_after(ercot_2030(), Duration::from_millis(500)).await;
    assert_eq!(config.retries, 0);

    let err = IpcBackend::connect(&config).await.err().unwrap();
    assert!(matches!(err, LcaError::Connection { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_timed_out_call_is_retried() {
    let (mut config, service) = spawn_service(ercot_2030()).await;
    config.timeout_secs = 1;
    config.retries = 2;
    let backend = IpcBackend::connect(&config).await.unwrap();
    assert_eq!(service.calls(), 1);

    service.stall_next(1);
    let systems = backend.list(EntityKind::ProductSystem).await.unwrap();
    assert_eq!(systems.len(), 1);
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn test_timeouts_past_retry_budget_are_connection_error() {
    let (mut config, service) = spawn_service(ercot_2030()).await;
    config.timeout_secs = 1;
    config.retries = 1;
    let backend = IpcBackend::connect(&config).await.unwrap();

    service.stall_next(2);
    let err = backend.list(EntityKind::ProductSystem).await.unwrap_err();
    assert!(matches!(err, LcaError::Connection { .. }), "got {:?}", err);
    // the probe, then one attempt plus one retry
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn test_list_and_fetch() {
    let (config, _service) = spawn_service(ercot_2030()).await;
    let backend = IpcBackend::connect(&config).await.unwrap();
    assert_eq!(backend.endpoint(), config.endpoint());

    let systems = backend.list(EntityKind::ProductSystem).await.unwrap();
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].name.as_deref(), Some("ERCOT 2030"));

    let entity = backend.fetch(EntityKind::Process, id(PROCESS_ID)).await.unwrap();
    let Entity::Process(process) = entity else {
        panic!("expected a process");
    };
    assert_eq!(process.exchanges.len(), 2);
    assert_eq!(process.functional_units().count(), 1);

    let err = backend
        .fetch(EntityKind::Process, id(SYSTEM_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, LcaError::NotFound { .. }));
}

#[tokio::test]
async fn test_closed_client_refuses_calls() {
    let (config, _service) = spawn_service(ercot_2030()).await;
    let backend = IpcBackend::connect(&config).await.unwrap();
    backend.close().await.unwrap();

    let err = backend.list(EntityKind::Actor).await.unwrap_err();
    assert!(matches!(err, LcaError::Connection { .. }));
}

#[tokio::test]
async fn test_edit_commit_refetch() {
    let (config, service) = spawn_service(ercot_2030()).await;
    let store = connect(&config).await;

    store
        .edit(
            EntityKind::Process,
            id(PROCESS_ID),
            "processDocumentation.reviewer",
            REVIEWER_ID,
        )
        .await
        .unwrap();
    store
        .edit(
            EntityKind::Process,
            id(PROCESS_ID),
            "processDocumentation.timeDescription",
            "Calendar year 2030",
        )
        .await
        .unwrap();
    assert_eq!(store.dirty().await.len(), 1);

    store.commit(EntityKind::Process, id(PROCESS_ID)).await.unwrap();
    assert!(store.dirty().await.is_empty());

    let fresh = store.refetch(EntityKind::Process, id(PROCESS_ID)).await.unwrap();
    let Entity::Process(process) = fresh else {
        panic!("expected a process");
    };
    let doc = process.process_documentation.unwrap();
    let reviewer = doc.reviewer.unwrap();
    assert_eq!(reviewer.id, id(REVIEWER_ID));
    assert_eq!(reviewer.name.as_deref(), Some("Sam Reviewer"));
    assert_eq!(reviewer.declared_kind(), Some(EntityKind::Actor));
    assert_eq!(doc.time_description.as_deref(), Some("Calendar year 2030"));

    // untouched fields survive the round trip through the service
    assert_eq!(doc.valid_from.as_deref(), Some("2030-01-01"));
    assert_eq!(process.exchanges.len(), 2);

    let stored = service.document("Process", PROCESS_ID).unwrap();
    assert_eq!(stored["processDocumentation"]["reviewer"]["@id"], REVIEWER_ID);
}

#[tokio::test]
async fn test_invalid_edits_change_nothing() {
    let (config, _service) = spawn_service(ercot_2030()).await;
    let store = connect(&config).await;
    let process = id(PROCESS_ID);
    let before = store.get(EntityKind::Process, process).await.unwrap().read().clone();

    // a location is not an actor
    let err = store
        .edit(EntityKind::Process, process, "processDocumentation.reviewer", TEXAS_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, LcaError::Validation { .. }), "got {:?}", err);

    let err = store
        .edit(EntityKind::Process, process, "processDocumentation.reviewer", "not-a-uuid")
        .await
        .unwrap_err();
    assert!(matches!(err, LcaError::Validation { .. }));

    let err = store
        .edit(EntityKind::Process, process, "@id", PROCESS_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, LcaError::Validation { .. }));

    let err = store
        .edit(EntityKind::Process, process, "isInfrastructureProcess", "maybe")
        .await
        .unwrap_err();
    assert!(matches!(err, LcaError::Validation { .. }));

    let after = store.get(EntityKind::Process, process).await.unwrap().read().clone();
    assert_eq!(before, after);
    assert!(store.dirty().await.is_empty());
}

#[tokio::test]
async fn test_edits_visible_through_selected_graph() {
    let (config, _service) = spawn_service(ercot_2030()).await;
    let store = connect(&config).await;
    let graph = store
        .select(EntityKind::ProductSystem, id(SYSTEM_ID), Depth::Full)
        .await
        .unwrap();

    store
        .edit(EntityKind::Process, id(PROCESS_ID), "description", "Revised mix")
        .await
        .unwrap();

    let process = graph.follow(&graph.root, "refProcess").unwrap();
    assert_eq!(process.read().root().description.as_deref(), Some("Revised mix"));
}
