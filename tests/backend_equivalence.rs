mod common;

use common::*;
use up_report::report::{AssemblyOptions, ReportTemplate};
use up_report::{build_report, BackendConfig, Depth, EntityKind, EntityStore};

/// The same dataset served both ways
async fn both_backends() -> (tempfile::TempDir, EntityStore, EntityStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "ercot.zip", &ercot_2030());
    let archive = EntityStore::connect(&BackendConfig::Archive { path })
        .await
        .unwrap();

    let (config, _service) = spawn_service(ercot_2030()).await;
    let service = EntityStore::connect(&BackendConfig::Service(config))
        .await
        .unwrap();
    (dir, archive, service)
}

#[tokio::test]
async fn test_summaries_are_equal() {
    let (_dir, archive, service) = both_backends().await;
    for kind in [
        EntityKind::ProductSystem,
        EntityKind::Process,
        EntityKind::Parameter,
        EntityKind::Actor,
        EntityKind::Flow,
        EntityKind::Project,
    ] {
        assert_eq!(
            archive.summaries(kind).await.unwrap(),
            service.summaries(kind).await.unwrap(),
            "{} summaries differ",
            kind
        );
    }
}

#[tokio::test]
async fn test_selected_graphs_are_equal() {
    let (_dir, archive, service) = both_backends().await;
    let from_archive = archive
        .select(EntityKind::ProductSystem, id(SYSTEM_ID), Depth::Full)
        .await
        .unwrap();
    let from_service = service
        .select(EntityKind::ProductSystem, id(SYSTEM_ID), Depth::Full)
        .await
        .unwrap();

    assert_eq!(from_archive.snapshot(), from_service.snapshot());
    assert_eq!(from_archive.links, from_service.links);
}

#[tokio::test]
async fn test_reports_are_equal() {
    let (_dir, archive, service) = both_backends().await;
    let options = AssemblyOptions::default();
    let template = ReportTemplate::default();

    let mut texts = Vec::new();
    for store in [&archive, &service] {
        let graph = store
            .select(EntityKind::ProductSystem, id(SYSTEM_ID), Depth::Full)
            .await
            .unwrap();
        texts.push(build_report(&graph, &options, &template).unwrap().render());
    }
    assert_eq!(texts[0], texts[1]);
}
