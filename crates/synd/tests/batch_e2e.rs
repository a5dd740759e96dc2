//! Batch files end to end: a job assembles entities, writes a batch file,
//! and the service scans and resolves it.

use serde_json::json;
use synd::{BatchRequest, RootConfig, RootError, SyndicationService};
use synd_entity::EntityError;

fn service() -> SyndicationService {
    let mut config = RootConfig::default();
    config.identity.hostname = "syndicate.example.com".into();
    SyndicationService::new(config).unwrap()
}

fn batch_file(name: &str, body: &serde_json::Value) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("synd-e2e-{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("batch.json");
    std::fs::write(&path, serde_json::to_vec_pretty(body).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn scan_then_resolve_from_file() {
    let svc = service();

    let mut alice = svc.create_entity("alice", "dm-person", "job-1").unwrap();
    alice
        .add_property("givenName", "s-alice", "givenName", "jwt-a", None)
        .unwrap();
    alice
        .add_property("taxID", "s-alice", "taxID", "jwt-a", None)
        .unwrap();
    let mut bob = svc.create_entity("bob", "dm-person", "job-1").unwrap();
    bob.add_property("givenName", "s-bob", "givenName", "jwt-b", None)
        .unwrap();
    bob.add_property("taxID", "s-bob", "taxID", "jwt-b", None)
        .unwrap();

    let s_alice = json!({
        "@id": "s-alice",
        "@type": ["Person"],
        "givenName": "Alice",
        "taxID": { "@type": "action-7", "@value": "c1" }
    });
    let s_bob = json!({
        "@id": "s-bob",
        "@type": ["Person"],
        "givenName": "Bob",
        "taxID": { "@type": "action-7", "@value": "c2" }
    });

    let path = batch_file(
        "scan-resolve",
        &json!({
            "dataModelId": "dm-person",
            "subjects": [s_alice.clone(), s_bob.clone()],
            "entities": [alice.to_json().unwrap(), bob.to_json().unwrap()],
            "records": [
                { "jti": "jwt-a", "pn_typ": "subject", "pn_pipe": "pipe-A", "pn_subject": s_alice },
                { "jti": "jwt-b", "pn_typ": "subject", "pn_pipe": "pipe-A", "pn_subject": s_bob }
            ]
        }),
    );
    let request = BatchRequest::from_file(&path).await.unwrap();

    // Both tax ids share one privacy action.
    let required = svc.scan(&request).unwrap();
    assert_eq!(
        serde_json::to_value(&required).unwrap(),
        json!([{ "pipeId": "pipe-A", "actionId": "action-7" }])
    );

    let records = svc.resolve(&request).await.unwrap();
    let out = serde_json::to_value(&records).unwrap();
    assert_eq!(
        out,
        json!([
            {
                "@id": "https://pn.id.webshield.io/syndicated_entity/com/example/syndicate#alice",
                "@type": ["http://pn.schema.webshield.io/type#SubjectQueryRestriction"],
                "givenName": "Alice",
                "taxID": { "@type": "action-7", "@value": "c1" }
            },
            {
                "@id": "https://pn.id.webshield.io/syndicated_entity/com/example/syndicate#bob",
                "@type": ["http://pn.schema.webshield.io/type#SubjectQueryRestriction"],
                "givenName": "Bob",
                "taxID": { "@type": "action-7", "@value": "c2" }
            }
        ])
    );

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn incomplete_wire_entity_rejected() {
    let path = batch_file(
        "incomplete",
        &json!({
            "dataModelId": "dm-person",
            "subjects": [],
            "entities": [{ "id": "x", "dataModelId": "dm-person", "properties": {}, "subjects": [] }]
        }),
    );
    let request = BatchRequest::from_file(&path).await.unwrap();

    let err = service().resolve(&request).await.unwrap_err();
    assert!(err.to_string().contains("'job'"), "unexpected error: {}", err);

    let err = service().scan(&request).unwrap_err();
    assert!(matches!(err, RootError::Entity(EntityError::MissingField("job"))));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn missing_batch_file_is_io_error() {
    let err = BatchRequest::from_file(std::path::Path::new("/nonexistent/batch.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, RootError::Io(_)));
}
