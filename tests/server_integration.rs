//! Admin HTTP API driven over a real socket.

use std::path::PathBuf;
use std::sync::Arc;

use redirect_desk::config::{Config, DbConfig, I18nConfig, ServerConfig};
use redirect_desk::server::run_server_with_store;
use redirect_desk_core::store::memory::InMemoryStore;
use redirect_desk_core::{ContentDocument, RedirectStore};
use serde_json::{json, Value};

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start a server over a fresh in-memory store; returns its base URL.
async fn start_server() -> (String, Arc<InMemoryStore>) {
    let port = find_free_port();
    let config = Config {
        db: DbConfig {
            path: PathBuf::from("unused.sqlite"),
        },
        server: ServerConfig {
            bind: format!("127.0.0.1:{}", port),
        },
        i18n: I18nConfig::default(),
    };

    let store = Arc::new(InMemoryStore::new());
    store
        .put_content(&ContentDocument {
            id: "post-1".to_string(),
            doc_type: "post".to_string(),
            slug: Some("hello".to_string()),
            language: Some("nl".to_string()),
        })
        .await
        .unwrap();

    let server_store: Arc<dyn RedirectStore> = store.clone();
    tokio::spawn(async move {
        run_server_with_store(&config, server_store).await.unwrap();
    });
    wait_for_server(port).await;

    (format!("http://127.0.0.1:{}", port), store)
}

async fn create(client: &reqwest::Client, base: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/redirects", base))
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (base, _store) = start_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_list_and_content_types() {
    let (base, _store) = start_server().await;
    let client = reqwest::Client::new();

    let resp = create(
        &client,
        &base,
        json!({ "source": "/oud", "destination_type": "internal", "internal_ref": "post-1" }),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = create(
        &client,
        &base,
        json!({
            "source": "/sale",
            "destination_type": "external",
            "external_destination": "https://example.com/sale",
            "type": "temporary"
        }),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let body: Value = client
        .get(format!("{}/redirects?sort=source&direction=asc", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = body["redirects"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["source"], "/oud");
    assert_eq!(rows[0]["resolved_destination"], "/nl/blog/hello");
    assert_eq!(rows[1]["type"], "temporary");
    assert_eq!(body["total"], 2);

    let body: Value = client
        .get(format!("{}/redirects?content_type=post", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["redirects"].as_array().unwrap().len(), 1);

    let body: Value = client
        .get(format!("{}/content-types", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["content_types"], json!(["all", "post"]));
}

#[tokio::test]
async fn test_validation_failure_is_422() {
    let (base, _store) = start_server().await;
    let client = reqwest::Client::new();

    let resp = create(
        &client,
        &base,
        json!({
            "source": "/x",
            "destination_type": "external",
            "external_destination": "ftp://example.com"
        }),
    )
    .await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "validation_failed");
    assert_eq!(
        body["error"]["details"]["errors"],
        json!(["URL must use http or https protocol"])
    );
}

#[tokio::test]
async fn test_validate_endpoint() {
    let (base, _store) = start_server().await;
    let client = reqwest::Client::new();
    let created: Value = create(
        &client,
        &base,
        json!({
            "source": "/taken",
            "destination_type": "external",
            "external_destination": "https://example.com"
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    let id = created["id"].as_str().unwrap();

    let body: Value = client
        .get(format!("{}/redirects/validate?source=/taken", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["is_valid"], false);

    let body: Value = client
        .get(format!(
            "{}/redirects/validate?source=/taken&current_id={}",
            base, id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["is_valid"], true);
}

#[tokio::test]
async fn test_status_update_and_delete() {
    let (base, store) = start_server().await;
    let client = reqwest::Client::new();
    let created: Value = create(
        &client,
        &base,
        json!({
            "source": "/a",
            "destination_type": "external",
            "external_destination": "https://example.com"
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/redirects/{}/status", base, id))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!store.get(&id).await.unwrap().unwrap().is_active);

    let resp = client
        .put(format!("{}/redirects/{}", base, id))
        .json(&json!({
            "source": "/a",
            "destination_type": "external",
            "external_destination": "https://example.org",
            "is_active": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let row: Value = client
        .get(format!("{}/redirects/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(row["external_destination"], "https://example.org");
    assert_eq!(row["is_active"], false);

    let resp = client
        .delete(format!("{}/redirects/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .delete(format!("{}/redirects/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_bad_query_parameter_is_400() {
    let (base, _store) = start_server().await;
    let resp = reqwest::get(format!("{}/redirects?filter=broken-ish", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_store_failure_is_500_and_nothing_changes() {
    let (base, store) = start_server().await;
    let client = reqwest::Client::new();
    let created: Value = create(
        &client,
        &base,
        json!({
            "source": "/a",
            "destination_type": "external",
            "external_destination": "https://example.com"
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    store.set_fail_writes(true);
    let resp = client
        .post(format!("{}/redirects/{}/status", base, id))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "internal");
    assert!(store.get(&id).await.unwrap().unwrap().is_active);
}
