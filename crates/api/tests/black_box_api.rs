use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use stockledger_api::app::{self, AppServices};
use stockledger_infra::AppConfig;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        stockledger_observability::init_for_tests();

        // Same router as prod, own database file, ephemeral port.
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = AppConfig::for_database(format!("sqlite://{}", dir.path().join("api.db").display()));
        let services = AppServices::connect(&config).await.expect("failed to open database");
        let app = app::router(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn warehouse(&self, code: &str) -> i64 {
        let (status, body) = self
            .post("/warehouses", json!({ "name": format!("Warehouse {code}"), "code": code }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn product(&self, sku: &str) -> i64 {
        let (status, body) = self
            .post("/products", json!({ "sku": sku, "name": format!("Product {sku}") }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn movement(&self, body: Value) -> (StatusCode, Value) {
        self.post("/stock-movements", body).await
    }

    async fn qty(&self, w: i64, p: i64) -> i64 {
        let (status, body) = self.get(&format!("/inventory/{w}/{p}")).await;
        assert_eq!(status, StatusCode::OK);
        body["qty"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn warehouse_crud_lifecycle() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/warehouses"))
        .json(&json!({ "name": "  Main  ", "code": "WH-1", "address": "1 Dock Rd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["name"], "Main");
    assert_eq!(location, format!("/warehouses/{}", created["id"]));

    let (status, body) = srv.post("/warehouses", json!({ "name": "Other", "code": "WH-1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "duplicate_key");

    let (status, body) = srv.get(&location).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "WH-1");

    let res = srv
        .client
        .patch(srv.url(&location))
        .json(&json!({ "name": "Renamed", "address": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let patched: Value = res.json().await.unwrap();
    assert_eq!(patched["name"], "Renamed");
    assert_eq!(patched["address"], "1 Dock Rd");

    let res = srv.client.delete(srv.url(&location)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.client.delete(srv.url(&location)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let (status, _) = srv.get(&location).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = srv.get(&format!("{location}?includeDeleted=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["deleted_at"].is_string());

    // The code is free again once its owner is soft-deleted.
    srv.warehouse("WH-1").await;
    let (_, list) = srv.get("/warehouses?includeDeleted=true").await;
    assert_eq!(list["total"], 2);
    let (_, list) = srv.get("/warehouses").await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn catalog_validation_errors_are_400() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/products", json!({ "sku": "   ", "name": "Bolt" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post("/products", json!({ "sku": "S", "name": "Bolt", "price": -1.0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post("/products", json!({ "sku": "S", "name": "Bolt", "colour": "red" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv.get("/products?limit=101").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = srv.get("/products/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn movement_scenarios_end_to_end() {
    let srv = TestServer::spawn().await;
    let w1 = srv.warehouse("WH-1").await;
    let w2 = srv.warehouse("WH-2").await;
    let p = srv.product("SKU-1").await;

    assert_eq!(srv.qty(w1, p).await, 0);

    let (status, body) = srv
        .movement(json!({ "movement_type": "IN", "warehouse_id": w1, "product_id": p, "qty": 100, "ref_no": "PO-1" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["after_qty_src"], 100);
    assert!(body.get("after_qty_dst").is_none());
    assert!(body.get("warehouse_to_id").is_none());

    let (status, body) = srv
        .movement(json!({ "movement_type": "OUT", "warehouse_id": w1, "product_id": p, "qty": 30 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["after_qty_src"], 70);

    let (status, body) = srv
        .movement(json!({ "movement_type": "OUT", "warehouse_id": w1, "product_id": p, "qty": 100 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(srv.qty(w1, p).await, 70);

    let (status, body) = srv
        .movement(json!({
            "movement_type": "TRANSFER",
            "warehouse_id": w1,
            "warehouse_to_id": w2,
            "product_id": p,
            "qty": 40,
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["after_qty_src"], 30);
    assert_eq!(body["after_qty_dst"], 40);
    assert_eq!(body["warehouse_to_id"], w2);

    let (_, page) = srv.get("/stock-movements").await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"][0]["movement_type"], "TRANSFER");

    let (_, page) = srv.get(&format!("/stock-movements?warehouseId={w2}")).await;
    assert_eq!(page["total"], 1);
    let (_, page) = srv.get("/stock-movements?ref=PO").await;
    assert_eq!(page["total"], 1);

    let (_, inventory) = srv.get(&format!("/inventory?warehouseId={w1}")).await;
    assert_eq!(inventory["items"][0]["qty"], 30);

    let (status, report) = srv.get(&format!("/inventory/{w1}/{p}/reconcile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["ledgerQty"], 30);
    assert_eq!(report["replayedQty"], 30);
    assert_eq!(report["consistent"], true);
}

#[tokio::test]
async fn movement_rejections_map_to_status_codes() {
    let srv = TestServer::spawn().await;
    let w = srv.warehouse("WH-1").await;
    let p = srv.product("SKU-1").await;

    let (status, body) = srv
        .movement(json!({ "movement_type": "TRANSFER", "warehouse_id": w, "product_id": p, "qty": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_movement");

    let (status, body) = srv
        .movement(json!({ "movement_type": "IN", "warehouse_id": w, "product_id": p, "qty": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .movement(json!({ "movement_type": "SHRINK", "warehouse_id": w, "product_id": p, "qty": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .movement(json!({ "movement_type": "IN", "warehouse_id": 999, "product_id": p, "qty": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (_, page) = srv.get("/stock-movements").await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn hard_delete_of_referenced_product_conflicts() {
    let srv = TestServer::spawn().await;
    let w = srv.warehouse("WH-1").await;
    let p = srv.product("SKU-1").await;
    let (status, _) = srv
        .movement(json!({ "movement_type": "ADJUST", "warehouse_id": w, "product_id": p, "qty": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let res = srv
        .client
        .delete(srv.url(&format!("/products/{p}?hard=true")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "referenced");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_over_http_admit_one() {
    let srv = Arc::new(TestServer::spawn().await);
    let w = srv.warehouse("WH-1").await;
    let p = srv.product("SKU-1").await;
    srv.movement(json!({ "movement_type": "IN", "warehouse_id": w, "product_id": p, "qty": 100 }))
        .await;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let srv = Arc::clone(&srv);
            tokio::spawn(async move {
                srv.movement(json!({ "movement_type": "OUT", "warehouse_id": w, "product_id": p, "qty": 60 }))
                    .await
                    .0
            })
        })
        .collect();

    let mut ok = 0;
    for task in tasks {
        if task.await.unwrap() == StatusCode::OK {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(srv.qty(w, p).await, 40);
}

#[tokio::test]
async fn credit_overflow_is_a_400_not_a_500() {
    let srv = TestServer::spawn().await;
    let w = srv.warehouse("WH-1").await;
    let p = srv.product("SKU-1").await;

    let (status, _) = srv
        .movement(json!({ "movement_type": "IN", "warehouse_id": w, "product_id": p, "qty": i64::MAX }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .movement(json!({ "movement_type": "IN", "warehouse_id": w, "product_id": p, "qty": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(srv.qty(w, p).await, i64::MAX);

    let (_, inventory) = srv.get("/inventory?q=%20sku-1%20").await;
    assert_eq!(inventory["total"], 1);
}
