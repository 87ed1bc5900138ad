// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests that drive a real server over HTTP: bind an ephemeral
//! port, spawn `axum::serve`, and talk to it with `reqwest`.

use serde_json::{json, Value};
use stockroom_server::{build_router, seed_admin, AppState, ServerConfig};

struct TestServer {
    base: String,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig {
        db_path: dir.path().join("stockroom.db"),
        token_secret: b"e2e-test-secret".to_vec(),
        pbkdf2_iterations: 1_000,
        ..ServerConfig::default()
    };
    config.validate().expect("valid config");

    let conn = stockroom_store::open(&config.db_path).expect("open db");
    seed_admin(&conn, &config).expect("seed admin");

    let app = build_router(AppState::new(conn, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });

    TestServer {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let resp = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({"username": username, "password": password}))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("login body");
    assert_eq!(body["success"], json!(true));
    body["data"]["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

async fn post_json(server: &TestServer, token: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = server
        .client
        .post(server.url(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("post request");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("response body");
    (status, body)
}

async fn get_json(server: &TestServer, token: &str, path: &str) -> (u16, Value) {
    let resp = server
        .client
        .get(server.url(path))
        .bearer_auth(token)
        .send()
        .await
        .expect("get request");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("response body");
    (status, body)
}

/// Creates a category, a warehouse and a product, returning their ids.
async fn seed_catalog(server: &TestServer, token: &str) -> (String, String, String) {
    let (status, body) = post_json(
        server,
        token,
        "/api/categories",
        json!({"name": "Electronics", "description": "Devices"}),
    )
    .await;
    assert_eq!(status, 201, "create category: {body}");
    let category_id = body["data"]["category"]["id"]
        .as_str()
        .expect("category id")
        .to_string();

    let (status, body) = post_json(
        server,
        token,
        "/api/warehouses",
        json!({"name": "Main Warehouse", "code": "MW01", "city": "Tehran"}),
    )
    .await;
    assert_eq!(status, 201, "create warehouse: {body}");
    let warehouse_id = body["data"]["warehouse"]["id"]
        .as_str()
        .expect("warehouse id")
        .to_string();

    let (status, body) = post_json(
        server,
        token,
        "/api/products",
        json!({
            "code": "LAP-100",
            "name": "Laptop 14",
            "categoryId": category_id,
            "unit": "pcs",
            "unitPrice": 1200.0,
            "costPrice": 900.0,
            "minStockLevel": 3
        }),
    )
    .await;
    assert_eq!(status, 201, "create product: {body}");
    let product_id = body["data"]["product"]["id"]
        .as_str()
        .expect("product id")
        .to_string();

    (category_id, warehouse_id, product_id)
}

#[tokio::test]
async fn integration_health_request_id_and_unknown_route() {
    let server = spawn_server().await;

    let resp = server
        .client
        .get(server.url("/api/health"))
        .send()
        .await
        .expect("health");
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.expect("health body");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("ok"));

    // An inbound request id is echoed back unchanged.
    let resp = server
        .client
        .get(server.url("/api/health"))
        .header("x-request-id", "req-e2e-42")
        .send()
        .await
        .expect("health with id");
    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-e2e-42")
    );

    let resp = server
        .client
        .get(server.url("/api/no-such-route"))
        .send()
        .await
        .expect("unknown route");
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.expect("404 body");
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("NotFound"));

    let metrics = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("metrics")
        .text()
        .await
        .expect("metrics text");
    assert!(metrics.contains("http_requests_total"));
}

#[tokio::test]
async fn integration_auth_register_login_and_profile() {
    let server = spawn_server().await;

    // Protected routes reject missing and garbage tokens.
    let resp = server
        .client
        .get(server.url("/api/auth/me"))
        .send()
        .await
        .expect("no token");
    assert_eq!(resp.status(), 401);
    let resp = server
        .client
        .get(server.url("/api/auth/me"))
        .bearer_auth("skr1.not.real")
        .send()
        .await
        .expect("bad token");
    assert_eq!(resp.status(), 401);

    let token = login(&server, "admin", "admin123").await;
    let (status, body) = get_json(&server, &token, "/api/auth/me").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["user"]["username"], json!("admin"));
    assert_eq!(body["data"]["user"]["role"], json!("admin"));
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let (status, body) = post_json(
        &server,
        "",
        "/api/auth/register",
        json!({
            "username": "parisa",
            "email": "parisa@example.com",
            "password": "secret99",
            "firstName": "Parisa",
            "lastName": "Karimi"
        }),
    )
    .await;
    assert_eq!(status, 201, "register: {body}");
    assert_eq!(body["data"]["user"]["role"], json!("viewer"));
    let viewer_token = body["data"]["token"].as_str().expect("token").to_string();

    // Login accepts the email as identifier too.
    let via_email = login(&server, "parisa@example.com", "secret99").await;
    assert!(!via_email.is_empty());

    // Duplicate username is a conflict.
    let (status, body) = post_json(
        &server,
        "",
        "/api/auth/register",
        json!({
            "username": "parisa",
            "email": "other@example.com",
            "password": "secret99",
            "firstName": "Other",
            "lastName": "Person"
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], json!("Conflict"));

    // Profile update and password change round-trip.
    let resp = server
        .client
        .put(server.url("/api/auth/me"))
        .bearer_auth(&viewer_token)
        .json(&json!({"firstName": "Pari"}))
        .send()
        .await
        .expect("update profile");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("profile body");
    assert_eq!(body["data"]["user"]["firstName"], json!("Pari"));

    let resp = server
        .client
        .put(server.url("/api/auth/change-password"))
        .bearer_auth(&viewer_token)
        .json(&json!({"currentPassword": "wrong", "newPassword": "newpass1"}))
        .send()
        .await
        .expect("wrong current password");
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .put(server.url("/api/auth/change-password"))
        .bearer_auth(&viewer_token)
        .json(&json!({"currentPassword": "secret99", "newPassword": "newpass1"}))
        .send()
        .await
        .expect("change password");
    assert_eq!(resp.status(), 200);
    let relogin = login(&server, "parisa", "newpass1").await;
    assert!(!relogin.is_empty());
}

#[tokio::test]
async fn integration_role_guards_block_viewers() {
    let server = spawn_server().await;
    let admin = login(&server, "admin", "admin123").await;

    let (status, body) = post_json(
        &server,
        "",
        "/api/auth/register",
        json!({
            "username": "watcher",
            "email": "watcher@example.com",
            "password": "secret99",
            "firstName": "Watch",
            "lastName": "Only"
        }),
    )
    .await;
    assert_eq!(status, 201, "register viewer: {body}");
    let viewer = body["data"]["token"].as_str().expect("token").to_string();

    let (status, body) = post_json(
        &server,
        &viewer,
        "/api/categories",
        json!({"name": "Forbidden Goods"}),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], json!("Forbidden"));

    // Viewers still read everything.
    let (status, _) = get_json(&server, &viewer, "/api/categories").await;
    assert_eq!(status, 200);
    let (status, _) = get_json(&server, &viewer, "/api/inventory/summary").await;
    assert_eq!(status, 200);

    // The user directory is admin-only.
    let (status, body) = get_json(&server, &viewer, "/api/users").await;
    assert_eq!(status, 403, "viewer listing users: {body}");
    let (status, body) = get_json(&server, &admin, "/api/users").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["count"], json!(2));
}

#[tokio::test]
async fn integration_catalog_crud_and_conflicts() {
    let server = spawn_server().await;
    let token = login(&server, "admin", "admin123").await;
    let (category_id, warehouse_id, product_id) = seed_catalog(&server, &token).await;

    // Duplicate names and codes are rejected with a friendly conflict.
    let (status, body) = post_json(
        &server,
        &token,
        "/api/categories",
        json!({"name": "Electronics"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], json!("Conflict"));

    let (status, body) = post_json(
        &server,
        &token,
        "/api/warehouses",
        json!({"name": "Second Site", "code": "MW01"}),
    )
    .await;
    assert_eq!(status, 400, "duplicate warehouse code: {body}");

    // Lowercase warehouse codes fail validation.
    let (status, body) = post_json(
        &server,
        &token,
        "/api/warehouses",
        json!({"name": "Bad Code", "code": "mw02"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], json!("ValidationFailed"));

    // Product listing supports search and carries a pagination envelope.
    let (status, body) =
        get_json(&server, &token, "/api/products?search=laptop&page=1&limit=10").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["products"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["pagination"]["total"], json!(1));
    assert_eq!(body["data"]["pagination"]["page"], json!(1));

    let resp = server
        .client
        .put(server.url(&format!("/api/products/{product_id}")))
        .bearer_auth(&token)
        .json(&json!({"unitPrice": 1100.0, "name": "Laptop 14 v2"}))
        .send()
        .await
        .expect("update product");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("update body");
    assert_eq!(body["data"]["product"]["name"], json!("Laptop 14 v2"));
    assert_eq!(
        body["data"]["product"]["category"]["name"],
        json!("Electronics")
    );

    // A category with products cannot be deleted.
    let resp = server
        .client
        .delete(server.url(&format!("/api/categories/{category_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete category");
    assert_eq!(resp.status(), 400);

    // Deleting the product first unblocks the category.
    let resp = server
        .client
        .delete(server.url(&format!("/api/products/{product_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete product");
    assert_eq!(resp.status(), 200);
    let resp = server
        .client
        .delete(server.url(&format!("/api/categories/{category_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete category again");
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .delete(server.url(&format!("/api/warehouses/{warehouse_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete warehouse");
    assert_eq!(resp.status(), 200);

    let (status, _) = get_json(
        &server,
        &token,
        &format!("/api/warehouses/{warehouse_id}"),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn integration_posting_flow_updates_inventory() {
    let server = spawn_server().await;
    let token = login(&server, "admin", "admin123").await;
    let (_, warehouse_id, product_id) = seed_catalog(&server, &token).await;

    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "inbound",
            "productId": product_id,
            "warehouseId": warehouse_id,
            "quantity": 20,
            "unitCost": 900.0,
            "supplierName": "Acme Supply"
        }),
    )
    .await;
    assert_eq!(status, 201, "inbound: {body}");
    let tx = &body["data"]["transaction"];
    assert_eq!(tx["totalCost"], json!(18000.0));
    let reference = tx["referenceNumber"].as_str().expect("reference");
    assert!(reference.starts_with("INBOUND-"), "reference: {reference}");
    let tx_id = tx["id"].as_str().expect("transaction id").to_string();

    let (status, body) = get_json(&server, &token, "/api/inventory").await;
    assert_eq!(status, 200);
    let items = body["data"]["inventory"].as_array().expect("inventory");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(20));
    assert_eq!(items[0]["isLowStock"], json!(false));

    // Outbound beyond the on-hand quantity aborts without changing stock.
    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "outbound",
            "productId": product_id,
            "warehouseId": warehouse_id,
            "quantity": 50
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], json!("InsufficientStock"));
    assert_eq!(body["error"]["details"]["available"], json!(20));
    assert_eq!(body["error"]["details"]["requested"], json!(50));

    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "outbound",
            "productId": product_id,
            "warehouseId": warehouse_id,
            "quantity": 5,
            "customerName": "Retail Co"
        }),
    )
    .await;
    assert_eq!(status, 201, "outbound: {body}");

    // Adjustment sets the absolute quantity.
    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "adjustment",
            "productId": product_id,
            "warehouseId": warehouse_id,
            "quantity": 2,
            "reason": "stocktake"
        }),
    )
    .await;
    assert_eq!(status, 201, "adjustment: {body}");

    let (status, body) = get_json(&server, &token, "/api/inventory/summary").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["summary"]["totalQuantity"], json!(2));
    assert_eq!(body["data"]["summary"]["lowStockCount"], json!(1));

    let (status, body) = get_json(&server, &token, "/api/inventory/low-stock").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["inventory"].as_array().map(Vec::len),
        Some(1)
    );

    let (status, body) = get_json(&server, &token, &format!("/api/transactions/{tx_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["transaction"]["id"], json!(tx_id));

    let (status, body) = get_json(&server, &token, "/api/transactions?limit=2&page=1").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["transactions"].as_array().map(Vec::len),
        Some(2)
    );
    assert_eq!(body["data"]["pagination"]["total"], json!(3));
    assert_eq!(body["data"]["pagination"]["totalPages"], json!(2));
}

#[tokio::test]
async fn integration_transfer_moves_stock_between_warehouses() {
    let server = spawn_server().await;
    let token = login(&server, "admin", "admin123").await;
    let (_, source_id, product_id) = seed_catalog(&server, &token).await;

    let (status, body) = post_json(
        &server,
        &token,
        "/api/warehouses",
        json!({"name": "Backup Warehouse", "code": "BW01"}),
    )
    .await;
    assert_eq!(status, 201, "second warehouse: {body}");
    let destination_id = body["data"]["warehouse"]["id"]
        .as_str()
        .expect("warehouse id")
        .to_string();

    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "inbound",
            "productId": product_id,
            "warehouseId": source_id,
            "quantity": 10
        }),
    )
    .await;
    assert_eq!(status, 201, "inbound: {body}");

    // Transfers require a distinct destination.
    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "transfer",
            "productId": product_id,
            "warehouseId": source_id,
            "quantity": 4
        }),
    )
    .await;
    assert_eq!(status, 400, "missing destination: {body}");
    let (status, _) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "transfer",
            "productId": product_id,
            "warehouseId": source_id,
            "destinationWarehouseId": source_id,
            "quantity": 4
        }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "transfer",
            "productId": product_id,
            "warehouseId": source_id,
            "destinationWarehouseId": destination_id,
            "quantity": 4
        }),
    )
    .await;
    assert_eq!(status, 201, "transfer: {body}");
    assert_eq!(
        body["data"]["transaction"]["destinationWarehouse"]["id"],
        json!(destination_id)
    );

    let (status, body) = get_json(&server, &token, "/api/inventory").await;
    assert_eq!(status, 200);
    let items = body["data"]["inventory"].as_array().expect("inventory");
    let quantity_at = |warehouse: &str| {
        items
            .iter()
            .find(|i| i["warehouse"]["id"] == json!(warehouse))
            .map(|i| i["quantity"].clone())
    };
    assert_eq!(quantity_at(&source_id), Some(json!(6)));
    assert_eq!(quantity_at(&destination_id), Some(json!(4)));

    // Filtering by the destination warehouse finds the transfer too.
    let (status, body) = get_json(
        &server,
        &token,
        &format!("/api/transactions?warehouseId={destination_id}"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["pagination"]["total"], json!(1));
}

#[tokio::test]
async fn integration_dashboard_and_reports() {
    let server = spawn_server().await;
    let token = login(&server, "admin", "admin123").await;
    let (_, warehouse_id, product_id) = seed_catalog(&server, &token).await;

    let (status, body) = post_json(
        &server,
        &token,
        "/api/transactions",
        json!({
            "type": "inbound",
            "productId": product_id,
            "warehouseId": warehouse_id,
            "quantity": 8,
            "unitCost": 900.0
        }),
    )
    .await;
    assert_eq!(status, 201, "inbound: {body}");

    let (status, body) = get_json(&server, &token, "/api/dashboard/overview").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["stats"]["totalProducts"], json!(1));
    assert_eq!(body["data"]["stats"]["totalWarehouses"], json!(1));
    assert_eq!(body["data"]["inboundCount"], json!(1));
    assert_eq!(body["data"]["outboundCount"], json!(0));
    assert_eq!(
        body["data"]["recentTransactions"].as_array().map(Vec::len),
        Some(1)
    );

    let (status, body) = get_json(&server, &token, "/api/dashboard/trends?days=7").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["days"], json!(7));
    let trends = body["data"]["trends"].as_array().expect("trends");
    assert!(trends
        .iter()
        .any(|p| p["kind"] == json!("inbound") && p["totalQuantity"] == json!(8)));

    let (status, body) = get_json(&server, &token, "/api/dashboard/trends?days=0").await;
    assert_eq!(status, 400, "days out of range: {body}");

    let (status, body) =
        get_json(&server, &token, "/api/dashboard/category-distribution").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["distribution"].as_array().map(Vec::len),
        Some(1)
    );

    let (status, body) = get_json(&server, &token, "/api/reports/inventory").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["report"].as_array().map(Vec::len), Some(1));
    assert!(body["data"].get("generatedAt").is_some());

    let (status, body) = get_json(&server, &token, "/api/reports/transactions").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["summary"]["inbound"]["count"], json!(1));
    assert_eq!(
        body["data"]["summary"]["inbound"]["totalQuantity"],
        json!(8)
    );
    assert_eq!(body["data"]["summary"]["outbound"]["count"], json!(0));

    // Excel downloads come back as an XLSX attachment, not JSON.
    let resp = server
        .client
        .get(server.url("/api/reports/inventory?format=excel"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("excel report");
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    );
    let expected_name = format!(
        "inventory-report-{}.xlsx",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    assert!(resp
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(&expected_name)));
    let bytes = resp.bytes().await.expect("xlsx bytes");
    // XLSX files are zip archives.
    assert_eq!(&bytes[..2], b"PK");

    let (status, body) = get_json(&server, &token, "/api/reports/inventory?format=csv").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], json!("ValidationFailed"));
}
