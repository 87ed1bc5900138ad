#![forbid(unsafe_code)]
//! HTTP server wiring: state, router, auth middleware, handlers.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use chrono::Utc;
use rusqlite::Connection;
use stockroom_core::hash_password;
use stockroom_model::{Role, User};
use tokio::sync::Mutex;
use uuid::Uuid;

mod auth;
mod config;
mod http;
mod metrics;
mod middleware;

pub use config::ServerConfig;
pub use metrics::RequestMetrics;

pub const CRATE_NAME: &str = "stockroom-server";

/// Shared server state. The store is a single SQLite connection behind an
/// async mutex; handlers hold the lock only for the duration of their
/// queries.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<ServerConfig>,
    pub metrics: Arc<RequestMetrics>,
}

impl AppState {
    #[must_use]
    pub fn new(conn: Connection, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            metrics: Arc::new(RequestMetrics::default()),
        }
    }
}

/// Creates the configured admin account when the users table is empty.
/// Returns whether an account was created.
pub fn seed_admin(conn: &Connection, config: &ServerConfig) -> stockroom_store::Result<bool> {
    if !config.seed_admin || stockroom_store::users::count(conn)? > 0 {
        return Ok(false);
    }
    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4(),
        username: config.seed_admin_username.clone(),
        email: format!("{}@stockroom.local", config.seed_admin_username),
        password_hash: hash_password(&config.seed_admin_password, config.pbkdf2_iterations),
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        role: Role::Admin,
        is_active: true,
        last_login: None,
        avatar: None,
        created_at: now,
        updated_at: now,
    };
    stockroom_store::users::insert(conn, &admin)?;
    Ok(true)
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/auth/me",
            get(http::sessions::me_handler).put(http::sessions::update_profile_handler),
        )
        .route(
            "/api/auth/change-password",
            put(http::sessions::change_password_handler),
        )
        .route("/api/users", get(http::users::list_users_handler))
        .route(
            "/api/categories",
            get(http::categories::list_categories_handler)
                .post(http::categories::create_category_handler),
        )
        .route(
            "/api/categories/:id",
            get(http::categories::get_category_handler)
                .put(http::categories::update_category_handler)
                .delete(http::categories::delete_category_handler),
        )
        .route(
            "/api/warehouses",
            get(http::warehouses::list_warehouses_handler)
                .post(http::warehouses::create_warehouse_handler),
        )
        .route(
            "/api/warehouses/:id",
            get(http::warehouses::get_warehouse_handler)
                .put(http::warehouses::update_warehouse_handler)
                .delete(http::warehouses::delete_warehouse_handler),
        )
        .route(
            "/api/products",
            get(http::products::list_products_handler)
                .post(http::products::create_product_handler),
        )
        .route(
            "/api/products/:id",
            get(http::products::get_product_handler)
                .put(http::products::update_product_handler)
                .delete(http::products::delete_product_handler),
        )
        .route("/api/inventory", get(http::inventory::list_inventory_handler))
        .route(
            "/api/inventory/summary",
            get(http::inventory::inventory_summary_handler),
        )
        .route(
            "/api/inventory/low-stock",
            get(http::inventory::low_stock_handler),
        )
        .route(
            "/api/transactions",
            get(http::transactions::list_transactions_handler)
                .post(http::transactions::create_transaction_handler),
        )
        .route(
            "/api/transactions/:id",
            get(http::transactions::get_transaction_handler),
        )
        .route(
            "/api/dashboard/overview",
            get(http::dashboard::overview_handler),
        )
        .route("/api/dashboard/trends", get(http::dashboard::trends_handler))
        .route(
            "/api/dashboard/category-distribution",
            get(http::dashboard::category_distribution_handler),
        )
        .route(
            "/api/reports/inventory",
            get(http::reports::inventory_report_handler),
        )
        .route(
            "/api/reports/transactions",
            get(http::reports::transactions_report_handler),
        )
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/api/health", get(http::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/auth/register", post(http::sessions::register_handler))
        .route("/api/auth/login", post(http::sessions::login_handler))
        .merge(protected)
        .fallback(http::not_found_handler)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}
