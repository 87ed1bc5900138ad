#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

use stockroom_server::{build_router, seed_admin, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("STOCKROOM_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn config_from_env() -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        db_path: PathBuf::from(env_string(
            "STOCKROOM_DB_PATH",
            &defaults.db_path.to_string_lossy(),
        )),
        token_secret: env::var("STOCKROOM_TOKEN_SECRET")
            .map(String::into_bytes)
            .unwrap_or_default(),
        token_ttl_secs: env_i64("STOCKROOM_TOKEN_TTL_SECS", defaults.token_ttl_secs),
        max_body_bytes: env_usize("STOCKROOM_MAX_BODY_BYTES", defaults.max_body_bytes),
        pbkdf2_iterations: env_u32("STOCKROOM_PBKDF2_ITERATIONS", defaults.pbkdf2_iterations),
        seed_admin: env_bool("STOCKROOM_SEED_ADMIN", defaults.seed_admin),
        seed_admin_username: env_string(
            "STOCKROOM_SEED_ADMIN_USERNAME",
            &defaults.seed_admin_username,
        ),
        seed_admin_password: env_string(
            "STOCKROOM_SEED_ADMIN_PASSWORD",
            &defaults.seed_admin_password,
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let config = config_from_env();
    config.validate()?;

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("create {}: {e}", parent.display()))?;
        }
    }
    let conn = stockroom_store::open(&config.db_path)
        .map_err(|e| format!("open {}: {e}", config.db_path.display()))?;
    match seed_admin(&conn, &config) {
        Ok(true) => info!(username = %config.seed_admin_username, "seeded admin account"),
        Ok(false) => {}
        Err(e) => return Err(format!("admin seeding failed: {e}")),
    }

    let bind_addr = env_string("STOCKROOM_BIND", "0.0.0.0:8080");
    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;

    let state = AppState::new(conn, config);
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {bind_addr}: {e}"))?;
    info!("stockroom-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
