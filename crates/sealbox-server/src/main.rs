//! sealbox-server — the relay binary.
//!
//! Startup sequence:
//!   1. Parse configuration (flags or environment)
//!   2. Initialise logging (`--log-level none` keeps the process fully silent)
//!   3. Connect the durable store and apply migrations
//!   4. Connect the ephemeral store
//!   5. Spawn the TTL reaper
//!   6. Serve HTTP + sockets until ctrl-c, then drain the pools

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use tracing::info;
use zeroize::Zeroizing;

use sealbox_api::{build_router, ApiConfig, ApiState};
use sealbox_auth::{AuthGate, TokenSigner};
use sealbox_cache::{Cache, CacheConfig};
use sealbox_core::constants::{
    DEFAULT_MESSAGE_TTL_DAYS, DEFAULT_PREKEY_REFILL_THRESHOLD, DEFAULT_RATE_LIMIT_PER_WINDOW,
    DEFAULT_TOKEN_TTL_SECS, REAP_INTERVAL_SECS,
};
use sealbox_keys::KeyService;
use sealbox_relay::{spawn_reaper, Fabric, Relay};
use sealbox_store::{Store, StoreConfig};

#[derive(Parser, Debug)]
#[command(
    name = "sealbox-server",
    version,
    about = "Sealbox relay — server core for zero-knowledge private messaging"
)]
struct Args {
    /// HTTP and socket listen port.
    #[arg(long, env = "SEALBOX_PORT", default_value_t = 3001)]
    port: u16,

    /// Durable store connection.
    #[arg(long, env = "SEALBOX_DB_HOST", default_value = "localhost")]
    db_host: String,

    #[arg(long, env = "SEALBOX_DB_PORT", default_value_t = 5432)]
    db_port: u16,

    #[arg(long, env = "SEALBOX_DB_NAME", default_value = "sealbox")]
    db_name: String,

    #[arg(long, env = "SEALBOX_DB_USER", default_value = "sealbox")]
    db_user: String,

    #[arg(long, env = "SEALBOX_DB_PASSWORD")]
    db_password: Option<String>,

    /// Require TLS to the durable store.
    #[arg(long, env = "SEALBOX_DB_SSL")]
    db_ssl: bool,

    /// Ephemeral store connection.
    #[arg(long, env = "SEALBOX_REDIS_HOST", default_value = "localhost")]
    redis_host: String,

    #[arg(long, env = "SEALBOX_REDIS_PORT", default_value_t = 6379)]
    redis_port: u16,

    #[arg(long, env = "SEALBOX_REDIS_PASSWORD")]
    redis_password: Option<String>,

    /// Symmetric bearer-token signing secret. Rotating it invalidates every
    /// outstanding token.
    #[arg(long, env = "SEALBOX_TOKEN_SECRET")]
    token_secret: String,

    /// Bearer-token lifetime in seconds.
    #[arg(long, env = "SEALBOX_TOKEN_TTL_SECS", default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    token_ttl_secs: u64,

    /// Queue retention in days.
    #[arg(long, env = "SEALBOX_MESSAGE_TTL_DAYS", default_value_t = DEFAULT_MESSAGE_TTL_DAYS)]
    message_ttl_days: u32,

    /// Requests allowed per credential hash per 60-second window.
    #[arg(long, env = "SEALBOX_MAX_REQUESTS_PER_MINUTE", default_value_t = DEFAULT_RATE_LIMIT_PER_WINDOW)]
    max_requests_per_minute: u32,

    /// One-time prekey pool low-water mark.
    #[arg(long, env = "SEALBOX_PREKEY_REFILL_THRESHOLD", default_value_t = DEFAULT_PREKEY_REFILL_THRESHOLD)]
    prekey_refill_threshold: u32,

    /// Tracing filter, or `none` to disable all stdout/stderr output.
    /// Per-request logging does not exist at any level.
    #[arg(long, env = "SEALBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Production origin: CORS admits only `https://<domain>` when set.
    #[arg(long, env = "SEALBOX_DOMAIN")]
    domain: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.log_level.eq_ignore_ascii_case("none") {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_new(&args.log_level)
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    info!("sealbox relay starting");

    let allowed_origin = match &args.domain {
        Some(domain) => Some(
            HeaderValue::from_str(&format!("https://{domain}"))
                .context("configured domain is not a valid origin")?,
        ),
        None => None,
    };

    // ── Durable store ─────────────────────────────────────────────────────────
    let store_config = StoreConfig {
        host: args.db_host.clone(),
        port: args.db_port,
        database: args.db_name.clone(),
        user: args.db_user.clone(),
        password: args.db_password.clone(),
        ssl: args.db_ssl,
    };
    let store = Store::connect(&store_config)
        .await
        .map_err(|e| anyhow::anyhow!("connecting durable store: {e}"))?;
    store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("applying migrations: {e}"))?;
    info!("durable store ready");

    // ── Ephemeral store ───────────────────────────────────────────────────────
    let cache_config = CacheConfig {
        host: args.redis_host.clone(),
        port: args.redis_port,
        password: args.redis_password.clone(),
    };
    let cache = Cache::connect(&cache_config)
        .await
        .map_err(|e| anyhow::anyhow!("connecting ephemeral store: {e}"))?;
    info!("ephemeral store ready");

    // ── Components ────────────────────────────────────────────────────────────
    let secret = Zeroizing::new(args.token_secret.clone().into_bytes());
    let tokens = TokenSigner::new(&secret, args.token_ttl_secs);
    let auth = Arc::new(AuthGate::new(store.clone(), cache.clone(), tokens));
    let keys = Arc::new(KeyService::new(store.clone(), args.prekey_refill_threshold));
    let relay = Arc::new(Relay::new(
        store.clone(),
        Fabric::new(),
        args.message_ttl_days,
    ));

    // ── Reaper ────────────────────────────────────────────────────────────────
    let reaper = spawn_reaper(store.clone(), Duration::from_secs(REAP_INTERVAL_SECS));

    // ── HTTP + sockets ────────────────────────────────────────────────────────
    let state = ApiState {
        auth,
        keys,
        relay,
        cache,
        config: ApiConfig {
            max_requests_per_minute: args.max_requests_per_minute,
            allowed_origin,
        },
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    // ── Drain ─────────────────────────────────────────────────────────────────
    reaper.abort();
    store.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
