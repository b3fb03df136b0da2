//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use auth::{AuthConfig, AuthServices, AuthStore, PgAuthRepository, admin_router, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use commerce::domain::value_object::Currency;
use commerce::{
    CommerceConfig, CommerceServices, PgCommerceRepository, PgProfileStore, StripeConfig,
    StripeGateway, admin_orders_router, commerce_router,
};
use platform::crypto::SecretKey;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,commerce=info,audit=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth
    let auth = AuthServices::new(PgAuthRepository::new(pool.clone()), auth_config()?)?;

    // Startup cleanup: errors here should not prevent server startup
    if let Err(e) = auth.cleanup_expired_sessions().await {
        tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
    }
    spawn_session_cleanup(auth.clone());

    bootstrap_super_admin(&auth).await?;

    // Commerce
    let commerce = CommerceServices::new(
        PgCommerceRepository::new(pool.clone()),
        PgProfileStore::new(pool.clone()),
        StripeGateway::new(stripe_config()?)?,
        commerce_config()?,
    );

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let admin = admin_router(auth.clone())
        .merge(admin_orders_router(commerce.clone(), auth.guard.clone()));

    let api = commerce_router(commerce, auth.guard.clone())
        .nest("/auth", auth_router(auth.clone()))
        .nest("/admin", admin);

    let app = Router::new().nest("/api", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31113);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Session secret and pepper from the environment
///
/// Debug builds fall back to a random secret, so sessions do not survive a
/// restart.
fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    match env::var("SESSION_TOKEN_SECRET") {
        Ok(secret_b64) => {
            config.session_secret = SecretKey::from_base64(&secret_b64)
                .context("SESSION_TOKEN_SECRET must be 32 bytes, base64 encoded")?;
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("SESSION_TOKEN_SECRET not set, using a random secret");
        }
        Err(_) => anyhow::bail!("SESSION_TOKEN_SECRET must be set in production"),
    }

    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    Ok(config)
}

fn stripe_config() -> anyhow::Result<StripeConfig> {
    let secret_key = env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY must be set")?;
    let success_url = env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
        "http://localhost:40922/checkout/success?ref={CHECKOUT_SESSION_ID}".to_string()
    });
    let cancel_url = env::var("CHECKOUT_CANCEL_URL")
        .unwrap_or_else(|_| "http://localhost:40922/cart".to_string());

    let mut config = StripeConfig::new(secret_key, success_url, cancel_url);
    if let Ok(api_base) = env::var("STRIPE_API_BASE") {
        config.api_base = api_base;
    }
    Ok(config)
}

fn commerce_config() -> anyhow::Result<CommerceConfig> {
    let mut config = CommerceConfig::default();
    if let Ok(code) = env::var("CHECKOUT_CURRENCY") {
        config.currency =
            Currency::new(&code).map_err(|e| anyhow::anyhow!("CHECKOUT_CURRENCY: {e}"))?;
    }
    if let Ok(max) = env::var("CHECKOUT_MAX_ITEMS") {
        config.max_basket_items = max.parse().context("CHECKOUT_MAX_ITEMS must be a number")?;
    }
    Ok(config)
}

/// Create the first super admin from `BOOTSTRAP_SUPER_ADMIN_*` when no staff
/// account exists
async fn bootstrap_super_admin<R: AuthStore>(auth: &AuthServices<R>) -> anyhow::Result<()> {
    let (Ok(user_name), Ok(email), Ok(password)) = (
        env::var("BOOTSTRAP_SUPER_ADMIN_USERNAME"),
        env::var("BOOTSTRAP_SUPER_ADMIN_EMAIL"),
        env::var("BOOTSTRAP_SUPER_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    match auth
        .admin_accounts()
        .bootstrap_super_admin(&user_name, &email, password)
        .await?
    {
        Some(admin) => tracing::info!(admin_id = %admin.admin_id, "Super admin bootstrapped"),
        None => tracing::debug!("Staff accounts exist, skipping bootstrap"),
    }
    Ok(())
}

fn spawn_session_cleanup<R: AuthStore>(auth: AuthServices<R>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        // First tick fires immediately; startup already cleaned up
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = auth.cleanup_expired_sessions().await {
                tracing::warn!(error = %e, "Periodic session cleanup failed");
            }
        }
    });
}
