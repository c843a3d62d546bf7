/// Application state and router builder
///
/// `AppState` carries every injected handle a handler needs: the pool, the
/// credential store, the token service, the revocation list, the hashing
/// pool and the Auth Gate built from them. Nothing is process-global.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokoku_api::{app::{build_router, AppState}, config::Config};
/// use tokoku_shared::auth::revocation::MemoryRevocationList;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(MemoryRevocationList::new()));
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::security::{security_headers, SecurityHeaders},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokoku_shared::auth::{
    middleware::{auth_gate, AuthGate},
    password::HashingPool,
    revocation::RevocationList,
    token::TokenService,
};
use tokoku_shared::store::{CredentialStore, PgCredentialStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each handler via Axum's `State` extractor; every field is
/// reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (catalog tables, health check)
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Credential Store
    pub credentials: Arc<dyn CredentialStore>,

    /// Token Service; the only holder of the signing key
    pub tokens: Arc<TokenService>,

    /// Logged-out token ids
    pub revocations: Arc<dyn RevocationList>,

    /// Bounded password hashing workers
    pub hasher: HashingPool,

    /// Auth Gate over `tokens` and `revocations`
    pub gate: AuthGate,
}

impl AppState {
    /// Creates state backed by the PostgreSQL credential store
    pub fn new(db: PgPool, config: Config, revocations: Arc<dyn RevocationList>) -> Self {
        let credentials = Arc::new(PgCredentialStore::new(db.clone()));
        Self::with_credentials(db, config, credentials, revocations)
    }

    /// Creates state with an explicit credential store
    pub fn with_credentials(
        db: PgPool,
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationList>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            &config.jwt.secret,
            config.jwt.issuer.clone(),
            config.jwt.ttl(),
        ));
        let gate = AuthGate::new(tokens.clone(), revocations.clone());
        let hasher = HashingPool::new(config.hashing.params, config.hashing.max_concurrency);

        Self {
            db,
            config: Arc::new(config),
            credentials,
            tokens,
            revocations,
            hasher,
            gate,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                      public
/// └── /api/v1
///     ├── GET  /                       public, welcome text
///     ├── POST /register               public
///     ├── POST /login                  public
///     ├── POST /logout                 gated
///     ├── GET  /protected              gated
///     ├── GET  /secure-endpoint        gated
///     └── /categories, /suppliers,
///         /products, /orders           gated CRUD
///             GET, POST       /
///             GET, PUT, DELETE /:id
/// ```
///
/// The gate is a `route_layer`, so unknown paths still answer 404 rather
/// than 401.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(routes::health::welcome))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/protected", get(routes::auth::protected))
        .route("/secure-endpoint", get(routes::auth::secure_endpoint))
        .route(
            "/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(routes::categories::get_category)
                .put(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        )
        .route(
            "/suppliers",
            get(routes::suppliers::list_suppliers).post(routes::suppliers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            get(routes::suppliers::get_supplier)
                .put(routes::suppliers::update_supplier)
                .delete(routes::suppliers::delete_supplier),
        )
        .route(
            "/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/products/:id",
            get(routes::products::get_product)
                .put(routes::products::update_product)
                .delete(routes::products::delete_product),
        )
        .route(
            "/orders",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(routes::orders::get_order)
                .put(routes::orders::update_order)
                .delete(routes::orders::delete_order),
        )
        .route_layer(middleware::from_fn_with_state(state.gate.clone(), auth_gate));

    let v1_routes = public_routes.merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    let security = SecurityHeaders::new(state.config.api.production);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Nested "/" only matches "/api/v1"; serve the trailing-slash form too
        .route("/api/v1/", get(routes::health::welcome))
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(middleware::from_fn_with_state(security, security_headers))
        .with_state(state)
}
