use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::connect_info::ConnectInfo,
    extract::DefaultBodyLimit,
    extract::State,
    http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    http::Method,
    http::Request,
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::keyed::DashMapStateStore, Quota,
    RateLimiter,
};
use mm_common::logging::{self, LogSettings};
use mm_common::matching::DEFAULT_WEIGHTS;
use mm_common::store::{create_pool_from_url_checked, run_migrations};
use mm_common::{MemoryStore, MentorshipService, PgStore, Store, Weights};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;

use auth::{AuthConfig, AuthMode, JwtAlgorithm, DEFAULT_TOKEN_TTL_SECS};
use error::ApiError;
use handlers::{accounts, feedback, health, matches, matching, mentors, metrics, reports, sessions, teams};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const BODY_LIMIT_BYTES: usize = 256 * 1024;
const DEFAULT_PASSWORD_COST: u32 = 12;
const TEST_JWT_SECRET: &str = "test-jwt-secret";
const TEST_PASSWORD_COST: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "mm-api", about = "HTTP API for team and mentor matching")]
pub struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Storage backend: memory | postgres
    #[arg(long, env = "MM_STORAGE", default_value = "memory", value_enum)]
    storage: StorageBackend,

    /// PostgreSQL connection string, required with MM_STORAGE=postgres
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Seed the memory store with demo teams and mentors
    #[arg(long, env = "MM_SEED_DEMO", default_value = "false")]
    seed_demo: bool,

    /// API key for X-API-Key authentication
    #[arg(long, env = "MM_API_KEY")]
    api_key: Option<String>,

    /// Authentication mode: api_key | jwt
    #[arg(long, env = "AUTH_MODE", default_value = "api_key", value_enum)]
    auth_mode: AuthMode,

    /// JWT secret for AUTH_MODE=jwt; also signs login tokens in either mode
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    #[arg(long, env = "JWT_ALGORITHM", default_value = "hs256", value_enum)]
    jwt_algorithm: JwtAlgorithm,

    /// Lifetime in seconds of tokens issued at login
    #[arg(long, env = "MM_TOKEN_TTL_SECS", default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    token_ttl_secs: u64,

    /// bcrypt work factor for new password hashes (4..=31)
    #[arg(long, env = "MM_BCRYPT_COST", default_value_t = DEFAULT_PASSWORD_COST)]
    bcrypt_cost: u32,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "MM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    #[arg(long, env = "MM_WEIGHT_AREA")]
    weight_area: Option<f64>,

    #[arg(long, env = "MM_WEIGHT_SCHEDULE")]
    weight_schedule: Option<f64>,

    #[arg(long, env = "MM_WEIGHT_LANGUAGE")]
    weight_language: Option<f64>,

    #[arg(long, env = "MM_WEIGHT_MODALITY")]
    weight_modality: Option<f64>,

    #[arg(long, env = "MM_WEIGHT_REGION")]
    weight_region: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub seed_demo: bool,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub weights: Weights,
    pub password_cost: u32,
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_sec: 20,
            burst: 40,
        }
    }
}

impl RateLimitConfig {
    fn parse_positive<T: std::str::FromStr + PartialOrd + Default>(raw: Option<String>) -> Option<T> {
        raw.and_then(|value| value.trim().parse::<T>().ok())
            .filter(|value| *value > T::default())
    }

    fn from_values(per_sec: Option<String>, burst: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            per_sec: Self::parse_positive(per_sec).unwrap_or(defaults.per_sec),
            burst: Self::parse_positive(burst).unwrap_or(defaults.burst),
        }
    }

    fn from_env() -> Self {
        Self::from_values(
            env::var("MM_RATE_LIMIT_PER_SEC").ok(),
            env::var("MM_RATE_LIMIT_BURST").ok(),
        )
    }
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "MM_CORS_ORIGINS must list explicit origins when credentials are enabled".into(),
            ));
        }

        let auth = AuthConfig {
            mode: cli.auth_mode,
            api_key: cli.api_key.filter(|key| !key.trim().is_empty()),
            jwt_secret: cli.jwt_secret.filter(|secret| !secret.trim().is_empty()),
            jwt_algorithm: cli.jwt_algorithm,
            token_ttl_secs: cli.token_ttl_secs,
        };

        if auth.token_ttl_secs == 0 {
            return Err(ApiError::BadRequest("MM_TOKEN_TTL_SECS must be positive".into()));
        }
        if !(4..=31).contains(&cli.bcrypt_cost) {
            return Err(ApiError::BadRequest(format!(
                "MM_BCRYPT_COST must be between 4 and 31, got {}",
                cli.bcrypt_cost
            )));
        }

        match auth.mode {
            AuthMode::ApiKey if auth.api_key.is_none() => {
                return Err(ApiError::BadRequest(
                    "MM_API_KEY is required when AUTH_MODE=api_key".into(),
                ));
            }
            AuthMode::Jwt if auth.jwt_secret.is_none() => {
                return Err(ApiError::BadRequest(
                    "JWT_SECRET is required when AUTH_MODE=jwt".into(),
                ));
            }
            _ => {}
        }

        if cli.storage == StorageBackend::Postgres && cli.database_url.is_none() {
            return Err(ApiError::BadRequest(
                "DATABASE_URL is required when MM_STORAGE=postgres".into(),
            ));
        }

        let weights = DEFAULT_WEIGHTS.with_overrides(
            cli.weight_area,
            cli.weight_schedule,
            cli.weight_language,
            cli.weight_modality,
            cli.weight_region,
        );
        weights
            .validate()
            .map_err(|err| ApiError::BadRequest(format!("invalid MM_WEIGHT_* overrides: {err}")))?;

        Ok(Self {
            port: cli.port,
            storage: cli.storage,
            database_url: cli.database_url,
            seed_demo: cli.seed_demo,
            cors_origins,
            auth,
            weights,
            password_cost: cli.bcrypt_cost,
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            port: 3001,
            storage: StorageBackend::Memory,
            database_url: None,
            seed_demo: false,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
            weights: DEFAULT_WEIGHTS,
            password_cost: TEST_PASSWORD_COST,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: MentorshipService,
    pub config: AppConfig,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ])
        .allow_credentials(true)
}

fn build_ip_limiter(per_second: u64, burst_size: u32) -> Arc<IpRateLimiter> {
    let nanos_per_token = (1_000_000_000u64 / per_second.max(1)).max(1);
    let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(Duration::from_nanos(nanos_per_token))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst);

    Arc::new(RateLimiter::keyed(quota))
}

pub fn default_rate_limits() -> RateLimits {
    let cfg = RateLimitConfig::from_env();
    RateLimits {
        global: build_ip_limiter(cfg.per_sec, cfg.burst),
    }
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    if let Some(client_ip) = ip {
        if limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }

    Ok(())
}

async fn global_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.global, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/teams", get(teams::list_teams).post(teams::create_team))
        .route("/teams/:id", get(teams::get_team).put(teams::update_team))
        .route(
            "/mentors",
            get(mentors::list_mentors).post(mentors::create_mentor),
        )
        .route(
            "/mentors/:id",
            get(mentors::get_mentor).put(mentors::update_mentor),
        )
        .route("/mentors/:id/approve", patch(mentors::approve_mentor))
        .route(
            "/matches",
            get(matches::list_matches).post(matches::create_match),
        )
        .route("/matches/:id", put(matches::update_match))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route("/sessions/:id", put(sessions::update_session))
        .route(
            "/feedback",
            get(feedback::list_feedback).post(feedback::submit_feedback),
        )
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/reports/:id", put(reports::update_report))
        .route("/metrics", get(metrics::get_metrics))
        .route("/matching/suggest", post(matching::suggest))
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/me", get(accounts::me).put(accounts::update_me));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        .layer(cors)
        .with_state(state)
}

fn build_state(service: MentorshipService, config: AppConfig) -> SharedState {
    Arc::new(AppState {
        service,
        config,
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

/// Router state backed by an empty in-memory store, API-key auth with `api_key`
/// and a fixed secret so login tokens can be issued.
pub fn test_state(api_key: &str) -> SharedState {
    let mut auth = AuthConfig::api_key(api_key);
    auth.jwt_secret = Some(TEST_JWT_SECRET.into());
    let config = AppConfig::for_tests(auth);
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    match MentorshipService::new(store, config.weights) {
        Ok(service) => build_state(service.with_password_cost(config.password_cost), config),
        Err(err) => panic!("default weights rejected: {err}"),
    }
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn Store>, ApiError> {
    match config.storage {
        StorageBackend::Memory => {
            if config.seed_demo {
                let store = MemoryStore::with_demo_data()?;
                info!("memory store seeded with demo data");
                Ok(Arc::new(store))
            } else {
                Ok(Arc::new(MemoryStore::new()))
            }
        }
        StorageBackend::Postgres => {
            if config.seed_demo {
                warn!("MM_SEED_DEMO is ignored with MM_STORAGE=postgres");
            }
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("DATABASE_URL is required".into()))?;
            let pool = create_pool_from_url_checked(url)
                .await
                .map_err(|err| ApiError::Storage(format!("failed to create pool: {err}")))?;
            run_migrations(&pool)
                .await
                .map_err(|err| ApiError::Storage(format!("failed to run migrations: {err}")))?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    logging::init(env!("CARGO_PKG_NAME"), &LogSettings::from_env());

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    let store = build_store(&config).await?;
    let service = MentorshipService::new(store, config.weights)?.with_password_cost(config.password_cost);

    let state = build_state(service, config.clone());

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        auth_mode = ?config.auth.mode,
        storage = ?config.storage,
        run_id = mm_common::ids::run_id(),
        "mm-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);
    info!("shutdown requested; readiness disabled");

    // Load balancers need a moment to observe /readyz failing before the listener closes.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["mm-api"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static("x-request-id"),
                MakeRequestUuid,
            ));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn rate_limit_config_parses_positive_overrides() {
        let cfg = RateLimitConfig::from_values(Some("10".into()), Some("25".into()));
        assert_eq!(cfg, RateLimitConfig { per_sec: 10, burst: 25 });

        let fallback = RateLimitConfig::from_values(Some("0".into()), Some("lots".into()));
        assert_eq!(fallback, RateLimitConfig::default());
    }

    #[test]
    fn config_requires_api_key_in_api_key_mode() {
        let err = AppConfig::from_cli(cli(&["--auth-mode", "api_key"])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("MM_API_KEY")));
    }

    #[test]
    fn config_rejects_wildcard_cors() {
        let err = AppConfig::from_cli(cli(&["--api-key", "k", "--cors-origins", "*"])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn config_requires_database_url_for_postgres() {
        let err = AppConfig::from_cli(cli(&["--api-key", "k", "--storage", "postgres"])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn config_applies_valid_weight_overrides() {
        let config = AppConfig::from_cli(cli(&[
            "--api-key",
            "k",
            "--weight-area",
            "0.30",
            "--weight-schedule",
            "0.35",
        ]))
        .unwrap();
        assert_eq!(config.weights.area, 0.30);
        assert_eq!(config.weights.schedule, 0.35);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn config_rejects_weights_that_do_not_sum_to_one() {
        let err = AppConfig::from_cli(cli(&["--api-key", "k", "--weight-region", "0.5"])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("MM_WEIGHT")));
    }

    #[test]
    fn config_bounds_token_lifetime_and_hash_cost() {
        let config = AppConfig::from_cli(cli(&["--api-key", "k"])).unwrap();
        assert_eq!(config.auth.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(config.password_cost, DEFAULT_PASSWORD_COST);

        let err = AppConfig::from_cli(cli(&["--api-key", "k", "--token-ttl-secs", "0"])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("MM_TOKEN_TTL_SECS")));

        let err = AppConfig::from_cli(cli(&["--api-key", "k", "--bcrypt-cost", "3"])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("MM_BCRYPT_COST")));
    }
}
