use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::header::{HeaderName, HeaderValue, CONTENT_TYPE},
    http::Method,
    http::Request,
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use cr_common::catalog::Catalog;
use cr_common::embedding::{create_embedder, load_config_from_env, EmbedderConfig};
use cr_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use cr_common::recommend::{RecommendConfig, RecommendEngine};
use cr_common::Circle;

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{circles, health, search};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "cr-api", about = "HTTP API for the circle recommendation GUI")]
struct Cli {
    /// Path to circles.json
    #[arg(long, env = "CR_CIRCLES_PATH", default_value = "data/circles.json")]
    circles_path: PathBuf,

    /// Path to circle_embeddings.json (index-aligned with circles.json)
    #[arg(long, env = "CR_EMBEDDINGS_PATH", default_value = "data/circle_embeddings.json")]
    embeddings_path: PathBuf,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Embedder implementation name
    #[arg(long, env = "CR_EMBEDDER", default_value = "hash")]
    embedder: String,

    /// Number of results returned by default
    #[arg(long, env = "CR_TOP_K", default_value_t = 5)]
    top_k: usize,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "CR_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub circles_path: PathBuf,
    pub embeddings_path: PathBuf,
    pub port: u16,
    pub embedder: String,
    pub top_k: usize,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::Startup(
                "CR_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        if cli.top_k == 0 {
            return Err(ApiError::Startup("CR_TOP_K must be positive".into()));
        }

        Ok(Self {
            circles_path: cli.circles_path,
            embeddings_path: cli.embeddings_path,
            port: cli.port,
            embedder: cli.embedder,
            top_k: cli.top_k,
            cors_origins,
        })
    }

    pub fn for_tests() -> Self {
        Self {
            circles_path: "data/circles.json".into(),
            embeddings_path: "data/circle_embeddings.json".into(),
            port: 3001,
            embedder: "hash".into(),
            top_k: 5,
            cors_origins: vec!["http://localhost:3000".into()],
        }
    }
}

pub struct AppState {
    pub engine: RecommendEngine,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
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
        )
    });

    let api_routes = Router::new()
        .route("/search", post(search::run_search))
        .route("/circles", get(circles::list_circles))
        .route("/categories", get(circles::list_categories));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

/// テスト用の小さなカタログで状態を組み立てる（ファイル不要）
pub fn test_state() -> SharedState {
    let circles = vec![
        Circle {
            name: "コーラス会".into(),
            description: "童謡や唱歌をみんなで歌う合唱サークルです".into(),
            tags: vec!["音楽".into()],
        },
        Circle {
            name: "囲碁クラブ".into(),
            description: "初心者からベテランまで囲碁を楽しむ集まりです".into(),
            tags: vec![],
        },
    ];

    let config = EmbedderConfig {
        dimension: 16,
        ..EmbedderConfig::default()
    };
    let embedder = create_embedder("hash", config);
    let embeddings = circles
        .iter()
        .map(|circle| embedder.embed_circle(circle).vector)
        .collect();

    let catalog = Catalog::from_parts(circles, embeddings).expect("test catalog is valid");
    let engine = RecommendEngine::new(catalog, embedder, RecommendConfig::default())
        .expect("test dimensions align");

    Arc::new(AppState {
        engine,
        config: AppConfig::for_tests(),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber("cr-api");
    install_tracing_panic_hook("cr-api");

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;

    let catalog = Catalog::load(&config.circles_path, &config.embeddings_path)
        .map_err(|err| ApiError::Startup(format!("failed to load circle catalog: {err}")))?;

    let embedder = create_embedder(&config.embedder, load_config_from_env());
    let engine = RecommendEngine::new(
        catalog,
        embedder,
        RecommendConfig {
            top_k: config.top_k,
            ..RecommendConfig::default()
        },
    )
    .map_err(|err| ApiError::Startup(err.to_string()))?;

    let state = Arc::new(AppState {
        engine,
        config: config.clone(),
        readiness: Arc::new(AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        circles = state.engine.catalog().len(),
        embedder = state.engine.embedder_name(),
        "cr-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
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

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
