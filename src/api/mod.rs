pub mod routes;
pub mod models;
pub mod errors;
pub mod auth;

use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, info_span, warn, Level};
use crate::auth::TokenService;
use crate::config::VulnscanConfig;
use crate::db::Database;
use crate::errors::VulnscanError;
use crate::llm::{create_provider, LLMProvider};
use crate::llm::router::DEFAULT_PROVIDER;
use crate::scanner::{ScannerConnector, ScannerSession, UnixSocketConnector};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Opens authenticated scanner sessions with the service account.
#[derive(Clone)]
pub struct ScannerGateway {
    connector: Arc<dyn ScannerConnector>,
    username: Arc<str>,
    password: Arc<str>,
}

impl ScannerGateway {
    pub fn new(connector: Arc<dyn ScannerConnector>, username: &str, password: &str) -> Self {
        Self {
            connector,
            username: Arc::from(username),
            password: Arc::from(password),
        }
    }

    pub async fn session(&self) -> Result<ScannerSession, VulnscanError> {
        ScannerSession::open(self.connector.as_ref(), &self.username, &self.password).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub scanner: ScannerGateway,
    pub llm: Option<Arc<dyn LLMProvider>>,
}

pub fn create_app_state(config: &VulnscanConfig) -> Result<AppState, VulnscanError> {
    let db = Database::new(&config.database.path)?;
    let ttl = i64::try_from(config.auth.token_ttl_minutes)
        .map_err(|_| VulnscanError::Config("auth.token_ttl_minutes is too large".into()))?;
    let tokens = TokenService::new(&config.auth.jwt_secret, ttl);

    let connector = Arc::new(UnixSocketConnector::new(&config.scanner.socket_path));
    let scanner = ScannerGateway::new(connector, &config.scanner.username, &config.scanner.password);

    let llm = match &config.llm {
        Some(llm) => {
            let provider = create_provider(
                llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER),
                llm.api_key.as_deref().unwrap_or(""),
                llm.model.as_deref(),
                llm.base_url.as_deref(),
            )?;
            info!(provider = provider.provider_name(), model = provider.model_name(), "AI lookup enabled");
            Some(Arc::from(provider))
        }
        None => {
            info!("No llm section configured, AI lookup disabled");
            None
        }
    };

    Ok(AppState { db, tokens, scanner, llm })
}

async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    let value = HeaderValue::from_str(&id).ok();
    if let Some(v) = &value {
        request.headers_mut().insert(REQUEST_ID_HEADER, v.clone());
    }
    let mut response = next.run(request).await;
    if let Some(v) = value {
        response.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    response
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([REQUEST_ID_HEADER, header::CONTENT_DISPOSITION]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            let client = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|c| c.0.to_string())
                .unwrap_or_else(|| "-".to_string());
            info_span!(
                "request",
                id = %request_id,
                method = %request.method(),
                path = %request.uri().path(),
                client = %client,
            )
        })
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/health", axum::routing::get(routes::health::health_check))
        .nest("/auth", routes::auth::routes())
        .nest("/groups", routes::groups::routes())
        .nest("/scanner", routes::scanner_routes())
        .nest("/ai", routes::ai::routes())
        .with_state(state)
        .layer(trace)
        .layer(middleware::from_fn(assign_request_id))
        .layer(cors_layer(cors_origins))
}
