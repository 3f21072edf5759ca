use crate::config::LeafConfig;
use crate::handlers::{self, pages};
use crate::services::providers::{GeminiConfig, GeminiProvider, GenerativeModel};
use crate::services::{ChatRelay, LeafAnalyzer, LocalStorage, Storage, UploadRegistry};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: LeafConfig,
    pub uploads: Arc<dyn Storage>,
    pub reports: Arc<dyn Storage>,
    pub registry: Arc<UploadRegistry>,
    pub analyzer: Arc<LeafAnalyzer>,
    pub chat: Arc<ChatRelay>,
}

pub fn build_router(state: AppState) -> Router {
    let report_dir = ServeDir::new(&state.config.storage.report_dir);
    let body_limit = state.config.limits.body_limit_bytes;

    Router::new()
        .route("/", get(pages::index))
        .route("/weather", get(pages::weather))
        .route("/leaf", get(pages::leaf))
        .route("/chat", get(pages::chat))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/ask", post(handlers::ask))
        .route("/analyze", post(handlers::analyze))
        .route("/correct-plant", post(handlers::correct_plant))
        .route("/download-report", post(handlers::download_report))
        .nest_service("/get-report", report_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
}

impl Application {
    /// Build against the Gemini API configured in `config`.
    pub async fn build(config: LeafConfig) -> Result<Self, AppError> {
        let provider = GeminiProvider::new(GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: Duration::from_secs(config.gemini.timeout_secs),
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}", e)))?;

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    pub async fn build_with_provider(
        config: LeafConfig,
        provider: Arc<dyn GenerativeModel>,
    ) -> Result<Self, AppError> {
        let uploads = LocalStorage::new(&config.storage.upload_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize upload storage at {}: {}",
                    config.storage.upload_dir,
                    e
                );
                e
            })?;
        let reports = LocalStorage::new(&config.storage.report_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize report storage at {}: {}",
                    config.storage.report_dir,
                    e
                );
                e
            })?;

        let state = AppState {
            uploads: Arc::new(uploads),
            reports: Arc::new(reports),
            registry: Arc::new(UploadRegistry::new()),
            analyzer: Arc::new(LeafAnalyzer::new(
                provider.clone(),
                config.gemini.vision_model.clone(),
            )),
            chat: Arc::new(ChatRelay::new(provider, config.gemini.chat_model.clone())),
            config: config.clone(),
        };

        let app = build_router(state);

        let address = config.common.bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            vision_model = %config.gemini.vision_model,
            chat_model = %config.gemini.chat_model,
            "Listening"
        );

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        Ok(Self {
            port,
            server: Box::pin(server),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
