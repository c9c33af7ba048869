//! Application startup and lifecycle management.

use crate::config::ChatConfig;
use crate::handlers;
use crate::models::catalog::GEMINI_MODELS;
use crate::models::ModelCatalog;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider, PROVIDER_NAME};
use crate::services::providers::ChatProvider;
use crate::services::ChatPipeline;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state. Read-only after start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChatConfig>,
    pub pipeline: ChatPipeline,
    pub catalog: Arc<ModelCatalog>,
}

impl AppState {
    /// Wire the pipeline with the given providers and derive the model
    /// catalog from the configured credentials.
    pub fn new(config: ChatConfig, providers: Vec<Arc<dyn ChatProvider>>) -> Self {
        let pipeline = providers.into_iter().fold(
            ChatPipeline::new(
                config.chat.default_model.clone(),
                config.chat.max_upload_bytes,
            ),
            |pipeline, provider| pipeline.with_provider(provider),
        );

        let mut catalog = ModelCatalog::new();
        if config.gemini.is_some() {
            catalog = catalog.with_provider(PROVIDER_NAME, GEMINI_MODELS);
        }

        Self {
            config: Arc::new(config),
            pipeline,
            catalog: Arc::new(catalog),
        }
    }
}

/// Providers backed by credentials present in the configuration.
pub fn configured_providers(config: &ChatConfig) -> Result<Vec<Arc<dyn ChatProvider>>, AppError> {
    let mut providers: Vec<Arc<dyn ChatProvider>> = Vec::new();

    match &config.gemini {
        Some(settings) => {
            let gemini = GeminiProvider::new(GeminiConfig::from(settings))
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            tracing::info!(api_base = %settings.api_base, "Initialized Gemini provider");
            providers.push(Arc::new(gemini));
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set - Gemini provider disabled");
        }
    }

    Ok(providers)
}

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.chat.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/chat", post(handlers::chat))
        .route("/api/models", get(handlers::list_models))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
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
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with providers derived from the configuration.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let providers = configured_providers(&config)?;
        Self::build_with_providers(config, providers).await
    }

    /// Build the application around an explicit provider set.
    pub async fn build_with_providers(
        config: ChatConfig,
        providers: Vec<Arc<dyn ChatProvider>>,
    ) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.chat.upload_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create upload directory {}: {}",
                    config.chat.upload_dir,
                    e
                );
                AppError::from(e)
            })?;

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            default_model = %config.chat.default_model,
            max_upload_bytes = config.chat.max_upload_bytes,
            "Chat service listening on port {}",
            port
        );

        let router = build_router(AppState::new(config, providers));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
