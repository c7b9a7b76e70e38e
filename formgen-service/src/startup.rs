//! Application startup and lifecycle management.

use crate::config::FormgenConfig;
use crate::handlers;
use crate::models;
use crate::services::providers::gigachat::GigaChatProvider;
use crate::services::providers::ChatProvider;
use crate::services::GenerationService;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{make_request_span, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::forms::create_form,
        handlers::forms::improve_form,
        handlers::forms::analyze_results,
        handlers::questions::generate_question,
        handlers::questions::generate_multiple_questions,
        handlers::questions::improve_question,
    ),
    components(
        schemas(
            models::AnswerType,
            models::Question,
            models::Form,
            models::FormGenerationRequest,
            models::FormImprovementRequest,
            models::QuestionGenerationRequest,
            models::MultipleQuestionGenerationRequest,
            models::QuestionImprovementRequest,
            models::SurveyAnalysisRequest,
            models::SurveyInfo,
            models::QuestionAnalysis,
        )
    ),
    tags(
        (name = "Forms", description = "Form generation, improvement and result analysis"),
        (name = "Questions", description = "Question generation and improvement"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: FormgenConfig,
    pub generation: Arc<GenerationService>,
}

pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_handler));

    if state.config.swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Keep the OpenAPI JSON for programmatic access
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    app.route("/forms/create", post(handlers::forms::create_form))
        .route("/forms/improve", post(handlers::forms::improve_form))
        .route(
            "/forms/analyze_results",
            post(handlers::forms::analyze_results),
        )
        .route(
            "/questions/generate",
            post(handlers::questions::generate_question),
        )
        .route(
            "/questions/generate_multiple",
            post(handlers::questions::generate_multiple_questions),
        )
        .route(
            "/questions/improve",
            post(handlers::questions::improve_question),
        )
        .with_state(state)
        .layer(from_fn(handlers::metrics::http_metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the GigaChat provider described by `config`.
    pub async fn build(config: FormgenConfig) -> Result<Self, AppError> {
        let provider = GigaChatProvider::new(config.gigachat.clone(), config.llm.request_timeout())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if config.gigachat.credentials.is_none() {
            tracing::warn!("GIGACHAT_CREDENTIALS not set; generation requests will fail");
        }

        tracing::info!(
            model = %config.llm.model,
            api = %config.gigachat.api_base_url,
            verify_tls = config.gigachat.verify_tls,
            "Initialized GigaChat provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an already constructed chat provider.
    pub async fn build_with_provider(
        config: FormgenConfig,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self, AppError> {
        let generation = Arc::new(GenerationService::new(provider, &config.llm));

        let state = AppState {
            config: config.clone(),
            generation,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Formgen service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
