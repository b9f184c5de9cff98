//! Application state and router assembly.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use drafting::{
    ArticleStore, GenerationPipeline, HttpReranker, HybridSearcher, PostgresStore, StyleRetriever,
    TieredGateway, Verifier,
};
use llm_client::LlmClient;

use crate::config::ServerConfig;
use crate::routes;

/// Shared application state. All handles are process-wide singletons,
/// initialized once at startup and safe for concurrent use.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<GenerationPipeline>,
    pub searcher: Arc<HybridSearcher>,
    pub verifier: Arc<Verifier>,
    pub store: Arc<dyn ArticleStore>,
    pub config: Arc<ServerConfig>,
}

/// Build the application state and router.
pub async fn build_app(config: ServerConfig) -> anyhow::Result<Router> {
    let store = Arc::new(PostgresStore::new(&config.database_url).await?);
    Ok(build_app_with_store(config, store))
}

/// Assemble the router over an already-constructed store. Split out so
/// tests can inject a memory store.
pub fn build_app_with_store<S: ArticleStore + 'static>(config: ServerConfig, store: Arc<S>) -> Router {
    let mut client = LlmClient::new(config.llm_api_key.clone());
    if let Some(base_url) = &config.llm_base_url {
        client = client.with_base_url(base_url.clone());
    }

    let gateway = Arc::new(
        TieredGateway::new(
            client,
            config.model_high.clone(),
            config.model_lite.clone(),
            config.embedding_model.clone(),
        )
        .with_lite_routing(config.generation.use_lite_model)
        .with_call_timeout(config.generation.call_timeout),
    );

    // Reranker absence is graceful degradation, not an error.
    let reranker = HttpReranker::try_shared(config.reranker_url.as_deref());

    let searcher = Arc::new(HybridSearcher::new(
        gateway.clone(),
        store.clone(),
        reranker.clone(),
        config.generation.reranker_top_k,
    ));
    let style_retriever = Arc::new(StyleRetriever::new(
        gateway.clone(),
        store.clone(),
        reranker,
    ));

    let pipeline = Arc::new(GenerationPipeline::new(
        gateway.clone(),
        store.clone(),
        searcher.clone(),
        style_retriever,
        config.generation.clone(),
    ));
    let verifier = Arc::new(Verifier::new(gateway));

    let state = AppState {
        pipeline,
        searcher,
        verifier,
        store,
        config: Arc::new(config),
    };

    Router::new()
        .route("/api/generate", post(routes::generate::generate_handler))
        .route(
            "/api/generate/stream",
            post(routes::generate::generate_stream_handler),
        )
        .route("/api/search", post(routes::search::search_handler))
        .route("/api/verify", post(routes::verify::verify_handler))
        .route("/api/history", get(routes::history::list_handler))
        .route(
            "/api/history/:id",
            get(routes::history::get_handler).delete(routes::history::delete_handler),
        )
        .route("/health", get(routes::health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
