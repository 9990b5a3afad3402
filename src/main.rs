//! Eligibility Arbiter server binary.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eligibility_arbiter::adapters::ai::{AnthropicConfig, AnthropicResponder, ScriptedResponder};
use eligibility_arbiter::adapters::clinical::HttpFactsProvider;
use eligibility_arbiter::adapters::http::{api_router, AppState};
use eligibility_arbiter::adapters::store::{InMemoryGuidelineStore, InMemoryRunRegistry};
use eligibility_arbiter::application::RunService;
use eligibility_arbiter::config::AppConfig;
use eligibility_arbiter::domain::dialog::AgentRole;
use eligibility_arbiter::ports::{FactsProvider, ResponderSet};

#[tokio::main]
async fn main() {
    let config = AppConfig::load().expect("failed to load configuration");
    config.validate().expect("invalid configuration");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let live = build_live_responders(&config);
    let dry_run = ResponderSet::new(
        Arc::new(ScriptedResponder::dry_run_applicant()),
        Arc::new(ScriptedResponder::dry_run_administrator()),
    );

    let registry = Arc::new(InMemoryRunRegistry::new());
    let guideline_store = Arc::new(InMemoryGuidelineStore::new());
    let facts_provider = build_facts_provider(&config);
    let run_service = Arc::new(RunService::new(
        registry,
        guideline_store.clone(),
        facts_provider,
        live,
        dry_run,
    ));

    let app = api_router(AppState {
        run_service,
        guideline_store,
    })
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    info!(%addr, "eligibility arbiter listening");

    axum::serve(listener, app).await.expect("server error");
}

/// A FHIR-backed facts provider when a base URL is configured.
fn build_facts_provider(config: &AppConfig) -> Option<Arc<dyn FactsProvider>> {
    if !config.clinical.has_fhir() {
        return None;
    }
    let base_url = config.clinical.fhir_base_url.clone().unwrap_or_default();
    let provider = HttpFactsProvider::new(base_url, config.clinical.timeout())
        .expect("failed to build facts provider");
    Some(Arc::new(provider))
}

/// Anthropic responders when a key is configured, scripted ones otherwise.
fn build_live_responders(config: &AppConfig) -> ResponderSet {
    if config.responder.has_anthropic() {
        let key = config
            .responder
            .anthropic_api_key
            .clone()
            .unwrap_or_default();
        let anthropic_config = AnthropicConfig::new(key)
            .with_model(config.responder.model.clone())
            .with_timeout(config.responder.timeout())
            .with_max_retries(config.responder.max_retries);
        let responder = AnthropicResponder::new(anthropic_config)
            .expect("failed to build Anthropic responder");
        ResponderSet::shared(Arc::new(responder))
    } else {
        warn!("no Anthropic API key configured; live runs use scripted responders");
        ResponderSet::new(
            Arc::new(ScriptedResponder::new(AgentRole::Applicant)),
            Arc::new(ScriptedResponder::new(AgentRole::Administrator)),
        )
    }
}
