pub mod ask;
pub mod chat;
pub mod init;

use scoutline_agent::Session;
use scoutline_config::AppConfig;
use scoutline_core::event::EventBus;
use scoutline_core::ui::Ui;
use scoutline_tools::HttpToolBackend;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Load the config and insist on a usable model endpoint.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && !scoutline_providers::is_local(&config.provider_url) {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SCOUTLINE_API_KEY    (generic)");
        eprintln!("    OPENROUTER_API_KEY   (recommended)");
        eprintln!("    OPENAI_API_KEY       (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// Wire a session from config: provider, HTTP tools, limits and settings.
pub fn build_session(
    config: &AppConfig,
    ui: Arc<dyn Ui>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let provider = scoutline_providers::build_from_config(config)?;
    let backend = Arc::new(HttpToolBackend::new(config.search.clone()));

    let event_bus = Arc::new(EventBus::default());
    spawn_event_logger(&event_bus);

    let mut session = Session::new(provider, backend, ui, &config.default_model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_limits(config.orchestrator.clone())
        .with_search_engine(config.search.engine)
        .with_event_bus(event_bus);
    session.initialize(config.settings);

    Ok(session)
}

/// Forward domain events to the debug log.
fn spawn_event_logger(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => tracing::debug!(event = ?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
