use std::sync::Arc;

use anyhow::Context;
use email_triage::api::triage_routes;
use email_triage::config::{ServerConfig, TriageConfig};
use email_triage::llm::{LlmConfig, create_provider};
use email_triage::pipeline::TriageProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let llm_config = LlmConfig::from_env().context("invalid LLM configuration")?;
    let triage_config = TriageConfig::from_env().context("invalid triage configuration")?;
    let server_config = ServerConfig::from_env().context("invalid server configuration")?;

    eprintln!("📬 Email Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!(
        "   API: http://{}/api/process",
        server_config.socket_addr()
    );

    // Create LLM provider (None without GEMINI_API_KEY)
    let llm = create_provider(&llm_config)?;
    if llm.is_none() {
        eprintln!("   Warning: GEMINI_API_KEY not set, model-backed triage is disabled");
    }

    let processor = Arc::new(TriageProcessor::new(llm, triage_config));
    let app = triage_routes(processor, server_config.max_upload_bytes);

    let addr = server_config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Triage server started");

    axum::serve(listener, app).await?;

    Ok(())
}
