use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sunolegal::assistant::{CannedAssistant, HttpAssistant, LegalAssistant};
use sunolegal::auth::verifier::{JwtVerifier, MockVerifier, TokenVerifier};
use sunolegal::config::{AppConfig, AssistantMode, AuthMode, PaymentMode};
use sunolegal::gateway::{MockGateway, PaymentGateway, RazorpayGateway};
use sunolegal::mailer::LogMailer;
use sunolegal::render::TemplateRenderer;
use sunolegal::routes::create_router;
use sunolegal::state::AppState;
use sunolegal::storage::MemoryObjectStore;
use sunolegal::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        server_host = %config.server_host,
        server_port = config.server_port,
        auth_mode = ?config.auth_mode,
        payment_mode = ?config.payment_mode,
        assistant_mode = ?config.assistant_mode,
        admin_count = config.admin_uids.len(),
        "loaded configuration"
    );

    let verifier: Arc<dyn TokenVerifier> = match config.auth_mode {
        AuthMode::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .context("JWT_SECRET must be set when AUTH_MODE=jwt")?;
            Arc::new(JwtVerifier::new(
                secret,
                config.jwt_issuer.clone(),
                config.jwt_audience.clone(),
            ))
        }
        AuthMode::Mock => Arc::new(MockVerifier::new()),
    };

    let gateway: Arc<dyn PaymentGateway> = match config.payment_mode {
        PaymentMode::Razorpay => Arc::new(RazorpayGateway::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
        )),
        PaymentMode::Mock => Arc::new(MockGateway::new()),
    };

    let assistant: Arc<dyn LegalAssistant> = match config.assistant_mode {
        AssistantMode::Http => {
            let api_key = config
                .assistant_api_key
                .as_deref()
                .context("ASSISTANT_API_KEY must be set when ASSISTANT_MODE=http")?;
            Arc::new(HttpAssistant::new(
                config.assistant_api_url.clone(),
                api_key,
                config.assistant_model.clone(),
            ))
        }
        AssistantMode::Canned => Arc::new(CannedAssistant::new()),
    };

    let listen_addr: SocketAddr =
        format!("{}:{}", config.server_host, config.server_port).parse()?;

    let state = AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryObjectStore::new()),
        gateway,
        verifier,
        assistant,
        Arc::new(TemplateRenderer::new()),
        Arc::new(LogMailer::new()),
    );
    let router = create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
