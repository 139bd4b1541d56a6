use std::sync::Arc;

use crate::{
    assistant::LegalAssistant,
    auth::verifier::TokenVerifier,
    config::AppConfig,
    gateway::PaymentGateway,
    mailer::EmailSender,
    render::DocumentRenderer,
    storage::ObjectStore,
    store::Datastore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Datastore>,
    pub blobs: Arc<dyn ObjectStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub assistant: Arc<dyn LegalAssistant>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Datastore>,
        blobs: Arc<dyn ObjectStore>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: Arc<dyn TokenVerifier>,
        assistant: Arc<dyn LegalAssistant>,
        renderer: Arc<dyn DocumentRenderer>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            blobs,
            gateway,
            verifier,
            assistant,
            renderer,
            mailer,
        }
    }
}
