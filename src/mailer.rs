use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Logs outgoing mail instead of delivering it. A real SMTP or API-backed
/// sender plugs in behind the same trait.
#[derive(Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(%to, %subject, body_len = body.len(), "email queued");
        Ok(())
    }
}

/// Notifications never block or fail the caller's request; delivery errors
/// are logged and dropped.
pub fn send_in_background(mailer: Arc<dyn EmailSender>, to: String, subject: String, body: String) {
    tokio::spawn(async move {
        if let Err(err) = mailer.send(&to, &subject, &body).await {
            tracing::warn!(%to, %subject, error = %err, "email delivery failed");
        }
    });
}
