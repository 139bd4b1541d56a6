use std::env;

use anyhow::{bail, Context, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Mock,
    Jwt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentMode {
    Mock,
    Razorpay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssistantMode {
    Canned,
    Http,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub auth_mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub payment_mode: PaymentMode,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_webhook_secret: String,
    pub assistant_mode: AssistantMode,
    pub assistant_api_url: String,
    pub assistant_api_key: Option<String>,
    pub assistant_model: String,
    pub signed_url_ttl_minutes: i64,
    pub admin_uids: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8001".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        let auth_mode = parse_auth_mode(
            &env::var("AUTH_MODE").unwrap_or_else(|_| "mock".to_string()),
        )?;
        let jwt_secret = match auth_mode {
            AuthMode::Jwt => Some(
                env::var("JWT_SECRET").context("JWT_SECRET must be set when AUTH_MODE=jwt")?,
            ),
            AuthMode::Mock => env::var("JWT_SECRET").ok(),
        };
        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "sunolegal".to_string());
        let jwt_audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "sunolegal-clients".to_string());

        let payment_mode = parse_payment_mode(
            &env::var("PAYMENT_MODE").unwrap_or_else(|_| "mock".to_string()),
        )?;
        let (razorpay_key_id, razorpay_key_secret, razorpay_webhook_secret) = match payment_mode {
            PaymentMode::Razorpay => (
                env::var("RAZORPAY_KEY_ID")
                    .context("RAZORPAY_KEY_ID must be set when PAYMENT_MODE=razorpay")?,
                env::var("RAZORPAY_KEY_SECRET")
                    .context("RAZORPAY_KEY_SECRET must be set when PAYMENT_MODE=razorpay")?,
                env::var("RAZORPAY_WEBHOOK_SECRET")
                    .context("RAZORPAY_WEBHOOK_SECRET must be set when PAYMENT_MODE=razorpay")?,
            ),
            PaymentMode::Mock => (
                env::var("RAZORPAY_KEY_ID").unwrap_or_else(|_| "rzp_test_key".to_string()),
                env::var("RAZORPAY_KEY_SECRET")
                    .unwrap_or_else(|_| "rzp_test_secret".to_string()),
                env::var("RAZORPAY_WEBHOOK_SECRET")
                    .unwrap_or_else(|_| "whsec_test_secret".to_string()),
            ),
        };

        let assistant_mode = parse_assistant_mode(
            &env::var("ASSISTANT_MODE").unwrap_or_else(|_| "canned".to_string()),
        )?;
        let assistant_api_url = env::var("ASSISTANT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
        let assistant_api_key = match assistant_mode {
            AssistantMode::Http => Some(
                env::var("ASSISTANT_API_KEY")
                    .context("ASSISTANT_API_KEY must be set when ASSISTANT_MODE=http")?,
            ),
            AssistantMode::Canned => env::var("ASSISTANT_API_KEY").ok(),
        };
        let assistant_model =
            env::var("ASSISTANT_MODEL").unwrap_or_else(|_| "gpt-5.2".to_string());

        let signed_url_ttl_minutes = env::var("SIGNED_URL_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("SIGNED_URL_TTL_MINUTES must be an integer")?;

        let admin_uids = env::var("ADMIN_UIDS")
            .map(|raw| parse_admin_uids(&raw))
            .unwrap_or_default();

        Ok(Self {
            server_host,
            server_port,
            cors_allowed_origin,
            auth_mode,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            payment_mode,
            razorpay_key_id,
            razorpay_key_secret,
            razorpay_webhook_secret,
            assistant_mode,
            assistant_api_url,
            assistant_api_key,
            assistant_model,
            signed_url_ttl_minutes,
            admin_uids,
        })
    }

    pub fn is_admin(&self, uid: &str) -> bool {
        self.admin_uids.iter().any(|admin| admin == uid)
    }
}

fn parse_auth_mode(value: &str) -> Result<AuthMode> {
    match value.to_ascii_lowercase().as_str() {
        "mock" => Ok(AuthMode::Mock),
        "jwt" => Ok(AuthMode::Jwt),
        other => bail!("AUTH_MODE must be 'mock' or 'jwt', got {other:?}"),
    }
}

fn parse_payment_mode(value: &str) -> Result<PaymentMode> {
    match value.to_ascii_lowercase().as_str() {
        "mock" => Ok(PaymentMode::Mock),
        "razorpay" => Ok(PaymentMode::Razorpay),
        other => bail!("PAYMENT_MODE must be 'mock' or 'razorpay', got {other:?}"),
    }
}

fn parse_assistant_mode(value: &str) -> Result<AssistantMode> {
    match value.to_ascii_lowercase().as_str() {
        "canned" => Ok(AssistantMode::Canned),
        "http" => Ok(AssistantMode::Http),
        other => bail!("ASSISTANT_MODE must be 'canned' or 'http', got {other:?}"),
    }
}

fn parse_admin_uids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
        .collect()
}
