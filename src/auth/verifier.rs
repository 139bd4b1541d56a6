use anyhow::{bail, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Caller identity as reported by the external token issuer. Admin privilege
/// is not part of the token; it is derived from configuration afterwards.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub is_guest: bool,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity>;
}

/// Development verifier: the bearer token is the uid itself, optionally
/// followed by `:email`. Uids starting with `guest` denote guest sessions.
#[derive(Default)]
pub struct MockVerifier;

impl MockVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenVerifier for MockVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        if token.is_empty() {
            bail!("empty token");
        }

        let (uid, email) = match token.split_once(':') {
            Some((uid, email)) => (uid.to_string(), Some(email.to_string())),
            None => (token.to_string(), None),
        };
        if uid.is_empty() {
            bail!("empty uid");
        }

        let is_guest = uid.starts_with("guest");
        Ok(VerifiedIdentity {
            uid,
            email,
            is_guest,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IssuerClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    guest: bool,
    iss: String,
    aud: String,
    iat: usize,
    exp: usize,
}

/// HS256 verifier for tokens minted by the external identity issuer.
pub struct JwtVerifier {
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        let data = decode::<IssuerClaims>(token, &self.decoding, &validation)?;

        Ok(VerifiedIdentity {
            uid: data.claims.sub,
            email: data.claims.email,
            is_guest: data.claims.guest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "jwt-test-secret";

    fn mint(sub: &str, guest: bool, issuer: &str, audience: &str, expired: bool) -> String {
        let now = Utc::now();
        let exp = if expired {
            now - Duration::minutes(5)
        } else {
            now + Duration::minutes(5)
        };
        let claims = IssuerClaims {
            sub: sub.to_string(),
            email: Some(format!("{sub}@example.com")),
            guest,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn mock_verifier_parses_uid_and_email() {
        let verifier = MockVerifier::new();
        let identity = verifier.verify("user-1:a@b.com").await.unwrap();
        assert_eq!(identity.uid, "user-1");
        assert_eq!(identity.email.as_deref(), Some("a@b.com"));
        assert!(!identity.is_guest);

        let guest = verifier.verify("guest-7").await.unwrap();
        assert!(guest.is_guest);

        assert!(verifier.verify("").await.is_err());
    }

    #[tokio::test]
    async fn jwt_verifier_round_trip() {
        let verifier = JwtVerifier::new(SECRET, "sunolegal", "sunolegal-clients");
        let token = mint("user-1", false, "sunolegal", "sunolegal-clients", false);

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.uid, "user-1");
        assert!(!identity.is_guest);
    }

    #[tokio::test]
    async fn jwt_verifier_rejects_wrong_audience_and_expiry() {
        let verifier = JwtVerifier::new(SECRET, "sunolegal", "sunolegal-clients");

        let wrong_audience = mint("user-1", false, "sunolegal", "other-app", false);
        assert!(verifier.verify(&wrong_audience).await.is_err());

        let expired = mint("user-1", false, "sunolegal", "sunolegal-clients", true);
        assert!(verifier.verify(&expired).await.is_err());
    }
}
