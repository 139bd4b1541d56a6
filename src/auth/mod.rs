pub mod verifier;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::{error::AppError, state::AppState};

/// Request identity resolved from the bearer token. `is_admin` comes from
/// configuration, not from the token itself.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: Option<String>,
    pub is_guest: bool,
    pub is_admin: bool,
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::forbidden("admin access required"))
        }
    }

    pub fn require_registered(&self) -> Result<(), AppError> {
        if self.is_guest {
            Err(AppError::forbidden("guest sessions cannot perform this action"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let identity = state
            .verifier
            .verify(bearer.token())
            .await
            .map_err(|_| AppError::unauthorized())?;

        let is_admin = state.config.is_admin(&identity.uid);
        Ok(AuthenticatedUser {
            uid: identity.uid,
            email: identity.email,
            is_guest: identity.is_guest,
            is_admin,
        })
    }
}
