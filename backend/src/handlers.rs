use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use validator::Validate;

use crate::auth;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::solana::WalletVerifier;
use crate::store::Store;

/// Shared by every handler; the store and wallet verifier are created once.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub wallet: Arc<WalletVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            wallet: Arc::new(WalletVerifier::default()),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.config.token_ttl_days)
    }
}

/// `Json` whose rejections come back as `{error, code}` with status 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// An [`ApiJson`] body that must also pass its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Caller identified by a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub tckn: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            })?;

        let claims = auth::verify_token(token.trim(), &state.config.jwt_secret).map_err(|e| {
            log::warn!("Rejected bearer token: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;
        Ok(AuthUser { tckn: claims.tckn })
    }
}

/// An [`AuthUser`] whose TCKN is listed in `ADMIN_TCKNS`.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub tckn: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !state.config.is_admin(&user.tckn) {
            log::warn!("Non-admin {} attempted an admin operation", user.tckn);
            return Err(ApiError::Forbidden("Admin permission required".to_string()));
        }
        Ok(AdminUser { tckn: user.tckn })
    }
}

pub async fn root() -> &'static str {
    "MedipolDAO Digiathon API"
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
