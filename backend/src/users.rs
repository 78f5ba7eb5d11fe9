use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task;

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::handlers::{now, AdminUser, ApiJson, AppState};
use crate::models::{NewUser, Tckn, User};

#[derive(Debug, Deserialize)]
pub struct TcknRequest {
    #[serde(default)]
    pub tckn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[serde(default)]
    pub public_address: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub tckn: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindAddressRequest {
    pub tckn: String,
    pub public_address: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub tckn: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletLoginRequest {
    pub public_address: String,
    pub signature: String,
}

fn require_tckn(tckn: &str) -> Result<&str, ApiError> {
    if tckn.is_empty() {
        return Err(ApiError::BadRequest("Please provide TCKN!".to_string()));
    }
    Ok(tckn)
}

fn require_address(address: &str) -> Result<&str, ApiError> {
    if address.is_empty() {
        return Err(ApiError::BadRequest("Please provide public address!".to_string()));
    }
    Ok(address)
}

pub async fn user_exists(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TcknRequest>,
) -> Result<Json<bool>, ApiError> {
    let tckn = require_tckn(&req.tckn)?;
    let exists = state.store.user_exists_by_tckn(tckn).await?;
    Ok(Json(exists))
}

pub async fn get_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

pub async fn get_user_by_tckn(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TcknRequest>,
) -> Result<Json<User>, ApiError> {
    let tckn = require_tckn(&req.tckn)?;
    state
        .store
        .find_user_by_tckn(tckn)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn get_user_by_address(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddressRequest>,
) -> Result<Json<User>, ApiError> {
    let address = require_address(&req.public_address)?;
    state
        .store
        .find_user_by_address(address)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn set_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let tckn = Tckn::parse(&req.tckn)?;

    // The store rejects duplicates on insert as well; this gives the friendlier message.
    if state.store.user_exists_by_tckn(tckn.as_str()).await? {
        return Err(ApiError::Conflict(
            "User already exists. Try updating it!".to_string(),
        ));
    }

    let password_hash = match req.password {
        Some(password) if password.is_empty() => {
            return Err(ApiError::BadRequest("Password must not be empty".to_string()));
        }
        Some(password) => Some(
            task::spawn_blocking(move || auth::hash_password(&password))
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))??,
        ),
        None => None,
    };

    let user = NewUser {
        tckn,
        password_hash,
    }
    .into_user(now());
    let created = state.store.insert_user(user).await?;
    log::info!("Registered user {}", created.tckn);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created", "tckn": created.tckn })),
    ))
}

pub async fn update_public_address(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BindAddressRequest>,
) -> Result<Json<Value>, ApiError> {
    let address = state.wallet.parse_address(&req.public_address)?;

    if let Some(holder) = state.store.find_user_by_address(&address).await? {
        if holder.tckn != req.tckn {
            return Err(ApiError::Conflict(
                "Public address is bound to another user".to_string(),
            ));
        }
    }

    if !state.store.set_public_address(&req.tckn, &address).await? {
        return Err(ApiError::NotFound("User does not exist".to_string()));
    }
    log::info!("Bound public address {} to user {}", address, req.tckn);

    Ok(Json(json!({ "message": "User public address updated successfully" })))
}

pub async fn user_jwt(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TcknRequest>,
) -> Result<Json<Value>, ApiError> {
    let tckn = require_tckn(&req.tckn)?;
    if !state.store.user_exists_by_tckn(tckn).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let token = auth::issue_token(tckn, &state.config.jwt_secret, state.token_ttl())?;
    Ok(Json(json!({ "message": "User authenticated", "token": token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<bool>, ApiError> {
    let user = state
        .store
        .find_user_by_tckn(&req.tckn)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User does not exist!".to_string()))?;

    let matches = match user.password_hash {
        Some(stored) => task::spawn_blocking(move || auth::verify_password(&req.password, &stored))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        None => false,
    };
    if !matches {
        log::warn!("Failed login for user {}", user.tckn);
    }
    Ok(Json(matches))
}

pub async fn verify(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let claims: Claims = auth::verify_token(&req.token, &state.config.jwt_secret)?;
    Ok(Json(json!({ "message": "User verified", "user": claims })))
}

/// Hands out the challenge a wallet must sign to log in.
pub async fn nonce(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddressRequest>,
) -> Result<Json<Value>, ApiError> {
    let address = state.wallet.parse_address(require_address(&req.public_address)?)?;
    let user = state
        .store
        .find_user_by_address(&address)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "nonce": user.nonce,
        "message": state.wallet.challenge_message(user.nonce),
    })))
}

pub async fn wallet_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WalletLoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let address = state.wallet.parse_address(&req.public_address)?;
    let user = state
        .store
        .find_user_by_address(&address)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let message = state.wallet.challenge_message(user.nonce);
    if !state
        .wallet
        .verify_signature(&address, &req.signature, &message)?
    {
        log::warn!("Wallet signature rejected for user {}", user.tckn);
        return Err(ApiError::Unauthorized(
            "Signature verification failed".to_string(),
        ));
    }

    // Advancing the nonce retires the signed challenge.
    if !state
        .store
        .set_nonce(&user.tckn, user.nonce, user.nonce + 1)
        .await?
    {
        return Err(ApiError::Unauthorized("Challenge already used".to_string()));
    }

    let token = auth::issue_token(&user.tckn, &state.config.jwt_secret, state.token_ttl())?;
    log::info!("Wallet login for user {}", user.tckn);
    Ok(Json(json!({ "message": "User authenticated", "token": token })))
}
