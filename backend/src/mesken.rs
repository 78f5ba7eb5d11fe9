use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::{now, ApiJson, AppState, AuthUser, ValidatedJson};
use crate::models::{Mesken, MeskenChanges, NewMeskenRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeskenIdRequest {
    pub mesken_id: String,
}

/// Every write names the version the client last read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedRequest {
    pub mesken_id: String,
    pub version: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeskenRequest {
    pub mesken_id: String,
    pub version: i64,
    #[serde(flatten)]
    pub changes: MeskenChanges,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub mesken_id: String,
    pub version: i64,
    pub sale_info: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    pub mesken_id: String,
    pub version: i64,
    pub record: Value,
}

async fn find(state: &AppState, mesken_id: &str) -> Result<Mesken, ApiError> {
    state
        .store
        .find_mesken(mesken_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Mesken not found".to_string()))
}

/// Loads the mesken a write targets and rejects a stale `version` up front.
async fn load_for_write(state: &AppState, mesken_id: &str, version: i64) -> Result<Mesken, ApiError> {
    let mesken = find(state, mesken_id).await?;
    if mesken.version != version {
        return Err(ApiError::Conflict(format!(
            "version conflict: expected {}, found {}",
            version, mesken.version
        )));
    }
    Ok(mesken)
}

pub async fn set_mesken(
    caller: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewMeskenRequest>,
) -> Result<(StatusCode, Json<Mesken>), ApiError> {
    if req.mesken_id.trim().is_empty() {
        return Err(ApiError::BadRequest("meskenId must not be empty".to_string()));
    }

    let mesken = Mesken::new(req, &caller.tckn, now());
    let created = state.store.insert_mesken(mesken).await?;
    log::info!("User {} registered mesken {}", caller.tckn, created.mesken_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_mesken(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MeskenIdRequest>,
) -> Result<Json<Mesken>, ApiError> {
    Ok(Json(find(&state, &req.mesken_id).await?))
}

pub async fn get_meskens_on_sale(
    State(state): State<AppState>,
) -> Result<Json<Vec<Mesken>>, ApiError> {
    Ok(Json(state.store.list_meskens_on_sale().await?))
}

pub async fn my_meskens(
    caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Mesken>>, ApiError> {
    Ok(Json(state.store.list_meskens_by_owner(&caller.tckn).await?))
}

pub async fn update_mesken(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateMeskenRequest>,
) -> Result<Json<Mesken>, ApiError> {
    req.changes.validate()?;
    let mut mesken = load_for_write(&state, &req.mesken_id, req.version).await?;
    mesken.ensure_owner(&caller.tckn)?;

    mesken.apply_changes(req.changes, now());
    let saved = state.store.save_mesken(mesken).await?;
    log::info!("Mesken {} updated to version {}", saved.mesken_id, saved.version);
    Ok(Json(saved))
}

pub async fn put_mesken_on_sale(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaleRequest>,
) -> Result<Json<Mesken>, ApiError> {
    let mut mesken = load_for_write(&state, &req.mesken_id, req.version).await?;
    mesken.ensure_owner(&caller.tckn)?;

    mesken.put_on_sale(req.sale_info, now());
    let saved = state.store.save_mesken(mesken).await?;
    log::info!("Mesken {} put on sale by {}", saved.mesken_id, caller.tckn);
    Ok(Json(saved))
}

pub async fn cancel_mesken_sale(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VersionedRequest>,
) -> Result<Json<Mesken>, ApiError> {
    let mut mesken = load_for_write(&state, &req.mesken_id, req.version).await?;
    mesken.ensure_owner(&caller.tckn)?;

    mesken.cancel_sale(now())?;
    let saved = state.store.save_mesken(mesken).await?;
    log::info!("Sale of mesken {} withdrawn", saved.mesken_id);
    Ok(Json(saved))
}

pub async fn buy_mesken(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VersionedRequest>,
) -> Result<Json<Mesken>, ApiError> {
    let mut mesken = load_for_write(&state, &req.mesken_id, req.version).await?;

    let seller = mesken.sell_to(&caller.tckn, now())?;
    let sold = state.store.transfer_mesken(mesken, &seller).await?;
    log::info!(
        "Mesken {} sold by {} to {}",
        sold.mesken_id,
        seller,
        caller.tckn
    );
    Ok(Json(sold))
}

pub async fn add_maintenance(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MaintenanceRequest>,
) -> Result<Json<Mesken>, ApiError> {
    let mut mesken = load_for_write(&state, &req.mesken_id, req.version).await?;
    mesken.ensure_owner(&caller.tckn)?;

    mesken.add_maintenance(req.record, now());
    let saved = state.store.save_mesken(mesken).await?;
    log::info!("Maintenance recorded on mesken {}", saved.mesken_id);
    Ok(Json(saved))
}
