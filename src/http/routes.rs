use crate::http::AppState;
use crate::http::error::ApiError;
use crate::http::schema::{AssetListSchema, AssetSchema, AssetsParams, ErrorBody, StorageDetailsSchema};
use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::response::IntoResponse;

/// List assets newer than the given revision and/or timestamp.
#[utoipa::path(
    get,
    path = "/api/assets.json",
    tag = "assets",
    params(AssetsParams),
    responses(
        (status = 200, description = "Matching assets sorted by username", body = AssetListSchema),
        (status = 404, description = "Nothing matched", body = ErrorBody),
        (status = 422, description = "Malformed query", body = ErrorBody),
    ),
)]
pub async fn list_assets(
    State(service): State<AppState>,
    params: Result<Query<AssetsParams>, QueryRejection>,
) -> Result<Json<AssetListSchema>, ApiError> {
    let Query(params) = params?;
    let list = service.list_assets(params.into()).await?;
    Ok(Json(list.into()))
}

#[utoipa::path(
    get,
    path = "/api/assets/by-kuid/{kuid}",
    tag = "assets",
    params(("kuid" = String, Path, description = "`kuid:<user>:<content>` or `kuid2:<user>:<content>:<version>`", example = "kuid:-3:10002")),
    responses(
        (status = 200, body = AssetSchema),
        (status = 404, description = "Unknown kuid", body = ErrorBody),
        (status = 422, description = "Invalid kuid", body = ErrorBody),
    ),
)]
pub async fn get_by_kuid(
    State(service): State<AppState>,
    kuid: Result<Path<String>, PathRejection>,
) -> Result<Json<AssetSchema>, ApiError> {
    let Path(kuid) = kuid?;
    Ok(Json(service.get_by_kuid(&kuid).await?.into()))
}

#[utoipa::path(
    get,
    path = "/api/assets/by-file/{fileId}",
    tag = "assets",
    params(("fileId" = String, Path, description = "32 character file identifier")),
    responses(
        (status = 200, body = AssetSchema),
        (status = 404, description = "Unknown file id", body = ErrorBody),
        (status = 422, description = "Invalid file id", body = ErrorBody),
    ),
)]
pub async fn get_by_file_id(
    State(service): State<AppState>,
    file_id: Result<Path<String>, PathRejection>,
) -> Result<Json<AssetSchema>, ApiError> {
    let Path(file_id) = file_id?;
    Ok(Json(service.get_by_file_id(&file_id).await?.into()))
}

/// Current revision and the size of both storage tiers.
///
/// The result is cached; `Cache-Control` carries its remaining lifetime.
#[utoipa::path(
    get,
    path = "/api/assets/details",
    tag = "assets",
    responses(
        (status = 200, body = StorageDetailsSchema),
        (status = 500, description = "A storage tier could not be read", body = ErrorBody),
    ),
)]
pub async fn storage_details(State(service): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cached = service.storage_details().await?;
    let max_age = format!("max-age={}", cached.max_age());
    Ok(([(CACHE_CONTROL, max_age)], Json(StorageDetailsSchema::from(cached.value))))
}
