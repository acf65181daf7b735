//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use stowage_core::{
    ClothingFilter, ClothingItem, ClothingUpdate, Item, ItemFilter, ItemId, ItemUpdate,
    ItemWithPath, LoanRequest, LocationDetail, LocationId, LocationKind, LocationNode,
    LocationUpdate, LocationView, MoveRequest, MovementHistoryEntry, NewClothingItem, NewItem,
    NewLocation, PathSegment, QrTarget, SearchResult, SearchResults, StowageError,
};

use crate::AppState;

/// Error returned by every handler: a status code and a `{"detail": ...}` body
#[derive(Debug)]
pub struct ApiError(pub StowageError);

impl From<StowageError> for ApiError {
    fn from(err: StowageError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StowageError::NotFound(..) => StatusCode::NOT_FOUND,
            StowageError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StowageError::Conflict(_) => StatusCode::CONFLICT,
            StowageError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (
            status,
            Json(serde_json::json!({ "detail": self.0.detail() })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn location_id(id: &str) -> Result<LocationId, ApiError> {
    Ok(LocationId::parse(id)?)
}

fn item_id(id: &str) -> Result<ItemId, ApiError> {
    Ok(ItemId::parse(id)?)
}

// ==================== System ====================

/// Liveness check, with the address the server was configured to bind
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "addr": state.config.server.addr,
    }))
}

// ==================== Locations ====================

/// Create a location
pub async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewLocation>,
) -> Result<(StatusCode, Json<LocationView>), ApiError> {
    let view = state.store.create_location(request)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// List root-level locations
pub async fn list_root_locations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<LocationView>> {
    Ok(Json(state.store.list_roots()?))
}

/// List every location, flat
pub async fn list_all_locations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<LocationView>> {
    Ok(Json(state.store.list_locations()?))
}

/// The full nested tree
pub async fn get_location_tree(State(state): State<Arc<AppState>>) -> ApiResult<Vec<LocationNode>> {
    Ok(Json(state.store.location_tree()?))
}

/// A location with its path and direct children
pub async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<LocationDetail> {
    Ok(Json(state.store.location_detail(location_id(&id)?)?))
}

pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<LocationUpdate>,
) -> ApiResult<LocationView> {
    Ok(Json(state.store.update_location(location_id(&id)?, request)?))
}

pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_location(location_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_location_subtree(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<LocationNode> {
    Ok(Json(state.store.location_subtree(location_id(&id)?)?))
}

pub async fn get_location_path(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<PathSegment>> {
    Ok(Json(state.store.location_path(location_id(&id)?)?))
}

/// Items currently placed in a location
pub async fn list_location_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Item>> {
    let id = location_id(&id)?;
    state.store.get_location(id)?;
    Ok(Json(state.store.list_items(&ItemFilter {
        location_id: Some(id),
        ..Default::default()
    })?))
}

/// Request to add an alias
#[derive(Debug, Deserialize)]
pub struct AliasRequest {
    pub alias: String,
}

pub async fn add_location_alias(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AliasRequest>,
) -> ApiResult<LocationView> {
    Ok(Json(
        state
            .store
            .add_location_alias(location_id(&id)?, &request.alias)?,
    ))
}

pub async fn remove_location_alias(
    State(state): State<Arc<AppState>>,
    Path((id, alias)): Path<(String, String)>,
) -> ApiResult<LocationView> {
    Ok(Json(
        state.store.remove_location_alias(location_id(&id)?, &alias)?,
    ))
}

// ==================== Items ====================

/// Create an item
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state.store.create_item(request)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List items, optionally filtered by location, temporary placement or loan
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult<Vec<Item>> {
    Ok(Json(state.store.list_items(&filter)?))
}

pub async fn list_lent_items(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Item>> {
    Ok(Json(state.store.list_lent_items()?))
}

/// An item with the path of its current location
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ItemWithPath> {
    Ok(Json(state.store.get_item_with_path(item_id(&id)?)?))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ItemUpdate>,
) -> ApiResult<Item> {
    Ok(Json(state.store.update_item(item_id(&id)?, request)?))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_item(item_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> ApiResult<Item> {
    Ok(Json(state.store.move_item(item_id(&id)?, request)?))
}

/// Return an item to its permanent location
pub async fn return_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Item> {
    Ok(Json(state.store.return_item(item_id(&id)?)?))
}

pub async fn lend_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<LoanRequest>,
) -> ApiResult<Item> {
    Ok(Json(state.store.lend_item(item_id(&id)?, request)?))
}

pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Item> {
    Ok(Json(state.store.return_loan(item_id(&id)?)?))
}

/// Query parameters for history
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Movement history, newest first
pub async fn get_item_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<MovementHistoryEntry>> {
    Ok(Json(state.store.list_history(item_id(&id)?, query.limit)?))
}

// ==================== Wardrobe ====================

pub async fn create_clothing_item(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewClothingItem>,
) -> Result<(StatusCode, Json<ClothingItem>), ApiError> {
    let item = state.store.create_clothing_item(request)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List clothing, optionally by cleanliness or category
pub async fn list_clothing_items(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ClothingFilter>,
) -> ApiResult<Vec<ClothingItem>> {
    Ok(Json(state.store.list_clothing_items(&filter)?))
}

pub async fn get_clothing_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ClothingItem> {
    Ok(Json(state.store.get_clothing_item(item_id(&id)?)?))
}

pub async fn update_clothing_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ClothingUpdate>,
) -> ApiResult<ClothingItem> {
    Ok(Json(
        state.store.update_clothing_item(item_id(&id)?, request)?,
    ))
}

pub async fn wear_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ClothingItem> {
    Ok(Json(state.store.wear_item(item_id(&id)?)?))
}

pub async fn wash_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ClothingItem> {
    Ok(Json(state.store.wash_item(item_id(&id)?)?))
}

pub async fn move_to_laundry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ClothingItem> {
    Ok(Json(state.store.move_to_laundry(item_id(&id)?)?))
}

pub async fn move_to_worn_basket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ClothingItem> {
    Ok(Json(state.store.move_to_worn_basket(item_id(&id)?)?))
}

pub async fn list_laundry_items(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<ClothingItem>> {
    Ok(Json(state.store.laundry_items()?))
}

pub async fn list_rewear_safe_items(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<ClothingItem>> {
    Ok(Json(state.store.rewear_safe_items()?))
}

/// The laundry basket of a kind (`laundry_worn` or `laundry_dirty`)
pub async fn get_laundry_basket(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> ApiResult<LocationView> {
    let kind: LocationKind = kind.parse().map_err(StowageError::Validation)?;
    Ok(Json(state.store.laundry_basket(kind)?))
}

// ==================== Search ====================

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<SearchResults> {
    Ok(Json(state.store.search(&query.q)?))
}

pub async fn search_by_alias(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
) -> ApiResult<Vec<SearchResult>> {
    Ok(Json(state.store.search_by_alias(&alias)?))
}

/// Resolve a scanned QR label
pub async fn resolve_qr(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<QrTarget> {
    Ok(Json(state.store.resolve_qr(&code)?))
}
