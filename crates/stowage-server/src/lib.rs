//! Stowage Server - inventory API server
//!
//! JSON over HTTP for locations, items, movement history, the wardrobe and search.

pub mod http;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stowage_core::{InventoryStore, StowageConfig};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub config: StowageConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, config: StowageConfig) -> Self {
        Self { store, config }
    }

    /// Open the SQLite database named by `config`
    #[cfg(feature = "sqlite")]
    pub fn open(config: StowageConfig) -> stowage_core::Result<Self> {
        let store = stowage_core::SqliteInventoryStore::from_config(&config)?;
        tracing::info!("Opened inventory database at {}", config.database.path.display());
        Ok(Self::new(Arc::new(store), config))
    }

    /// Create with a throwaway in-memory database
    #[cfg(feature = "sqlite")]
    pub fn in_memory() -> stowage_core::Result<Self> {
        let config = StowageConfig::default();
        let store = stowage_core::SqliteInventoryStore::open_in_memory()?.with_config(&config);
        Ok(Self::new(Arc::new(store), config))
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Location endpoints
        .route(
            "/locations",
            get(http::list_root_locations).post(http::create_location),
        )
        .route("/locations/all", get(http::list_all_locations))
        .route("/locations/tree", get(http::get_location_tree))
        .route(
            "/locations/{id}",
            get(http::get_location)
                .put(http::update_location)
                .delete(http::delete_location),
        )
        .route("/locations/{id}/tree", get(http::get_location_subtree))
        .route("/locations/{id}/path", get(http::get_location_path))
        .route("/locations/{id}/items", get(http::list_location_items))
        .route("/locations/{id}/aliases", post(http::add_location_alias))
        .route(
            "/locations/{id}/aliases/{alias}",
            delete(http::remove_location_alias),
        )
        // Item endpoints
        .route("/items", get(http::list_items).post(http::create_item))
        .route("/items/lent", get(http::list_lent_items))
        .route(
            "/items/{id}",
            get(http::get_item)
                .put(http::update_item)
                .delete(http::delete_item),
        )
        .route("/items/{id}/move", post(http::move_item))
        .route("/items/{id}/return", post(http::return_item))
        .route("/items/{id}/lend", post(http::lend_item))
        .route("/items/{id}/return-loan", post(http::return_loan))
        .route("/items/{id}/history", get(http::get_item_history))
        // Wardrobe endpoints
        .route(
            "/wardrobe/items",
            get(http::list_clothing_items).post(http::create_clothing_item),
        )
        .route(
            "/wardrobe/items/{id}",
            get(http::get_clothing_item).put(http::update_clothing_item),
        )
        .route("/wardrobe/items/{id}/wear", post(http::wear_item))
        .route("/wardrobe/items/{id}/wash", post(http::wash_item))
        .route("/wardrobe/items/{id}/laundry", post(http::move_to_laundry))
        .route("/wardrobe/items/{id}/worn-basket", post(http::move_to_worn_basket))
        .route("/wardrobe/laundry", get(http::list_laundry_items))
        .route("/wardrobe/rewear-safe", get(http::list_rewear_safe_items))
        .route("/wardrobe/baskets/{kind}", get(http::get_laundry_basket))
        // Search endpoints
        .route("/search", get(http::search))
        .route("/search/alias/{alias}", get(http::search_by_alias))
        .route("/qr/{code}", get(http::resolve_qr))
        // System endpoints
        .route("/health", get(http::health))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Stowage server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
