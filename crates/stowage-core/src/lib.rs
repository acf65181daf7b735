//! Stowage Core - personal storage and inventory tracking
//!
//! - **Location**: a tree of rooms, furniture, containers, surfaces and portables
//! - **Rules**: which location kind may nest under which parent kind
//! - **Item**: placement tracking with a permanent home, temporary placements and loans
//! - **History**: append-only movement log for every placement change
//! - **Wardrobe**: clothing items with a wear/wash cycle and laundry baskets
//! - **Search**: substring search, alias lookup and QR label resolution
//! - **Store**: the `InventoryStore` trait and its SQLite implementation
//!
//! ```text
//! Room → Furniture → Container → Container …
//!   └──→ Surface → Portable → Container
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod item;
pub mod location;
pub mod rules;
pub mod search;
pub mod store;
pub mod wardrobe;

#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use config::{
    ConfigError, DatabaseConfig, InventoryConfig, ServerConfig, StowageConfig, WardrobeConfig,
};
pub use error::{Entity, Result, StowageError};
pub use history::{MovementAction, MovementHistoryEntry};
pub use item::{
    Item, ItemFilter, ItemId, ItemType, ItemUpdate, ItemWithPath, LoanRequest, MoveRequest,
    NewItem, PlacementChange, PlacementState,
};
pub use location::{
    format_path, Location, LocationDetail, LocationForest, LocationId, LocationKind,
    LocationNode, LocationUpdate, LocationView, NewLocation, PathSegment,
};
pub use search::{QrTarget, SearchHitKind, SearchResult, SearchResults};
pub use store::InventoryStore;
pub use wardrobe::{
    Cleanliness, ClothingCategory, ClothingFilter, ClothingItem, ClothingProfile, ClothingUpdate,
    NewClothingItem,
};

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteInventoryStore;
