use crate::error::Result;
use crate::history::MovementHistoryEntry;
use crate::item::{
    Item, ItemFilter, ItemId, ItemUpdate, ItemWithPath, LoanRequest, MoveRequest, NewItem,
};
use crate::location::{
    LocationDetail, LocationId, LocationKind, LocationNode, LocationUpdate, LocationView,
    NewLocation, PathSegment,
};
use crate::search::{QrTarget, SearchResult, SearchResults};
use crate::wardrobe::{ClothingFilter, ClothingItem, ClothingUpdate, NewClothingItem};

/// The trait that all inventory storage backends implement.
///
/// Every placement change (create, move, return, wash-and-return, laundry
/// moves) is committed together with its movement history entry; a backend
/// must never expose one without the other.
pub trait InventoryStore: Send + Sync {
    // ==================== Locations ====================

    /// Create a location, enforcing the nesting rules. System-managed kinds are rejected.
    fn create_location(&self, new: NewLocation) -> Result<LocationView>;

    /// Get a location with its derived counts.
    fn get_location(&self, id: LocationId) -> Result<LocationView>;

    /// Get a location with its breadcrumb path and direct children.
    fn location_detail(&self, id: LocationId) -> Result<LocationDetail>;

    /// Rename or re-describe a location.
    fn update_location(&self, id: LocationId, update: LocationUpdate) -> Result<LocationView>;

    /// Delete an empty leaf location.
    fn delete_location(&self, id: LocationId) -> Result<()>;

    /// Root-level locations.
    fn list_roots(&self) -> Result<Vec<LocationView>>;

    /// Every location, flat.
    fn list_locations(&self) -> Result<Vec<LocationView>>;

    /// The full nested tree, one node per root.
    fn location_tree(&self) -> Result<Vec<LocationNode>>;

    /// The nested subtree rooted at `id`.
    fn location_subtree(&self, id: LocationId) -> Result<LocationNode>;

    /// Breadcrumbs from the root down to `id`.
    fn location_path(&self, id: LocationId) -> Result<Vec<PathSegment>>;

    /// Add an alias (no-op if present).
    fn add_location_alias(&self, id: LocationId, alias: &str) -> Result<LocationView>;

    /// Remove an alias (no-op if absent).
    fn remove_location_alias(&self, id: LocationId, alias: &str) -> Result<LocationView>;

    /// The laundry basket of `kind`, provisioned at the root if none exists.
    fn laundry_basket(&self, kind: LocationKind) -> Result<LocationView>;

    // ==================== Items ====================

    /// Create an item and record its initial placement.
    fn create_item(&self, new: NewItem) -> Result<Item>;

    /// Get an item by ID.
    fn get_item(&self, id: ItemId) -> Result<Item>;

    /// Get an item with the breadcrumb path of its current location.
    fn get_item_with_path(&self, id: ItemId) -> Result<ItemWithPath>;

    /// Items matching a filter.
    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    /// Edit name, description, quantity or aliases.
    fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Item>;

    /// Move an item, recording the move.
    fn move_item(&self, id: ItemId, request: MoveRequest) -> Result<Item>;

    /// Return an item to its permanent location, recording the return.
    fn return_item(&self, id: ItemId) -> Result<Item>;

    /// Lend an item out. Location is untouched.
    fn lend_item(&self, id: ItemId, request: LoanRequest) -> Result<Item>;

    /// Mark a lent item as back.
    fn return_loan(&self, id: ItemId) -> Result<Item>;

    /// Items currently lent.
    fn list_lent_items(&self) -> Result<Vec<Item>>;

    /// Permanently delete an item. Its history is kept.
    fn delete_item(&self, id: ItemId) -> Result<()>;

    // ==================== History ====================

    /// Entries for an item, newest first.
    fn list_history(
        &self,
        item_id: ItemId,
        limit: Option<usize>,
    ) -> Result<Vec<MovementHistoryEntry>>;

    // ==================== Wardrobe ====================

    fn create_clothing_item(&self, new: NewClothingItem) -> Result<ClothingItem>;

    fn get_clothing_item(&self, id: ItemId) -> Result<ClothingItem>;

    fn list_clothing_items(&self, filter: &ClothingFilter) -> Result<Vec<ClothingItem>>;

    fn update_clothing_item(&self, id: ItemId, update: ClothingUpdate) -> Result<ClothingItem>;

    /// Log one wear.
    fn wear_item(&self, id: ItemId) -> Result<ClothingItem>;

    /// Reset wear tracking; sends the item home if it is away.
    fn wash_item(&self, id: ItemId) -> Result<ClothingItem>;

    /// Move to the dirty-laundry basket and mark as washing.
    fn move_to_laundry(&self, id: ItemId) -> Result<ClothingItem>;

    /// Move a rewearable item to the worn-clothes basket.
    fn move_to_worn_basket(&self, id: ItemId) -> Result<ClothingItem>;

    /// Clothing that is dirty or in the wash.
    fn laundry_items(&self) -> Result<Vec<ClothingItem>>;

    /// Clothing that can be worn again without washing.
    fn rewear_safe_items(&self) -> Result<Vec<ClothingItem>>;

    // ==================== Search ====================

    /// Substring search over items and locations.
    fn search(&self, query: &str) -> Result<SearchResults>;

    /// Locations carrying `alias`.
    fn search_by_alias(&self, alias: &str) -> Result<Vec<SearchResult>>;

    /// Resolve a scanned label to a location or an item.
    fn resolve_qr(&self, code: &str) -> Result<QrTarget>;
}
