use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection, Params, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{InventoryConfig, StowageConfig, WardrobeConfig};
use crate::error::{Entity, Result, StowageError};
use crate::history::{MovementAction, MovementHistoryEntry};
use crate::item::{
    validate_quantity, Item, ItemDraft, ItemFilter, ItemId, ItemType, ItemUpdate, ItemWithPath,
    LoanRequest, MoveRequest, NewItem,
};
use crate::location::{
    format_path, normalize_aliases, validate_description, validate_name, Location,
    LocationDetail, LocationForest, LocationId, LocationKind, LocationNode, LocationUpdate,
    LocationView, NewLocation, PathSegment,
};
use crate::rules;
use crate::schema::{Schema, SCHEMA_VERSION};
use crate::search::{
    like_pattern, new_qr_code_id, QrTarget, SearchHitKind, SearchResult, SearchResults,
};
use crate::store::InventoryStore;
use crate::wardrobe::{
    ClothingFilter, ClothingItem, ClothingProfile, ClothingUpdate, NewClothingItem,
};

const LOCATION_SELECT: &str = "SELECT l.id, l.name, l.description, l.kind, l.parent_id, \
     l.qr_code_id, l.created_at, l.updated_at, \
     (SELECT COUNT(*) FROM items i WHERE i.current_location_id = l.id), \
     (SELECT COUNT(*) FROM locations c WHERE c.parent_id = l.id) \
     FROM locations l";

const ITEM_SELECT: &str = "SELECT i.id, i.name, i.description, i.quantity, i.item_type, \
     i.current_location_id, i.permanent_location_id, i.is_temporary_placement, i.is_lent, \
     i.lent_to, i.lent_at, i.due_date, i.lent_notes, i.qr_code_id, i.last_moved_at, \
     i.created_at, i.updated_at \
     FROM items i";

const BY_NAME: &str = "COLLATE NOCASE";

/// SQLite-backed implementation of the InventoryStore trait.
pub struct SqliteInventoryStore {
    conn: Mutex<Connection>,
    inventory: InventoryConfig,
    wardrobe: WardrobeConfig,
}

impl SqliteInventoryStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init_with_connection(Connection::open_in_memory()?)
    }

    /// Open the database named by `config` and adopt its inventory and wardrobe settings.
    pub fn from_config(config: &StowageConfig) -> Result<Self> {
        Ok(Self::open(&config.database.path)?.with_config(config))
    }

    pub fn with_config(mut self, config: &StowageConfig) -> Self {
        self.inventory = config.inventory.clone();
        self.wardrobe = config.wardrobe.clone();
        self
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_fold_case(&conn)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            inventory: InventoryConfig::default(),
            wardrobe: WardrobeConfig::default(),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        let current_version = Self::schema_version(conn).unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(Schema::create_tables())?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            debug!(version = SCHEMA_VERSION, "created inventory schema");
        } else if current_version < SCHEMA_VERSION {
            for version in current_version..SCHEMA_VERSION {
                if let Some(migration) = Schema::migration(version, version + 1) {
                    conn.execute_batch(migration)?;
                }
            }
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            info!(from = current_version, to = SCHEMA_VERSION, "migrated inventory schema");
        }

        Ok(())
    }

    fn schema_version(conn: &Connection) -> Option<u32> {
        conn.query_row(
            "SELECT version FROM schema_version ORDER BY rowid DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .ok()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StowageError::Storage(e.to_string()))
    }

    fn unique_qr_code(&self, conn: &Connection, prefix: &str) -> Result<String> {
        for _ in 0..8 {
            let code = new_qr_code_id(prefix);
            let taken: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM locations WHERE qr_code_id = ?1) \
                 OR EXISTS (SELECT 1 FROM items WHERE qr_code_id = ?1)",
                [&code],
                |row| row.get(0),
            )?;
            if !taken {
                return Ok(code);
            }
        }
        Err(StowageError::Storage(
            "could not allocate a unique QR code id".to_string(),
        ))
    }

    /// The first basket of `kind`, or a new root-level one.
    fn ensure_basket(&self, conn: &Connection, kind: LocationKind) -> Result<LocationView> {
        let name = match kind {
            LocationKind::LaundryWorn => &self.wardrobe.worn_basket_name,
            LocationKind::LaundryDirty => &self.wardrobe.dirty_basket_name,
            other => {
                return Err(StowageError::validation(format!(
                    "{} is not a laundry basket kind",
                    other
                )))
            }
        };
        let existing = query_locations(
            conn,
            "WHERE l.kind = ?1 ORDER BY l.created_at, l.rowid LIMIT 1",
            [kind.as_str()],
        )?;
        if let Some(basket) = existing.into_iter().next() {
            return Ok(basket);
        }

        let now = now();
        let basket = Location {
            id: LocationId::new(),
            name: name.clone(),
            description: None,
            kind,
            parent_id: None,
            aliases: Vec::new(),
            qr_code_id: self.unique_qr_code(conn, &self.inventory.location_qr_prefix)?,
            created_at: now,
            updated_at: now,
        };
        insert_location(conn, &basket)?;
        info!(id = %basket.id, kind = %kind, "provisioned laundry basket");
        require_location(conn, basket.id)
    }

    fn insert_new_item(
        &self,
        conn: &Connection,
        draft: ItemDraft,
        item_type: ItemType,
    ) -> Result<Item> {
        for id in [draft.current_location_id, draft.permanent_location_id] {
            if !location_exists(conn, id)? {
                return Err(StowageError::validation(format!(
                    "Location does not exist: {}",
                    id
                )));
            }
        }

        let now = now();
        let item = Item {
            id: ItemId::new(),
            name: draft.name,
            description: draft.description,
            quantity: draft.quantity,
            item_type,
            current_location_id: draft.current_location_id,
            permanent_location_id: Some(draft.permanent_location_id),
            is_temporary_placement: draft.is_temporary_placement,
            is_lent: false,
            lent_to: None,
            lent_at: None,
            due_date: None,
            lent_notes: None,
            aliases: draft.aliases,
            qr_code_id: self.unique_qr_code(conn, &self.inventory.item_qr_prefix)?,
            last_moved_at: None,
            created_at: now,
            updated_at: now,
        };
        insert_item(conn, &item)?;
        insert_history(
            conn,
            &MovementHistoryEntry::created(item.id, item.current_location_id, now),
        )?;
        Ok(item)
    }

    /// Move an item to a laundry basket, recording the move.
    fn move_to_basket(
        &self,
        conn: &Connection,
        item: &mut Item,
        kind: LocationKind,
        note: &str,
    ) -> Result<()> {
        let basket = self.ensure_basket(conn, kind)?;
        let change = item.plan_move(basket.location.id, true)?;
        let now = now();
        item.apply(&change, now);
        write_item(conn, item)?;
        insert_history(
            conn,
            &MovementHistoryEntry::for_change(
                item.id,
                MovementAction::Move,
                &change,
                now,
                Some(note.to_string()),
            ),
        )
    }

    fn list_clothing(&self, keep: impl Fn(&ClothingProfile) -> bool) -> Result<Vec<ClothingItem>> {
        let conn = self.lock()?;
        let items = query_items(
            &conn,
            &format!("WHERE i.item_type = ?1 ORDER BY i.name {}", BY_NAME),
            [ItemType::Clothing.as_str()],
        )?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(profile) = fetch_profile(&conn, item.id)? {
                if keep(&profile) {
                    out.push(ClothingItem::new(item, profile));
                }
            }
        }
        Ok(out)
    }
}

impl InventoryStore for SqliteInventoryStore {
    // ==================== Locations ====================

    fn create_location(&self, new: NewLocation) -> Result<LocationView> {
        let name = validate_name(&new.name)?;
        let description = validate_description(new.description.as_deref())?;
        if new.kind.is_system_managed() {
            return Err(StowageError::validation(format!(
                "{} locations are managed by the wardrobe and cannot be created directly",
                new.kind
            )));
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let parent_kind = match new.parent_id {
            Some(parent_id) => Some(
                fetch_location(&tx, parent_id)?
                    .ok_or_else(|| {
                        StowageError::validation(format!(
                            "Parent location does not exist: {}",
                            parent_id
                        ))
                    })?
                    .location
                    .kind,
            ),
            None => None,
        };
        if let Some(reason) = rules::nesting_violation(parent_kind, new.kind) {
            debug!(kind = %new.kind, ?parent_kind, "rejected location nesting");
            return Err(StowageError::validation(reason));
        }

        let now = now();
        let location = Location {
            id: LocationId::new(),
            name,
            description,
            kind: new.kind,
            parent_id: new.parent_id,
            aliases: normalize_aliases(&new.aliases),
            qr_code_id: self.unique_qr_code(&tx, &self.inventory.location_qr_prefix)?,
            created_at: now,
            updated_at: now,
        };
        insert_location(&tx, &location)?;
        tx.commit()?;

        info!(id = %location.id, name = %location.name, kind = %location.kind, "created location");
        require_location(&conn, location.id)
    }

    fn get_location(&self, id: LocationId) -> Result<LocationView> {
        let conn = self.lock()?;
        require_location(&conn, id)
    }

    fn location_detail(&self, id: LocationId) -> Result<LocationDetail> {
        let conn = self.lock()?;
        let view = require_location(&conn, id)?;
        let path = load_forest(&conn)?.path(id);
        let children = query_locations(
            &conn,
            &format!("WHERE l.parent_id = ?1 ORDER BY l.name {}", BY_NAME),
            [id.to_string()],
        )?;
        Ok(LocationDetail {
            view,
            path,
            children,
        })
    }

    fn update_location(&self, id: LocationId, update: LocationUpdate) -> Result<LocationView> {
        let conn = self.lock()?;
        let mut location = require_location(&conn, id)?.location;

        if let Some(name) = &update.name {
            location.name = validate_name(name)?;
        }
        if update.description.is_some() {
            location.description = validate_description(update.description.as_deref())?;
        }
        location.updated_at = now();

        conn.execute(
            "UPDATE locations SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                location.name,
                location.description,
                millis(location.updated_at),
                id.to_string(),
            ],
        )?;
        debug!(%id, "updated location");
        require_location(&conn, id)
    }

    fn delete_location(&self, id: LocationId) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let view = require_location(&tx, id)?;

        if view.item_count > 0 {
            warn!(%id, items = view.item_count, "refused to delete location holding items");
            return Err(StowageError::conflict(format!(
                "Location '{}' still holds {} item(s); move them first",
                view.location.name, view.item_count
            )));
        }
        if view.children_count > 0 {
            warn!(%id, children = view.children_count, "refused to delete location with children");
            return Err(StowageError::conflict(format!(
                "Location '{}' still contains {} location(s); delete them first",
                view.location.name, view.children_count
            )));
        }
        let homed: i64 = tx.query_row(
            "SELECT COUNT(*) FROM items WHERE permanent_location_id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if homed > 0 {
            warn!(%id, homed, "refused to delete a permanent home");
            return Err(StowageError::conflict(format!(
                "Location '{}' is the permanent home of {} item(s); return or re-home them first",
                view.location.name, homed
            )));
        }

        tx.execute("DELETE FROM locations WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;
        info!(%id, name = %view.location.name, "deleted location");
        Ok(())
    }

    fn list_roots(&self) -> Result<Vec<LocationView>> {
        let conn = self.lock()?;
        query_locations(
            &conn,
            &format!("WHERE l.parent_id IS NULL ORDER BY l.name {}", BY_NAME),
            params![],
        )
    }

    fn list_locations(&self) -> Result<Vec<LocationView>> {
        let conn = self.lock()?;
        query_locations(&conn, &format!("ORDER BY l.name {}", BY_NAME), params![])
    }

    fn location_tree(&self) -> Result<Vec<LocationNode>> {
        let conn = self.lock()?;
        Ok(load_forest(&conn)?.roots())
    }

    fn location_subtree(&self, id: LocationId) -> Result<LocationNode> {
        let conn = self.lock()?;
        load_forest(&conn)?
            .subtree(id)
            .ok_or_else(|| StowageError::not_found(Entity::Location, id))
    }

    fn location_path(&self, id: LocationId) -> Result<Vec<PathSegment>> {
        let conn = self.lock()?;
        let forest = load_forest(&conn)?;
        if forest.get(id).is_none() {
            return Err(StowageError::not_found(Entity::Location, id));
        }
        Ok(forest.path(id))
    }

    fn add_location_alias(&self, id: LocationId, alias: &str) -> Result<LocationView> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(StowageError::validation("Alias must not be empty"));
        }
        let conn = self.lock()?;
        require_location(&conn, id)?;
        let added = conn.execute(
            "INSERT OR IGNORE INTO location_aliases (location_id, alias) VALUES (?1, ?2)",
            params![id.to_string(), alias],
        )?;
        if added > 0 {
            touch_location(&conn, id)?;
        }
        require_location(&conn, id)
    }

    fn remove_location_alias(&self, id: LocationId, alias: &str) -> Result<LocationView> {
        let conn = self.lock()?;
        require_location(&conn, id)?;
        let removed = conn.execute(
            "DELETE FROM location_aliases WHERE location_id = ?1 AND alias = ?2",
            params![id.to_string(), alias.trim()],
        )?;
        if removed > 0 {
            touch_location(&conn, id)?;
        }
        require_location(&conn, id)
    }

    fn laundry_basket(&self, kind: LocationKind) -> Result<LocationView> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let basket = self.ensure_basket(&tx, kind)?;
        tx.commit()?;
        Ok(basket)
    }

    // ==================== Items ====================

    fn create_item(&self, new: NewItem) -> Result<Item> {
        let draft = new.validate()?;
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let item = self.insert_new_item(&tx, draft, ItemType::Generic)?;
        tx.commit()?;

        info!(
            id = %item.id,
            name = %item.name,
            location = %item.current_location_id,
            "created item"
        );
        require_item(&conn, item.id)
    }

    fn get_item(&self, id: ItemId) -> Result<Item> {
        let conn = self.lock()?;
        require_item(&conn, id)
    }

    fn get_item_with_path(&self, id: ItemId) -> Result<ItemWithPath> {
        let conn = self.lock()?;
        let item = require_item(&conn, id)?;
        let location_path = load_forest(&conn)?.path(item.current_location_id);
        Ok(ItemWithPath {
            item,
            location_path,
        })
    }

    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        if let Some(location_id) = filter.location_id {
            clauses.push("i.current_location_id = ?1");
            args.push(location_id.to_string());
        }
        if filter.temporary_only {
            clauses.push("i.is_temporary_placement = 1");
        }
        if filter.lent_only {
            clauses.push("i.is_lent = 1");
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.lock()?;
        query_items(
            &conn,
            &format!("{} ORDER BY i.name {}", where_sql, BY_NAME),
            params_from_iter(args.iter()),
        )
    }

    fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Item> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let mut item = require_item(&tx, id)?;

        if let Some(name) = &update.name {
            item.name = validate_name(name)?;
        }
        if update.description.is_some() {
            item.description = validate_description(update.description.as_deref())?;
        }
        if let Some(quantity) = update.quantity {
            item.quantity = validate_quantity(quantity)?;
        }
        if let Some(aliases) = &update.aliases {
            item.aliases = normalize_aliases(aliases);
        }
        item.updated_at = now();

        write_item(&tx, &item)?;
        tx.commit()?;
        debug!(%id, "updated item");
        require_item(&conn, id)
    }

    fn move_item(&self, id: ItemId, request: MoveRequest) -> Result<Item> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let mut item = require_item(&tx, id)?;
        if !location_exists(&tx, request.to_location_id)? {
            return Err(StowageError::not_found(
                Entity::Location,
                request.to_location_id,
            ));
        }

        let change = item.plan_move(request.to_location_id, request.is_temporary)?;
        let now = now();
        item.apply(&change, now);
        write_item(&tx, &item)?;
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        insert_history(
            &tx,
            &MovementHistoryEntry::for_change(id, MovementAction::Move, &change, now, notes),
        )?;
        tx.commit()?;

        info!(
            %id,
            from = %change.from,
            to = %change.to,
            temporary = change.is_temporary_placement,
            "moved item"
        );
        require_item(&conn, id)
    }

    fn return_item(&self, id: ItemId) -> Result<Item> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let mut item = require_item(&tx, id)?;

        let change = item.plan_return()?;
        let now = now();
        item.apply(&change, now);
        write_item(&tx, &item)?;
        insert_history(
            &tx,
            &MovementHistoryEntry::for_change(
                id,
                MovementAction::Return,
                &change,
                now,
                Some("Returned to permanent location".to_string()),
            ),
        )?;
        tx.commit()?;

        info!(%id, from = %change.from, to = %change.to, "returned item");
        require_item(&conn, id)
    }

    fn lend_item(&self, id: ItemId, request: LoanRequest) -> Result<Item> {
        let borrower = request.borrower.trim();
        if borrower.is_empty() {
            return Err(StowageError::validation("Borrower must not be empty"));
        }

        let conn = self.lock()?;
        let mut item = require_item(&conn, id)?;
        if item.is_lent {
            return Err(StowageError::conflict(format!(
                "Item is already lent to {}",
                item.lent_to.as_deref().unwrap_or("someone")
            )));
        }

        let now = now();
        item.is_lent = true;
        item.lent_to = Some(borrower.to_string());
        item.lent_at = Some(now);
        item.due_date = request.due_date;
        item.lent_notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        item.updated_at = now;
        write_item(&conn, &item)?;

        info!(%id, borrower, "lent item");
        require_item(&conn, id)
    }

    fn return_loan(&self, id: ItemId) -> Result<Item> {
        let conn = self.lock()?;
        let mut item = require_item(&conn, id)?;
        if !item.is_lent {
            return Err(StowageError::conflict("Item is not currently lent"));
        }

        item.is_lent = false;
        item.lent_to = None;
        item.lent_at = None;
        item.due_date = None;
        item.lent_notes = None;
        item.updated_at = now();
        write_item(&conn, &item)?;

        info!(%id, "loan returned");
        require_item(&conn, id)
    }

    fn list_lent_items(&self) -> Result<Vec<Item>> {
        self.list_items(&ItemFilter {
            lent_only: true,
            ..Default::default()
        })
    }

    fn delete_item(&self, id: ItemId) -> Result<()> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM items WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(StowageError::not_found(Entity::Item, id));
        }
        info!(%id, "deleted item");
        Ok(())
    }

    // ==================== History ====================

    fn list_history(
        &self,
        item_id: ItemId,
        limit: Option<usize>,
    ) -> Result<Vec<MovementHistoryEntry>> {
        let limit = limit.unwrap_or(self.inventory.history_limit as usize);
        let conn = self.lock()?;
        let entries = query_rows(
            &conn,
            "SELECT id, item_id, action, from_location_id, to_location_id, moved_at, notes \
             FROM movement_history WHERE item_id = ?1 ORDER BY seq DESC LIMIT ?2",
            params![item_id.to_string(), i64::try_from(limit).unwrap_or(i64::MAX)],
            history_from_row,
        )?;
        if entries.is_empty() && fetch_item(&conn, item_id)?.is_none() {
            return Err(StowageError::not_found(Entity::Item, item_id));
        }
        Ok(entries)
    }

    // ==================== Wardrobe ====================

    fn create_clothing_item(&self, new: NewClothingItem) -> Result<ClothingItem> {
        let draft = new.item.validate()?;
        let profile = new.profile()?;

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let item = self.insert_new_item(&tx, draft, ItemType::Clothing)?;
        save_profile(&tx, item.id, &profile)?;
        tx.commit()?;

        info!(id = %item.id, category = profile.category.as_str(), "created clothing item");
        require_clothing(&conn, item.id)
    }

    fn get_clothing_item(&self, id: ItemId) -> Result<ClothingItem> {
        let conn = self.lock()?;
        require_clothing(&conn, id)
    }

    fn list_clothing_items(&self, filter: &ClothingFilter) -> Result<Vec<ClothingItem>> {
        self.list_clothing(|profile| filter.matches(profile))
    }

    fn update_clothing_item(&self, id: ItemId, update: ClothingUpdate) -> Result<ClothingItem> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let ClothingItem {
            mut item,
            mut profile,
            ..
        } = require_clothing(&tx, id)?;

        if let Some(name) = &update.name {
            item.name = validate_name(name)?;
        }
        if update.description.is_some() {
            item.description = validate_description(update.description.as_deref())?;
        }
        profile.apply_update(&update)?;
        item.updated_at = now();

        write_item(&tx, &item)?;
        save_profile(&tx, id, &profile)?;
        tx.commit()?;
        debug!(%id, "updated clothing item");
        require_clothing(&conn, id)
    }

    fn wear_item(&self, id: ItemId) -> Result<ClothingItem> {
        let conn = self.lock()?;
        let ClothingItem {
            mut item,
            mut profile,
            ..
        } = require_clothing(&conn, id)?;

        let now = now();
        profile.wear(now)?;
        item.updated_at = now;

        let tx = conn.unchecked_transaction()?;
        write_item(&tx, &item)?;
        save_profile(&tx, id, &profile)?;
        tx.commit()?;

        debug!(
            %id,
            wears = profile.wear_count_since_wash,
            cleanliness = profile.cleanliness.as_str(),
            "logged wear"
        );
        Ok(ClothingItem::new(item, profile))
    }

    fn wash_item(&self, id: ItemId) -> Result<ClothingItem> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let ClothingItem {
            mut item,
            mut profile,
            ..
        } = require_clothing(&tx, id)?;

        profile.wash();
        let now = now();
        if !item.is_lent && item.permanent_location_id.is_some() && !item.is_at_home() {
            let change = item.plan_return()?;
            item.apply(&change, now);
            insert_history(
                &tx,
                &MovementHistoryEntry::for_change(
                    id,
                    MovementAction::Return,
                    &change,
                    now,
                    Some("Returned home after washing".to_string()),
                ),
            )?;
        }
        item.updated_at = now;
        write_item(&tx, &item)?;
        save_profile(&tx, id, &profile)?;
        tx.commit()?;

        info!(%id, location = %item.current_location_id, "washed clothing item");
        require_clothing(&conn, id)
    }

    fn move_to_laundry(&self, id: ItemId) -> Result<ClothingItem> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let ClothingItem {
            mut item,
            mut profile,
            ..
        } = require_clothing(&tx, id)?;

        self.move_to_basket(&tx, &mut item, LocationKind::LaundryDirty, "Sent to laundry")?;
        profile.send_to_laundry();
        save_profile(&tx, id, &profile)?;
        tx.commit()?;

        info!(%id, "moved clothing item to laundry");
        require_clothing(&conn, id)
    }

    fn move_to_worn_basket(&self, id: ItemId) -> Result<ClothingItem> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let ClothingItem { mut item, profile, .. } = require_clothing(&tx, id)?;

        profile.ensure_rewearable_basket()?;
        self.move_to_basket(
            &tx,
            &mut item,
            LocationKind::LaundryWorn,
            "Put in worn clothes basket",
        )?;
        tx.commit()?;

        info!(%id, "moved clothing item to worn basket");
        require_clothing(&conn, id)
    }

    fn laundry_items(&self) -> Result<Vec<ClothingItem>> {
        self.list_clothing(ClothingProfile::needs_washing)
    }

    fn rewear_safe_items(&self) -> Result<Vec<ClothingItem>> {
        self.list_clothing(ClothingProfile::can_rewear)
    }

    // ==================== Search ====================

    fn search(&self, query: &str) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StowageError::validation("Search query must not be empty"));
        }
        let pattern = like_pattern(query);
        let limit = i64::from(self.inventory.search_limit);

        let conn = self.lock()?;
        let forest = load_forest(&conn)?;

        let items = query_items(
            &conn,
            &format!(
                r"WHERE fold_case(i.name) LIKE ?1 ESCAPE '\'
                   OR fold_case(coalesce(i.description, '')) LIKE ?1 ESCAPE '\'
                   OR EXISTS (SELECT 1 FROM item_aliases a
                              WHERE a.item_id = i.id AND fold_case(a.alias) LIKE ?1 ESCAPE '\')
                 ORDER BY i.name {} LIMIT ?2",
                BY_NAME
            ),
            params![pattern, limit],
        )?
        .into_iter()
        .map(|item| SearchResult {
            id: item.id.0,
            location_path: Some(format_path(&forest.path(item.current_location_id))),
            name: item.name,
            kind: SearchHitKind::Item,
            description: item.description,
        })
        .collect::<Vec<_>>();

        let locations = query_locations(
            &conn,
            &format!(
                r"WHERE fold_case(l.name) LIKE ?1 ESCAPE '\'
                   OR fold_case(coalesce(l.description, '')) LIKE ?1 ESCAPE '\'
                   OR EXISTS (SELECT 1 FROM location_aliases a
                              WHERE a.location_id = l.id AND fold_case(a.alias) LIKE ?1 ESCAPE '\')
                 ORDER BY l.name {} LIMIT ?2",
                BY_NAME
            ),
            params![pattern, limit],
        )?
        .into_iter()
        .map(|view| location_hit(&forest, view))
        .collect::<Vec<_>>();

        debug!(query, items = items.len(), locations = locations.len(), "search");
        Ok(SearchResults {
            query: query.to_string(),
            total_count: items.len() + locations.len(),
            items,
            locations,
        })
    }

    fn search_by_alias(&self, alias: &str) -> Result<Vec<SearchResult>> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(StowageError::validation("Alias must not be empty"));
        }
        let conn = self.lock()?;
        let forest = load_forest(&conn)?;
        let locations = query_locations(
            &conn,
            &format!(
                "WHERE EXISTS (SELECT 1 FROM location_aliases a \
                 WHERE a.location_id = l.id AND fold_case(a.alias) = fold_case(?1)) \
                 ORDER BY l.name {}",
                BY_NAME
            ),
            [alias],
        )?;
        Ok(locations
            .into_iter()
            .map(|view| location_hit(&forest, view))
            .collect())
    }

    fn resolve_qr(&self, code: &str) -> Result<QrTarget> {
        let code = code.trim();
        let conn = self.lock()?;
        if let Some(view) = query_locations(&conn, "WHERE l.qr_code_id = ?1", [code])?
            .into_iter()
            .next()
        {
            return Ok(QrTarget::Location(Box::new(view)));
        }
        if let Some(item) = query_items(&conn, "WHERE i.qr_code_id = ?1", [code])?
            .into_iter()
            .next()
        {
            return Ok(QrTarget::Item(Box::new(item)));
        }
        Err(StowageError::not_found(Entity::QrCode, code))
    }
}

// ==================== Row mapping ====================

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// `fold_case(text)`: Unicode lowercase, matching how search terms are folded.
/// SQLite's built-in `lower()` only folds ASCII.
fn register_fold_case(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )?;
    Ok(())
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StowageError::Storage(format!("bad timestamp {}", ms)))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StowageError::Storage(format!("bad id '{}': {}", s, e)))
}

fn parse_column<T: FromStr<Err = String>>(s: &str) -> Result<T> {
    s.parse().map_err(StowageError::Storage)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    s.parse()
        .map_err(|e| StowageError::Storage(format!("bad date '{}': {}", s, e)))
}

fn query_rows<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: impl Fn(&Row<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map(row)?);
    }
    Ok(out)
}

fn location_from_row(row: &Row<'_>) -> Result<LocationView> {
    let id: String = row.get(0)?;
    let kind: String = row.get(3)?;
    let parent_id: Option<String> = row.get(4)?;
    let item_count: i64 = row.get(8)?;
    let children_count: i64 = row.get(9)?;

    Ok(LocationView {
        location: Location {
            id: LocationId(parse_uuid(&id)?),
            name: row.get(1)?,
            description: row.get(2)?,
            kind: parse_column(&kind)?,
            parent_id: parent_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?
                .map(LocationId),
            aliases: Vec::new(),
            qr_code_id: row.get(5)?,
            created_at: from_millis(row.get(6)?)?,
            updated_at: from_millis(row.get(7)?)?,
        },
        item_count: item_count.max(0) as u64,
        children_count: children_count.max(0) as u64,
    })
}

fn item_from_row(row: &Row<'_>) -> Result<Item> {
    let id: String = row.get(0)?;
    let quantity: i64 = row.get(3)?;
    let item_type: String = row.get(4)?;
    let current: String = row.get(5)?;
    let permanent: Option<String> = row.get(6)?;
    let lent_at: Option<i64> = row.get(10)?;
    let due_date: Option<String> = row.get(11)?;
    let last_moved_at: Option<i64> = row.get(14)?;

    Ok(Item {
        id: ItemId(parse_uuid(&id)?),
        name: row.get(1)?,
        description: row.get(2)?,
        quantity: u32::try_from(quantity)
            .map_err(|_| StowageError::Storage(format!("bad quantity {}", quantity)))?,
        item_type: parse_column(&item_type)?,
        current_location_id: LocationId(parse_uuid(&current)?),
        permanent_location_id: permanent
            .as_deref()
            .map(parse_uuid)
            .transpose()?
            .map(LocationId),
        is_temporary_placement: row.get(7)?,
        is_lent: row.get(8)?,
        lent_to: row.get(9)?,
        lent_at: lent_at.map(from_millis).transpose()?,
        due_date: due_date.as_deref().map(parse_date).transpose()?,
        lent_notes: row.get(12)?,
        aliases: Vec::new(),
        qr_code_id: row.get(13)?,
        last_moved_at: last_moved_at.map(from_millis).transpose()?,
        created_at: from_millis(row.get(15)?)?,
        updated_at: from_millis(row.get(16)?)?,
    })
}

fn history_from_row(row: &Row<'_>) -> Result<MovementHistoryEntry> {
    let id: String = row.get(0)?;
    let item_id: String = row.get(1)?;
    let action: String = row.get(2)?;
    let from: Option<String> = row.get(3)?;
    let to: String = row.get(4)?;

    Ok(MovementHistoryEntry {
        id: parse_uuid(&id)?,
        item_id: ItemId(parse_uuid(&item_id)?),
        action: parse_column::<MovementAction>(&action)?,
        from_location_id: from.as_deref().map(parse_uuid).transpose()?.map(LocationId),
        to_location_id: LocationId(parse_uuid(&to)?),
        moved_at: from_millis(row.get(5)?)?,
        notes: row.get(6)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> Result<ClothingProfile> {
    let category: String = row.get(0)?;
    let cleanliness: String = row.get(3)?;
    let last_worn_at: Option<i64> = row.get(6)?;

    Ok(ClothingProfile {
        category: parse_column(&category)?,
        style: row.get(1)?,
        color: row.get(2)?,
        cleanliness: parse_column(&cleanliness)?,
        wear_count_since_wash: row.get(4)?,
        max_wears_before_wash: row.get(5)?,
        last_worn_at: last_worn_at.map(from_millis).transpose()?,
    })
}

fn location_hit(forest: &LocationForest, view: LocationView) -> SearchResult {
    SearchResult {
        id: view.location.id.0,
        location_path: Some(format_path(&forest.path(view.location.id))),
        name: view.location.name,
        kind: SearchHitKind::Location,
        description: view.location.description,
    }
}

// ==================== Locations ====================

fn query_locations<P: Params>(
    conn: &Connection,
    tail: &str,
    params: P,
) -> Result<Vec<LocationView>> {
    let mut views = query_rows(
        conn,
        &format!("{} {}", LOCATION_SELECT, tail),
        params,
        location_from_row,
    )?;
    for view in &mut views {
        view.location.aliases = query_rows(
            conn,
            "SELECT alias FROM location_aliases WHERE location_id = ?1 ORDER BY rowid",
            [view.location.id.to_string()],
            |row| Ok(row.get(0)?),
        )?;
    }
    Ok(views)
}

fn fetch_location(conn: &Connection, id: LocationId) -> Result<Option<LocationView>> {
    Ok(query_locations(conn, "WHERE l.id = ?1", [id.to_string()])?
        .into_iter()
        .next())
}

fn require_location(conn: &Connection, id: LocationId) -> Result<LocationView> {
    fetch_location(conn, id)?.ok_or_else(|| StowageError::not_found(Entity::Location, id))
}

fn location_exists(conn: &Connection, id: LocationId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM locations WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )?)
}

fn load_forest(conn: &Connection) -> Result<LocationForest> {
    Ok(LocationForest::new(query_locations(conn, "", params![])?))
}

fn insert_location(conn: &Connection, location: &Location) -> Result<()> {
    conn.execute(
        "INSERT INTO locations
             (id, name, description, kind, parent_id, qr_code_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            location.id.to_string(),
            location.name,
            location.description,
            location.kind.as_str(),
            location.parent_id.map(|p| p.to_string()),
            location.qr_code_id,
            millis(location.created_at),
            millis(location.updated_at),
        ],
    )?;
    for alias in &location.aliases {
        conn.execute(
            "INSERT OR IGNORE INTO location_aliases (location_id, alias) VALUES (?1, ?2)",
            params![location.id.to_string(), alias],
        )?;
    }
    Ok(())
}

fn touch_location(conn: &Connection, id: LocationId) -> Result<()> {
    conn.execute(
        "UPDATE locations SET updated_at = ?1 WHERE id = ?2",
        params![millis(now()), id.to_string()],
    )?;
    Ok(())
}

// ==================== Items ====================

fn query_items<P: Params>(conn: &Connection, tail: &str, params: P) -> Result<Vec<Item>> {
    let mut items = query_rows(
        conn,
        &format!("{} {}", ITEM_SELECT, tail),
        params,
        item_from_row,
    )?;
    for item in &mut items {
        item.aliases = query_rows(
            conn,
            "SELECT alias FROM item_aliases WHERE item_id = ?1 ORDER BY rowid",
            [item.id.to_string()],
            |row| Ok(row.get(0)?),
        )?;
    }
    Ok(items)
}

fn fetch_item(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
    Ok(query_items(conn, "WHERE i.id = ?1", [id.to_string()])?
        .into_iter()
        .next())
}

fn require_item(conn: &Connection, id: ItemId) -> Result<Item> {
    fetch_item(conn, id)?.ok_or_else(|| StowageError::not_found(Entity::Item, id))
}

fn insert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT INTO items (id, name, description, quantity, item_type, current_location_id,
             permanent_location_id, is_temporary_placement, is_lent, lent_to, lent_at, due_date,
             lent_notes, qr_code_id, last_moved_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            item.id.to_string(),
            item.name,
            item.description,
            item.quantity,
            item.item_type.as_str(),
            item.current_location_id.to_string(),
            item.permanent_location_id.map(|p| p.to_string()),
            item.is_temporary_placement,
            item.is_lent,
            item.lent_to,
            item.lent_at.map(millis),
            item.due_date.map(|d| d.to_string()),
            item.lent_notes,
            item.qr_code_id,
            item.last_moved_at.map(millis),
            millis(item.created_at),
            millis(item.updated_at),
        ],
    )?;
    replace_item_aliases(conn, item.id, &item.aliases)
}

/// Persist every mutable column of an item, plus its aliases.
fn write_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "UPDATE items SET name = ?1, description = ?2, quantity = ?3, current_location_id = ?4,
             permanent_location_id = ?5, is_temporary_placement = ?6, is_lent = ?7, lent_to = ?8,
             lent_at = ?9, due_date = ?10, lent_notes = ?11, last_moved_at = ?12, updated_at = ?13
         WHERE id = ?14",
        params![
            item.name,
            item.description,
            item.quantity,
            item.current_location_id.to_string(),
            item.permanent_location_id.map(|p| p.to_string()),
            item.is_temporary_placement,
            item.is_lent,
            item.lent_to,
            item.lent_at.map(millis),
            item.due_date.map(|d| d.to_string()),
            item.lent_notes,
            item.last_moved_at.map(millis),
            millis(item.updated_at),
            item.id.to_string(),
        ],
    )?;
    replace_item_aliases(conn, item.id, &item.aliases)
}

fn replace_item_aliases(conn: &Connection, id: ItemId, aliases: &[String]) -> Result<()> {
    conn.execute("DELETE FROM item_aliases WHERE item_id = ?1", [id.to_string()])?;
    for alias in aliases {
        conn.execute(
            "INSERT OR IGNORE INTO item_aliases (item_id, alias) VALUES (?1, ?2)",
            params![id.to_string(), alias],
        )?;
    }
    Ok(())
}

fn insert_history(conn: &Connection, entry: &MovementHistoryEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO movement_history
             (id, item_id, action, from_location_id, to_location_id, moved_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id.to_string(),
            entry.item_id.to_string(),
            entry.action.as_str(),
            entry.from_location_id.map(|l| l.to_string()),
            entry.to_location_id.to_string(),
            millis(entry.moved_at),
            entry.notes,
        ],
    )?;
    Ok(())
}

// ==================== Wardrobe ====================

fn fetch_profile(conn: &Connection, id: ItemId) -> Result<Option<ClothingProfile>> {
    Ok(query_rows(
        conn,
        "SELECT category, style, color, cleanliness, wear_count_since_wash,
                max_wears_before_wash, last_worn_at
         FROM clothing_profiles WHERE item_id = ?1",
        [id.to_string()],
        profile_from_row,
    )?
    .into_iter()
    .next())
}

fn require_clothing(conn: &Connection, id: ItemId) -> Result<ClothingItem> {
    let item = fetch_item(conn, id)?
        .filter(|item| item.item_type == ItemType::Clothing)
        .ok_or_else(|| StowageError::not_found(Entity::ClothingItem, id))?;
    let profile =
        fetch_profile(conn, id)?.ok_or_else(|| StowageError::not_found(Entity::ClothingItem, id))?;
    Ok(ClothingItem::new(item, profile))
}

fn save_profile(conn: &Connection, id: ItemId, profile: &ClothingProfile) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO clothing_profiles (item_id, category, style, color, cleanliness,
             wear_count_since_wash, max_wears_before_wash, last_worn_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id.to_string(),
            profile.category.as_str(),
            profile.style,
            profile.color,
            profile.cleanliness.as_str(),
            profile.wear_count_since_wash,
            profile.max_wears_before_wash,
            profile.last_worn_at.map(millis),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wardrobe::{ClothingCategory, Cleanliness};

    fn store() -> SqliteInventoryStore {
        SqliteInventoryStore::open_in_memory().unwrap()
    }

    fn location(
        store: &SqliteInventoryStore,
        name: &str,
        kind: LocationKind,
        parent: Option<LocationId>,
    ) -> LocationId {
        let mut new = NewLocation::new(name, kind);
        new.parent_id = parent;
        store.create_location(new).unwrap().location.id
    }

    /// Bedroom(room) → Dresser(furniture)
    fn bedroom_and_dresser(store: &SqliteInventoryStore) -> (LocationId, LocationId) {
        let bedroom = location(store, "Bedroom", LocationKind::Room, None);
        let dresser = location(store, "Dresser", LocationKind::Furniture, Some(bedroom));
        (bedroom, dresser)
    }

    #[test]
    fn portable_cannot_be_created_at_root() {
        let store = store();
        let err = store
            .create_location(NewLocation::new("Backpack", LocationKind::Portable))
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));
        assert!(store.list_locations().unwrap().is_empty());
    }

    #[test]
    fn nesting_rules_are_enforced() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);

        let err = store
            .create_location(NewLocation::new("Guest Room", LocationKind::Room).under(bedroom))
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));

        let drawer = location(&store, "Top Drawer", LocationKind::Container, Some(dresser));
        location(&store, "Sock Box", LocationKind::Container, Some(drawer));

        let err = store
            .create_location(
                NewLocation::new("Orphan", LocationKind::Container).under(LocationId::new()),
            )
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));
    }

    #[test]
    fn laundry_kinds_cannot_be_created_directly() {
        let store = store();
        let err = store
            .create_location(NewLocation::new("Hamper", LocationKind::LaundryDirty))
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));

        let basket = store.laundry_basket(LocationKind::LaundryDirty).unwrap();
        assert_eq!(basket.location.name, "Dirty Laundry");
        assert!(basket.location.parent_id.is_none());
        let again = store.laundry_basket(LocationKind::LaundryDirty).unwrap();
        assert_eq!(again.location.id, basket.location.id);
        assert!(store.laundry_basket(LocationKind::Room).is_err());
    }

    #[test]
    fn counts_are_derived_on_read() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);
        store.create_item(NewItem::new("Sweater", dresser)).unwrap();
        store.create_item(NewItem::new("Scarf", dresser)).unwrap();

        let view = store.get_location(dresser).unwrap();
        assert_eq!(view.item_count, 2);
        assert_eq!(view.children_count, 0);

        let view = store.get_location(bedroom).unwrap();
        assert_eq!(view.item_count, 0);
        assert_eq!(view.children_count, 1);
    }

    #[test]
    fn bedroom_dresser_sweater_scenario() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);

        let sweater = store.create_item(NewItem::new("Sweater", dresser)).unwrap();
        assert_eq!(sweater.permanent_location_id, Some(dresser));
        assert!(!sweater.is_temporary_placement);

        let same = store
            .move_item(
                sweater.id,
                MoveRequest {
                    to_location_id: dresser,
                    is_temporary: true,
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(same.current_location_id, dresser);
        assert!(!same.is_temporary_placement);

        let away = store
            .move_item(
                sweater.id,
                MoveRequest {
                    to_location_id: bedroom,
                    is_temporary: true,
                    notes: Some("airing out".into()),
                },
            )
            .unwrap();
        assert_eq!(away.current_location_id, bedroom);
        assert_eq!(away.permanent_location_id, Some(dresser));
        assert!(away.is_temporary_placement);
        assert!(away.last_moved_at.is_some());

        let back = store.return_item(sweater.id).unwrap();
        assert_eq!(back.current_location_id, dresser);
        assert!(!back.is_temporary_placement);

        let err = store.return_item(sweater.id).unwrap_err();
        assert!(matches!(err, StowageError::Conflict(_)));

        let history = store.list_history(sweater.id, None).unwrap();
        let actions: Vec<_> = history.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            [
                MovementAction::Return,
                MovementAction::Move,
                MovementAction::Move,
                MovementAction::Create
            ]
        );
        assert_eq!(history[0].from_location_id, Some(bedroom));
        assert_eq!(history[0].to_location_id, dresser);
        assert_eq!(history[1].notes.as_deref(), Some("airing out"));
        assert!(history[3].from_location_id.is_none());

        let limited = store.list_history(sweater.id, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].action, MovementAction::Return);
    }

    #[test]
    fn create_item_requires_existing_location() {
        let store = store();
        let err = store
            .create_item(NewItem::new("Ghost", LocationId::new()))
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));
    }

    #[test]
    fn move_to_missing_destination_is_not_found() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Lamp", dresser)).unwrap();
        let err = store
            .move_item(
                item.id,
                MoveRequest {
                    to_location_id: LocationId::new(),
                    is_temporary: false,
                    notes: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StowageError::NotFound(Entity::Location, _)));
        assert_eq!(store.list_history(item.id, None).unwrap().len(), 1);
    }

    #[test]
    fn permanent_move_rehomes_item() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Lamp", dresser)).unwrap();
        let moved = store
            .move_item(
                item.id,
                MoveRequest {
                    to_location_id: bedroom,
                    is_temporary: false,
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(moved.permanent_location_id, Some(bedroom));
        assert!(matches!(
            store.return_item(item.id).unwrap_err(),
            StowageError::Conflict(_)
        ));
    }

    #[test]
    fn delete_location_policies() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);

        assert!(matches!(
            store.delete_location(bedroom).unwrap_err(),
            StowageError::Conflict(_)
        ));

        let item = store.create_item(NewItem::new("Sweater", dresser)).unwrap();
        assert!(matches!(
            store.delete_location(dresser).unwrap_err(),
            StowageError::Conflict(_)
        ));

        // away from home, the dresser is still its permanent location
        store
            .move_item(
                item.id,
                MoveRequest {
                    to_location_id: bedroom,
                    is_temporary: true,
                    notes: None,
                },
            )
            .unwrap();
        assert!(matches!(
            store.delete_location(dresser).unwrap_err(),
            StowageError::Conflict(_)
        ));

        store.delete_item(item.id).unwrap();
        store.delete_location(dresser).unwrap();
        store.delete_location(bedroom).unwrap();
        assert!(matches!(
            store.get_location(bedroom).unwrap_err(),
            StowageError::NotFound(Entity::Location, _)
        ));
    }

    #[test]
    fn history_survives_item_deletion() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Old Radio", dresser)).unwrap();
        store.delete_item(item.id).unwrap();

        assert!(store.get_item(item.id).is_err());
        let history = store.list_history(item.id, None).unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(
            store.list_history(ItemId::new(), None).unwrap_err(),
            StowageError::NotFound(Entity::Item, _)
        ));
    }

    #[test]
    fn lent_items_are_frozen() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Drill", dresser)).unwrap();

        let lent = store
            .lend_item(
                item.id,
                LoanRequest {
                    borrower: "Sam".into(),
                    due_date: NaiveDate::from_ymd_opt(2030, 1, 15),
                    notes: Some("for the shelves".into()),
                },
            )
            .unwrap();
        assert!(lent.is_lent);
        assert_eq!(lent.due_date, NaiveDate::from_ymd_opt(2030, 1, 15));
        assert_eq!(store.list_lent_items().unwrap().len(), 1);

        let err = store
            .move_item(
                item.id,
                MoveRequest {
                    to_location_id: bedroom,
                    is_temporary: true,
                    notes: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StowageError::Conflict(_)));
        assert!(store
            .lend_item(
                item.id,
                LoanRequest {
                    borrower: "Alex".into(),
                    due_date: None,
                    notes: None,
                },
            )
            .is_err());

        let back = store.return_loan(item.id).unwrap();
        assert!(!back.is_lent);
        assert!(back.lent_to.is_none());
        assert!(store.list_lent_items().unwrap().is_empty());
        assert!(matches!(
            store.return_loan(item.id).unwrap_err(),
            StowageError::Conflict(_)
        ));
    }

    #[test]
    fn update_item_edits_fields_not_placement() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Tape", dresser)).unwrap();

        let updated = store
            .update_item(
                item.id,
                ItemUpdate {
                    name: Some("Duct Tape".into()),
                    quantity: Some(3),
                    aliases: Some(vec!["gaffer".into()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Duct Tape");
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.aliases, ["gaffer"]);
        assert_eq!(updated.current_location_id, dresser);

        let err = store
            .update_item(
                item.id,
                ItemUpdate {
                    quantity: Some(0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));
    }

    #[test]
    fn tree_and_paths() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);
        let drawer = location(&store, "Top Drawer", LocationKind::Container, Some(dresser));
        location(&store, "Garage", LocationKind::Room, None);

        let tree = store.location_tree().unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Bedroom");
        assert_eq!(tree[0].children[0].children[0].id, drawer);

        let path = store.location_path(drawer).unwrap();
        assert_eq!(format_path(&path), "Bedroom → Dresser → Top Drawer");

        let detail = store.location_detail(bedroom).unwrap();
        assert_eq!(detail.path.len(), 1);
        assert_eq!(detail.children.len(), 1);
        assert_eq!(detail.children[0].children_count, 1);

        assert_eq!(store.list_roots().unwrap().len(), 2);
        assert_eq!(store.location_subtree(dresser).unwrap().children.len(), 1);
    }

    #[test]
    fn aliases_search_and_qr() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        store.add_location_alias(dresser, "almirah").unwrap();
        let view = store.add_location_alias(dresser, "almirah").unwrap();
        assert_eq!(view.location.aliases, ["almirah"]);

        let item = store
            .create_item(NewItem::new("Passport", dresser))
            .unwrap();

        let hits = store.search("pass").unwrap();
        assert_eq!(hits.items.len(), 1);
        assert_eq!(
            hits.items[0].location_path.as_deref(),
            Some("Bedroom → Dresser")
        );

        let hits = store.search("ALMIRAH").unwrap();
        assert_eq!(hits.locations.len(), 1);
        assert_eq!(hits.total_count, 1);
        assert_eq!(store.search_by_alias("Almirah").unwrap().len(), 1);
        assert!(store.search("100%").unwrap().items.is_empty());

        match store.resolve_qr(&view.location.qr_code_id).unwrap() {
            QrTarget::Location(found) => assert_eq!(found.location.id, dresser),
            other => panic!("unexpected target {:?}", other),
        }
        match store.resolve_qr(&item.qr_code_id).unwrap() {
            QrTarget::Item(found) => assert_eq!(found.id, item.id),
            other => panic!("unexpected target {:?}", other),
        }
        assert!(matches!(
            store.resolve_qr("psms-loc-nope").unwrap_err(),
            StowageError::NotFound(Entity::QrCode, _)
        ));

        let view = store.remove_location_alias(dresser, "almirah").unwrap();
        assert!(view.location.aliases.is_empty());
    }

    #[test]
    fn wash_at_limit_resets_and_returns_home() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let shirt = store
            .create_clothing_item(NewClothingItem::new(
                NewItem::new("Blue Shirt", dresser),
                ClothingCategory::Shirt,
            ))
            .unwrap();
        assert_eq!(shirt.profile.max_wears_before_wash, 2);

        store.wear_item(shirt.item.id).unwrap();
        let worn = store.wear_item(shirt.item.id).unwrap();
        assert_eq!(worn.profile.cleanliness, Cleanliness::Dirty);
        assert_eq!(worn.profile.wear_count_since_wash, 2);
        assert!(matches!(
            store.wear_item(shirt.item.id).unwrap_err(),
            StowageError::Conflict(_)
        ));

        let laundry = store.move_to_laundry(shirt.item.id).unwrap();
        assert_eq!(laundry.profile.cleanliness, Cleanliness::Washing);
        assert!(laundry.item.is_temporary_placement);
        assert_eq!(store.laundry_items().unwrap().len(), 1);

        let washed = store.wash_item(shirt.item.id).unwrap();
        assert_eq!(washed.profile.cleanliness, Cleanliness::Clean);
        assert_eq!(washed.profile.wear_count_since_wash, 0);
        assert_eq!(washed.item.current_location_id, dresser);
        assert!(washed.can_rewear);

        let history = store.list_history(shirt.item.id, None).unwrap();
        assert_eq!(history[0].action, MovementAction::Return);
        assert_eq!(history[1].action, MovementAction::Move);
    }

    #[test]
    fn worn_basket_only_takes_rewearable_clothes() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let socks = store
            .create_clothing_item(NewClothingItem::new(
                NewItem::new("Wool Socks", dresser),
                ClothingCategory::Socks,
            ))
            .unwrap();
        let jeans = store
            .create_clothing_item(NewClothingItem::new(
                NewItem::new("Jeans", dresser),
                ClothingCategory::Jeans,
            ))
            .unwrap();

        store.wear_item(socks.item.id).unwrap();
        assert!(store.move_to_worn_basket(socks.item.id).is_err());

        store.wear_item(jeans.item.id).unwrap();
        let basket = store.move_to_worn_basket(jeans.item.id).unwrap();
        let worn_basket = store.laundry_basket(LocationKind::LaundryWorn).unwrap();
        assert_eq!(basket.item.current_location_id, worn_basket.location.id);

        let safe = store.rewear_safe_items().unwrap();
        assert_eq!(safe.len(), 1);
        assert_eq!(safe[0].item.id, jeans.item.id);

        let dirty = store
            .list_clothing_items(&ClothingFilter {
                cleanliness: Some(Cleanliness::Dirty),
                category: None,
            })
            .unwrap();
        assert_eq!(dirty.len(), 1);
    }

    #[test]
    fn clothing_lookups_reject_generic_items() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let lamp = store.create_item(NewItem::new("Lamp", dresser)).unwrap();
        assert!(matches!(
            store.get_clothing_item(lamp.id).unwrap_err(),
            StowageError::NotFound(Entity::ClothingItem, _)
        ));
    }

    #[test]
    fn update_clothing_item_validates_limits() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let coat = store
            .create_clothing_item(NewClothingItem::new(
                NewItem::new("Coat", dresser),
                ClothingCategory::Coat,
            ))
            .unwrap();

        let updated = store
            .update_clothing_item(
                coat.item.id,
                ClothingUpdate {
                    color: Some("navy".into()),
                    max_wears_before_wash: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.profile.color.as_deref(), Some("navy"));
        assert_eq!(updated.profile.max_wears_before_wash, 4);

        assert!(store
            .update_clothing_item(
                coat.item.id,
                ClothingUpdate {
                    max_wears_before_wash: Some(0),
                    ..Default::default()
                },
            )
            .is_err());
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let store = store();
        let kitchen = location(&store, "Küche", LocationKind::Room, None);
        store.create_item(NewItem::new("Über Box", kitchen)).unwrap();
        store.add_location_alias(kitchen, "Ölkammer").unwrap();

        for query in ["Über", "über", "ÜBER BOX"] {
            let hits = store.search(query).unwrap();
            assert_eq!(hits.items.len(), 1, "query {:?}", query);
            assert_eq!(hits.items[0].name, "Über Box");
        }
        assert_eq!(store.search("KÜCHE").unwrap().locations.len(), 1);
        assert_eq!(store.search("ölk").unwrap().locations.len(), 1);
        assert_eq!(store.search_by_alias("ÖLKAMMER").unwrap().len(), 1);
    }

    fn fail_history_inserts(store: &SqliteInventoryStore) {
        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_history BEFORE INSERT ON movement_history \
                 BEGIN SELECT RAISE(ABORT, 'history unavailable'); END;",
            )
            .unwrap();
    }

    #[test]
    fn move_is_rolled_back_when_history_write_fails() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Lamp", dresser)).unwrap();
        fail_history_inserts(&store);

        for is_temporary in [true, false] {
            let err = store
                .move_item(
                    item.id,
                    MoveRequest {
                        to_location_id: bedroom,
                        is_temporary,
                        notes: None,
                    },
                )
                .unwrap_err();
            assert!(matches!(err, StowageError::Storage(_)));

            let unchanged = store.get_item(item.id).unwrap();
            assert_eq!(unchanged.current_location_id, dresser);
            assert_eq!(unchanged.permanent_location_id, Some(dresser));
            assert!(!unchanged.is_temporary_placement);
            assert_eq!(unchanged.last_moved_at, item.last_moved_at);
        }
        assert_eq!(store.list_history(item.id, None).unwrap().len(), 1);
    }

    #[test]
    fn return_is_rolled_back_when_history_write_fails() {
        let store = store();
        let (bedroom, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Lamp", dresser)).unwrap();
        store
            .move_item(
                item.id,
                MoveRequest {
                    to_location_id: bedroom,
                    is_temporary: true,
                    notes: None,
                },
            )
            .unwrap();
        fail_history_inserts(&store);

        assert!(store.return_item(item.id).is_err());

        let unchanged = store.get_item(item.id).unwrap();
        assert_eq!(unchanged.current_location_id, bedroom);
        assert_eq!(unchanged.permanent_location_id, Some(dresser));
        assert!(unchanged.is_temporary_placement);
        assert_eq!(store.list_history(item.id, None).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_timestamp_is_a_storage_error() {
        let store = store();
        let (_, dresser) = bedroom_and_dresser(&store);
        let item = store.create_item(NewItem::new("Lamp", dresser)).unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE items SET created_at = ?1 WHERE id = ?2",
                params![i64::MAX, item.id.to_string()],
            )
            .unwrap();

        assert!(matches!(
            store.get_item(item.id).unwrap_err(),
            StowageError::Storage(_)
        ));
    }
}
