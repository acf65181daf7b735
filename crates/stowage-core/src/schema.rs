//! SQLite schema for the inventory store

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Location tree (parent-pointer graph; counts are aggregated on read)
CREATE TABLE IF NOT EXISTS locations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    kind TEXT NOT NULL,
    parent_id TEXT REFERENCES locations(id),
    qr_code_id TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_locations_parent ON locations(parent_id);
CREATE INDEX IF NOT EXISTS idx_locations_kind ON locations(kind);
CREATE INDEX IF NOT EXISTS idx_locations_name ON locations(name);

CREATE TABLE IF NOT EXISTS location_aliases (
    location_id TEXT NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
    alias TEXT NOT NULL,
    PRIMARY KEY (location_id, alias)
);

CREATE INDEX IF NOT EXISTS idx_location_aliases_alias ON location_aliases(alias);

-- Items
CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    item_type TEXT NOT NULL DEFAULT 'generic',
    current_location_id TEXT NOT NULL REFERENCES locations(id),
    permanent_location_id TEXT REFERENCES locations(id),
    is_temporary_placement INTEGER NOT NULL DEFAULT 0,
    is_lent INTEGER NOT NULL DEFAULT 0,
    lent_to TEXT,
    lent_at INTEGER,
    due_date TEXT,
    lent_notes TEXT,
    qr_code_id TEXT NOT NULL UNIQUE,
    last_moved_at INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_current ON items(current_location_id);
CREATE INDEX IF NOT EXISTS idx_items_permanent ON items(permanent_location_id);
CREATE INDEX IF NOT EXISTS idx_items_type ON items(item_type);
CREATE INDEX IF NOT EXISTS idx_items_lent ON items(is_lent);
CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);

CREATE TABLE IF NOT EXISTS item_aliases (
    item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    alias TEXT NOT NULL,
    PRIMARY KEY (item_id, alias)
);

-- Wardrobe state for clothing items
CREATE TABLE IF NOT EXISTS clothing_profiles (
    item_id TEXT PRIMARY KEY REFERENCES items(id) ON DELETE CASCADE,
    category TEXT NOT NULL,
    style TEXT,
    color TEXT,
    cleanliness TEXT NOT NULL,
    wear_count_since_wash INTEGER NOT NULL DEFAULT 0,
    max_wears_before_wash INTEGER NOT NULL,
    last_worn_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_clothing_cleanliness ON clothing_profiles(cleanliness);

-- Movement history (append-only; ids are logical references so entries
-- survive deletion of the item or locations they mention)
CREATE TABLE IF NOT EXISTS movement_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    item_id TEXT NOT NULL,
    action TEXT NOT NULL,
    from_location_id TEXT,
    to_location_id TEXT NOT NULL,
    moved_at INTEGER NOT NULL,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_history_item ON movement_history(item_id, seq);
"#
    }

    /// Get migration SQL for a specific version
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            // (1, 2) => Some("ALTER TABLE ..."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_declares_all_tables() {
        let sql = Schema::create_tables();
        for table in [
            "locations",
            "location_aliases",
            "items",
            "item_aliases",
            "clothing_profiles",
            "movement_history",
            "schema_version",
        ] {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_no_pending_migrations() {
        assert!(Schema::migration(0, SCHEMA_VERSION).is_none());
    }
}
