//! Movement history: append-only record of placement changes

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{ItemId, PlacementChange};
use crate::location::LocationId;

/// What kind of placement change an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementAction {
    /// Initial placement when the item is created
    Create,
    /// Moved from one location to another
    Move,
    /// Returned to its permanent location
    Return,
}

impl MovementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementAction::Create => "create",
            MovementAction::Move => "move",
            MovementAction::Return => "return",
        }
    }
}

impl std::fmt::Display for MovementAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(MovementAction::Create),
            "move" => Ok(MovementAction::Move),
            "return" => Ok(MovementAction::Return),
            other => Err(format!("unknown movement action: {}", other)),
        }
    }
}

/// One placement change of one item.
///
/// Entries are never mutated, and outlive the item they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementHistoryEntry {
    pub id: Uuid,
    pub item_id: ItemId,
    pub action: MovementAction,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: LocationId,
    pub moved_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl MovementHistoryEntry {
    pub fn created(item_id: ItemId, at: LocationId, moved_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            action: MovementAction::Create,
            from_location_id: None,
            to_location_id: at,
            moved_at,
            notes: None,
        }
    }

    pub fn for_change(
        item_id: ItemId,
        action: MovementAction,
        change: &PlacementChange,
        moved_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            action,
            from_location_id: Some(change.from),
            to_location_id: change.to,
            moved_at,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_entries_have_no_origin() {
        let to = LocationId::new();
        let entry = MovementHistoryEntry::created(ItemId::new(), to, Utc::now());
        assert_eq!(entry.action, MovementAction::Create);
        assert!(entry.from_location_id.is_none());
        assert_eq!(entry.to_location_id, to);
    }

    #[test]
    fn change_entries_copy_endpoints() {
        let change = PlacementChange {
            from: LocationId::new(),
            to: LocationId::new(),
            permanent_location_id: None,
            is_temporary_placement: true,
        };
        let entry = MovementHistoryEntry::for_change(
            ItemId::new(),
            MovementAction::Move,
            &change,
            Utc::now(),
            Some("packing".into()),
        );
        assert_eq!(entry.from_location_id, Some(change.from));
        assert_eq!(entry.to_location_id, change.to);
    }

    #[test]
    fn action_wire_names() {
        assert_eq!(serde_json::to_string(&MovementAction::Return).unwrap(), "\"return\"");
        assert_eq!("move".parse::<MovementAction>().unwrap(), MovementAction::Move);
        assert!("teleport".parse::<MovementAction>().is_err());
    }
}
