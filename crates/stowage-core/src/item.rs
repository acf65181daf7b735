//! Item records and the placement state machine
//!
//! Placement states:
//! ```text
//! AtHome ──move(temporary)──▶ TemporarilyPlaced
//!   ▲                              │
//!   └───────────return─────────────┘
//! AtHome / TemporarilyPlaced ──lend──▶ Lent ──return_loan──▶ (prior state)
//! ```
//! No state is terminal; items cycle until deleted.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StowageError};
use crate::location::{
    normalize_aliases, validate_description, validate_name, LocationId, PathSegment,
};

/// Unique identifier for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| StowageError::validation(format!("Invalid item id '{}': {}", s, e)))
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Domain extension an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Generic,
    Clothing,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Generic => "generic",
            ItemType::Clothing => "clothing",
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "generic" => Ok(ItemType::Generic),
            "clothing" => Ok(ItemType::Clothing),
            other => Err(format!("unknown item type: {}", other)),
        }
    }
}

/// Where an item stands in the placement lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementState {
    AtHome,
    TemporarilyPlaced,
    Lent,
}

/// A physical item stored in a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub item_type: ItemType,
    pub current_location_id: LocationId,
    pub permanent_location_id: Option<LocationId>,
    pub is_temporary_placement: bool,
    pub is_lent: bool,
    pub lent_to: Option<String>,
    pub lent_at: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub lent_notes: Option<String>,
    pub aliases: Vec<String>,
    pub qr_code_id: String,
    pub last_moved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Location fields after a placement operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementChange {
    pub from: LocationId,
    pub to: LocationId,
    pub permanent_location_id: Option<LocationId>,
    pub is_temporary_placement: bool,
}

impl Item {
    pub fn placement_state(&self) -> PlacementState {
        if self.is_lent {
            PlacementState::Lent
        } else if self.is_temporary_placement {
            PlacementState::TemporarilyPlaced
        } else {
            PlacementState::AtHome
        }
    }

    pub fn is_at_home(&self) -> bool {
        self.permanent_location_id == Some(self.current_location_id)
    }

    fn ensure_not_lent(&self) -> Result<()> {
        if self.is_lent {
            return Err(StowageError::conflict(format!(
                "Item is lent to {}; return the loan first",
                self.lent_to.as_deref().unwrap_or("someone")
            )));
        }
        Ok(())
    }

    /// Placement after moving to `to`.
    ///
    /// A permanent move re-homes the item. A temporary move keeps the home,
    /// adopting the pre-move location as home if the item had none, and is
    /// only flagged temporary while the item is actually away from home.
    pub fn plan_move(&self, to: LocationId, is_temporary: bool) -> Result<PlacementChange> {
        self.ensure_not_lent()?;
        let (home, temporary) = if is_temporary {
            let home = self
                .permanent_location_id
                .unwrap_or(self.current_location_id);
            (home, home != to)
        } else {
            (to, false)
        };
        Ok(PlacementChange {
            from: self.current_location_id,
            to,
            permanent_location_id: Some(home),
            is_temporary_placement: temporary,
        })
    }

    /// Placement after returning the item to its home
    pub fn plan_return(&self) -> Result<PlacementChange> {
        self.ensure_not_lent()?;
        let home = self
            .permanent_location_id
            .ok_or_else(|| StowageError::conflict("Item has no permanent location set"))?;
        if home == self.current_location_id {
            return Err(StowageError::conflict(
                "Item is already at its permanent location",
            ));
        }
        Ok(PlacementChange {
            from: self.current_location_id,
            to: home,
            permanent_location_id: Some(home),
            is_temporary_placement: false,
        })
    }

    pub(crate) fn apply(&mut self, change: &PlacementChange, now: DateTime<Utc>) {
        self.current_location_id = change.to;
        self.permanent_location_id = change.permanent_location_id;
        self.is_temporary_placement = change.is_temporary_placement;
        self.last_moved_at = Some(now);
        self.updated_at = now;
    }
}

fn default_quantity() -> i64 {
    1
}

/// Request to create an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub current_location_id: LocationId,
    #[serde(default)]
    pub permanent_location_id: Option<LocationId>,
    #[serde(default)]
    pub is_temporary_placement: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Validated form of [`NewItem`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub current_location_id: LocationId,
    pub permanent_location_id: LocationId,
    pub is_temporary_placement: bool,
    pub aliases: Vec<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, current_location_id: LocationId) -> Self {
        Self {
            name: name.into(),
            description: None,
            quantity: 1,
            current_location_id,
            permanent_location_id: None,
            is_temporary_placement: false,
            aliases: Vec::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Place the item temporarily, away from `home`
    pub fn temporarily_away_from(mut self, home: LocationId) -> Self {
        self.permanent_location_id = Some(home);
        self.is_temporary_placement = true;
        self
    }

    /// Field checks and home resolution; location existence is checked by the store
    pub(crate) fn validate(&self) -> Result<ItemDraft> {
        let name = validate_name(&self.name)?;
        let description = validate_description(self.description.as_deref())?;
        let quantity = validate_quantity(self.quantity)?;

        let home = if self.is_temporary_placement {
            self.permanent_location_id.ok_or_else(|| {
                StowageError::validation(
                    "A temporary placement needs a permanent location to return to",
                )
            })?
        } else {
            match self.permanent_location_id {
                Some(home) if home != self.current_location_id => {
                    return Err(StowageError::validation(
                        "Permanent location differs from the current location; \
                         mark the placement as temporary",
                    ))
                }
                _ => self.current_location_id,
            }
        };

        Ok(ItemDraft {
            name,
            description,
            quantity,
            current_location_id: self.current_location_id,
            permanent_location_id: home,
            is_temporary_placement: home != self.current_location_id,
            aliases: normalize_aliases(&self.aliases),
        })
    }
}

pub(crate) fn validate_quantity(quantity: i64) -> Result<u32> {
    if quantity < 1 {
        return Err(StowageError::validation("Quantity must be at least 1"));
    }
    u32::try_from(quantity).map_err(|_| StowageError::validation("Quantity is too large"))
}

/// Editable item fields; placement changes go through move/return
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
}

/// Request to move an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub to_location_id: LocationId,
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to lend an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub borrower: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filters for listing items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub temporary_only: bool,
    #[serde(default)]
    pub lent_only: bool,
}

/// An item together with the breadcrumb path of its current location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithPath {
    #[serde(flatten)]
    pub item: Item,
    pub location_path: Vec<PathSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_at(current: LocationId, home: Option<LocationId>) -> Item {
        let now = Utc::now();
        Item {
            id: ItemId::new(),
            name: "Sweater".into(),
            description: None,
            quantity: 1,
            item_type: ItemType::Generic,
            current_location_id: current,
            permanent_location_id: home,
            is_temporary_placement: home.is_some_and(|h| h != current),
            is_lent: false,
            lent_to: None,
            lent_at: None,
            due_date: None,
            lent_notes: None,
            aliases: vec![],
            qr_code_id: "psms-item-00000000".into(),
            last_moved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn temporary_move_keeps_home() {
        let dresser = LocationId::new();
        let bedroom = LocationId::new();
        let item = item_at(dresser, Some(dresser));

        let change = item.plan_move(bedroom, true).unwrap();
        assert_eq!(change.from, dresser);
        assert_eq!(change.to, bedroom);
        assert_eq!(change.permanent_location_id, Some(dresser));
        assert!(change.is_temporary_placement);
    }

    #[test]
    fn temporary_move_to_home_is_not_temporary() {
        let dresser = LocationId::new();
        let item = item_at(dresser, Some(dresser));
        let change = item.plan_move(dresser, true).unwrap();
        assert!(!change.is_temporary_placement);
        assert_eq!(item.placement_state(), PlacementState::AtHome);
    }

    #[test]
    fn permanent_move_rehomes() {
        let dresser = LocationId::new();
        let shelf = LocationId::new();
        let item = item_at(dresser, Some(dresser));
        let change = item.plan_move(shelf, false).unwrap();
        assert_eq!(change.permanent_location_id, Some(shelf));
        assert!(!change.is_temporary_placement);
    }

    #[test]
    fn temporary_move_without_home_adopts_current() {
        let desk = LocationId::new();
        let bag = LocationId::new();
        let item = item_at(desk, None);
        let change = item.plan_move(bag, true).unwrap();
        assert_eq!(change.permanent_location_id, Some(desk));
        assert!(change.is_temporary_placement);
    }

    #[test]
    fn return_round_trip() {
        let dresser = LocationId::new();
        let bedroom = LocationId::new();
        let mut item = item_at(dresser, Some(dresser));

        let away = item.plan_move(bedroom, true).unwrap();
        item.apply(&away, Utc::now());
        assert_eq!(item.placement_state(), PlacementState::TemporarilyPlaced);

        let back = item.plan_return().unwrap();
        item.apply(&back, Utc::now());
        assert_eq!(item.current_location_id, dresser);
        assert_eq!(item.placement_state(), PlacementState::AtHome);

        let err = item.plan_return().unwrap_err();
        assert!(matches!(err, StowageError::Conflict(_)));
    }

    #[test]
    fn return_without_home_conflicts() {
        let item = item_at(LocationId::new(), None);
        assert!(matches!(
            item.plan_return().unwrap_err(),
            StowageError::Conflict(_)
        ));
    }

    #[test]
    fn lent_items_are_frozen() {
        let dresser = LocationId::new();
        let mut item = item_at(dresser, Some(dresser));
        item.is_lent = true;
        item.lent_to = Some("Sam".into());
        assert_eq!(item.placement_state(), PlacementState::Lent);

        let err = item.plan_move(LocationId::new(), true).unwrap_err();
        assert!(err.to_string().contains("Sam"));
        assert!(item.plan_return().is_err());
    }

    #[test]
    fn new_item_defaults_home_to_current() {
        let shelf = LocationId::new();
        let draft = NewItem::new(" Lamp ", shelf).validate().unwrap();
        assert_eq!(draft.name, "Lamp");
        assert_eq!(draft.permanent_location_id, shelf);
        assert!(!draft.is_temporary_placement);
    }

    #[test]
    fn new_item_rejects_bad_input() {
        let shelf = LocationId::new();
        assert!(NewItem::new("Lamp", shelf).with_quantity(0).validate().is_err());
        assert!(NewItem::new("", shelf).validate().is_err());

        let mut temp = NewItem::new("Lamp", shelf);
        temp.is_temporary_placement = true;
        assert!(temp.validate().is_err());

        let mut mismatched = NewItem::new("Lamp", shelf);
        mismatched.permanent_location_id = Some(LocationId::new());
        assert!(mismatched.validate().is_err());

        let home = LocationId::new();
        let draft = NewItem::new("Lamp", shelf)
            .temporarily_away_from(home)
            .validate()
            .unwrap();
        assert!(draft.is_temporary_placement);
        assert_eq!(draft.permanent_location_id, home);
    }

    #[test]
    fn quantity_defaults_to_one_when_deserialized() {
        let json = format!(
            r#"{{"name":"Tape","current_location_id":"{}"}}"#,
            LocationId::new()
        );
        let new_item: NewItem = serde_json::from_str(&json).unwrap();
        assert_eq!(new_item.quantity, 1);
        assert!(!new_item.is_temporary_placement);
    }
}
