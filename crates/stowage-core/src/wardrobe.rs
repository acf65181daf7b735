//! Wardrobe: clothing items and their wear/wash cycle
//!
//! Cleanliness transitions:
//! ```text
//! Clean ──wear──▶ Worn ──wear (count >= max)──▶ Dirty
//!   ▲               │                              │
//!   │               └──────────to_laundry──────────┴──▶ Washing
//!   └─────────────────────────wash──────────────────────────┘
//! ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StowageError};
use crate::item::{Item, NewItem};

/// Upper bound accepted for `max_wears_before_wash`
pub const MAX_WEARS_LIMIT: u32 = 20;

/// Clothing categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothingCategory {
    Shirt,
    Tshirt,
    Pants,
    Jeans,
    Shorts,
    Dress,
    Skirt,
    Jacket,
    Sweater,
    Hoodie,
    Coat,
    Underwear,
    Socks,
    Shoes,
    Accessories,
    Other,
}

impl ClothingCategory {
    pub const ALL: [ClothingCategory; 16] = [
        ClothingCategory::Shirt,
        ClothingCategory::Tshirt,
        ClothingCategory::Pants,
        ClothingCategory::Jeans,
        ClothingCategory::Shorts,
        ClothingCategory::Dress,
        ClothingCategory::Skirt,
        ClothingCategory::Jacket,
        ClothingCategory::Sweater,
        ClothingCategory::Hoodie,
        ClothingCategory::Coat,
        ClothingCategory::Underwear,
        ClothingCategory::Socks,
        ClothingCategory::Shoes,
        ClothingCategory::Accessories,
        ClothingCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingCategory::Shirt => "shirt",
            ClothingCategory::Tshirt => "tshirt",
            ClothingCategory::Pants => "pants",
            ClothingCategory::Jeans => "jeans",
            ClothingCategory::Shorts => "shorts",
            ClothingCategory::Dress => "dress",
            ClothingCategory::Skirt => "skirt",
            ClothingCategory::Jacket => "jacket",
            ClothingCategory::Sweater => "sweater",
            ClothingCategory::Hoodie => "hoodie",
            ClothingCategory::Coat => "coat",
            ClothingCategory::Underwear => "underwear",
            ClothingCategory::Socks => "socks",
            ClothingCategory::Shoes => "shoes",
            ClothingCategory::Accessories => "accessories",
            ClothingCategory::Other => "other",
        }
    }

    /// How many wears a garment of this category usually takes before a wash
    pub fn default_max_wears(&self) -> u32 {
        match self {
            ClothingCategory::Underwear | ClothingCategory::Socks | ClothingCategory::Tshirt => 1,
            ClothingCategory::Shirt
            | ClothingCategory::Shorts
            | ClothingCategory::Dress
            | ClothingCategory::Skirt => 2,
            ClothingCategory::Pants
            | ClothingCategory::Sweater
            | ClothingCategory::Hoodie
            | ClothingCategory::Other => 3,
            ClothingCategory::Jeans => 4,
            ClothingCategory::Jacket => 5,
            ClothingCategory::Coat => 7,
            ClothingCategory::Shoes | ClothingCategory::Accessories => 10,
        }
    }
}

impl FromStr for ClothingCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ClothingCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown clothing category: {}", s))
    }
}

/// Cleanliness of a garment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Cleanliness {
    /// Fresh, ready to wear
    #[default]
    Clean,
    /// Worn but can be reworn
    Worn,
    /// Needs washing
    Dirty,
    /// In the laundry
    Washing,
}

impl Cleanliness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cleanliness::Clean => "clean",
            Cleanliness::Worn => "worn",
            Cleanliness::Dirty => "dirty",
            Cleanliness::Washing => "washing",
        }
    }
}

impl FromStr for Cleanliness {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "clean" | "fresh" => Ok(Cleanliness::Clean),
            "worn" => Ok(Cleanliness::Worn),
            "dirty" => Ok(Cleanliness::Dirty),
            "washing" => Ok(Cleanliness::Washing),
            other => Err(format!("unknown cleanliness: {}", other)),
        }
    }
}

/// Wardrobe state attached to a clothing item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingProfile {
    pub category: ClothingCategory,
    pub style: Option<String>,
    pub color: Option<String>,
    pub cleanliness: Cleanliness,
    pub wear_count_since_wash: u32,
    pub max_wears_before_wash: u32,
    pub last_worn_at: Option<DateTime<Utc>>,
}

impl ClothingProfile {
    pub fn new(category: ClothingCategory) -> Self {
        Self {
            category,
            style: None,
            color: None,
            cleanliness: Cleanliness::Clean,
            wear_count_since_wash: 0,
            max_wears_before_wash: category.default_max_wears(),
            last_worn_at: None,
        }
    }

    /// Clean or worn, and still under its wear limit
    pub fn can_rewear(&self) -> bool {
        matches!(self.cleanliness, Cleanliness::Clean | Cleanliness::Worn)
            && self.wear_count_since_wash < self.max_wears_before_wash
    }

    pub fn needs_washing(&self) -> bool {
        matches!(self.cleanliness, Cleanliness::Dirty | Cleanliness::Washing)
    }

    /// Log one wear
    pub fn wear(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.cleanliness {
            Cleanliness::Dirty => {
                return Err(StowageError::conflict("Item is dirty and needs washing"))
            }
            Cleanliness::Washing => {
                return Err(StowageError::conflict("Item is currently being washed"))
            }
            Cleanliness::Clean | Cleanliness::Worn => {}
        }
        self.wear_count_since_wash += 1;
        self.last_worn_at = Some(now);
        self.cleanliness = if self.wear_count_since_wash >= self.max_wears_before_wash {
            Cleanliness::Dirty
        } else {
            Cleanliness::Worn
        };
        Ok(())
    }

    pub fn wash(&mut self) {
        self.wear_count_since_wash = 0;
        self.cleanliness = Cleanliness::Clean;
    }

    pub fn send_to_laundry(&mut self) {
        self.cleanliness = Cleanliness::Washing;
    }

    /// Worn-basket moves are for rewearable clothes only
    pub fn ensure_rewearable_basket(&self) -> Result<()> {
        if self.needs_washing() {
            return Err(StowageError::conflict(
                "Item needs washing; send it to the laundry instead",
            ));
        }
        Ok(())
    }

    /// Apply an update's wardrobe fields
    pub(crate) fn apply_update(&mut self, update: &ClothingUpdate) -> Result<()> {
        if let Some(max) = update.max_wears_before_wash {
            self.max_wears_before_wash = validate_max_wears(max)?;
            if !self.needs_washing() && self.wear_count_since_wash >= self.max_wears_before_wash
            {
                self.cleanliness = Cleanliness::Dirty;
            }
        }
        if let Some(style) = &update.style {
            self.style = non_empty(style);
        }
        if let Some(color) = &update.color {
            self.color = non_empty(color);
        }
        Ok(())
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

pub(crate) fn validate_max_wears(max: u32) -> Result<u32> {
    if !(1..=MAX_WEARS_LIMIT).contains(&max) {
        return Err(StowageError::validation(format!(
            "max_wears_before_wash must be between 1 and {}",
            MAX_WEARS_LIMIT
        )));
    }
    Ok(max)
}

/// A clothing item: the item record plus its wardrobe profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    #[serde(flatten)]
    pub item: Item,
    #[serde(flatten)]
    pub profile: ClothingProfile,
    pub can_rewear: bool,
}

impl ClothingItem {
    pub fn new(item: Item, profile: ClothingProfile) -> Self {
        let can_rewear = profile.can_rewear();
        Self {
            item,
            profile,
            can_rewear,
        }
    }
}

/// Request to create a clothing item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClothingItem {
    #[serde(flatten)]
    pub item: NewItem,
    pub category: ClothingCategory,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub max_wears_before_wash: Option<u32>,
}

impl NewClothingItem {
    pub fn new(item: NewItem, category: ClothingCategory) -> Self {
        Self {
            item,
            category,
            style: None,
            color: None,
            max_wears_before_wash: None,
        }
    }

    pub(crate) fn profile(&self) -> Result<ClothingProfile> {
        let mut profile = ClothingProfile::new(self.category);
        if let Some(max) = self.max_wears_before_wash {
            profile.max_wears_before_wash = validate_max_wears(max)?;
        }
        profile.style = self.style.as_deref().and_then(non_empty);
        profile.color = self.color.as_deref().and_then(non_empty);
        Ok(profile)
    }
}

/// Editable clothing fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClothingUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_wears_before_wash: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Filters for listing clothing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClothingFilter {
    #[serde(default)]
    pub cleanliness: Option<Cleanliness>,
    #[serde(default)]
    pub category: Option<ClothingCategory>,
}

impl ClothingFilter {
    pub fn matches(&self, profile: &ClothingProfile) -> bool {
        self.cleanliness.map_or(true, |c| c == profile.cleanliness)
            && self.category.map_or(true, |c| c == profile.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wear_until_dirty() {
        let mut profile = ClothingProfile::new(ClothingCategory::Shirt);
        assert_eq!(profile.max_wears_before_wash, 2);

        profile.wear(Utc::now()).unwrap();
        assert_eq!(profile.cleanliness, Cleanliness::Worn);
        assert!(profile.can_rewear());

        profile.wear(Utc::now()).unwrap();
        assert_eq!(profile.cleanliness, Cleanliness::Dirty);
        assert_eq!(profile.wear_count_since_wash, 2);
        assert!(!profile.can_rewear());

        let err = profile.wear(Utc::now()).unwrap_err();
        assert!(matches!(err, StowageError::Conflict(_)));
        assert_eq!(profile.wear_count_since_wash, 2);
    }

    #[test]
    fn wash_at_limit_resets() {
        let mut profile = ClothingProfile::new(ClothingCategory::Jeans);
        for _ in 0..profile.max_wears_before_wash {
            profile.wear(Utc::now()).unwrap();
        }
        assert_eq!(
            profile.wear_count_since_wash,
            profile.max_wears_before_wash
        );

        profile.wash();
        assert_eq!(profile.cleanliness, Cleanliness::Clean);
        assert_eq!(profile.wear_count_since_wash, 0);
        assert!(profile.can_rewear());
    }

    #[test]
    fn washing_items_cannot_be_worn() {
        let mut profile = ClothingProfile::new(ClothingCategory::Coat);
        profile.send_to_laundry();
        assert!(profile.wear(Utc::now()).is_err());
        assert!(profile.ensure_rewearable_basket().is_err());
    }

    #[test]
    fn default_thresholds() {
        assert_eq!(ClothingCategory::Socks.default_max_wears(), 1);
        assert_eq!(ClothingCategory::Coat.default_max_wears(), 7);
        assert_eq!(ClothingCategory::Shoes.default_max_wears(), 10);
    }

    #[test]
    fn lowering_the_limit_can_make_an_item_dirty() {
        let mut profile = ClothingProfile::new(ClothingCategory::Jacket);
        profile.wear(Utc::now()).unwrap();
        profile.wear(Utc::now()).unwrap();
        profile
            .apply_update(&ClothingUpdate {
                max_wears_before_wash: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(profile.cleanliness, Cleanliness::Dirty);

        let err = profile
            .apply_update(&ClothingUpdate {
                max_wears_before_wash: Some(21),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StowageError::Validation(_)));
    }

    #[test]
    fn fresh_is_accepted_as_clean() {
        assert_eq!("fresh".parse::<Cleanliness>().unwrap(), Cleanliness::Clean);
        assert_eq!(
            serde_json::to_string(&Cleanliness::Washing).unwrap(),
            "\"washing\""
        );
    }

    #[test]
    fn filter_matches_category_and_state() {
        let profile = ClothingProfile::new(ClothingCategory::Hoodie);
        assert!(ClothingFilter::default().matches(&profile));
        assert!(ClothingFilter {
            category: Some(ClothingCategory::Hoodie),
            cleanliness: Some(Cleanliness::Clean),
        }
        .matches(&profile));
        assert!(!ClothingFilter {
            category: Some(ClothingCategory::Coat),
            cleanliness: None,
        }
        .matches(&profile));
    }
}
