//! Location types and read-time tree materialization

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StowageError};

/// Unique identifier for a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub Uuid);

impl LocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| StowageError::validation(format!("Invalid location id '{}': {}", s, e)))
    }
}

impl Default for LocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of storage node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Bedroom, kitchen, garage
    Room,
    /// Wardrobe, bed, desk, cabinet
    Furniture,
    /// Box, drawer, bin, basket
    Container,
    /// Shelf, desk top, counter
    Surface,
    /// Bag, suitcase, backpack
    Portable,
    /// Basket for worn but rewearable clothes
    LaundryWorn,
    /// Basket for clothes waiting to be washed
    LaundryDirty,
}

impl LocationKind {
    pub const ALL: [LocationKind; 7] = [
        LocationKind::Room,
        LocationKind::Furniture,
        LocationKind::Container,
        LocationKind::Surface,
        LocationKind::Portable,
        LocationKind::LaundryWorn,
        LocationKind::LaundryDirty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Room => "room",
            LocationKind::Furniture => "furniture",
            LocationKind::Container => "container",
            LocationKind::Surface => "surface",
            LocationKind::Portable => "portable",
            LocationKind::LaundryWorn => "laundry_worn",
            LocationKind::LaundryDirty => "laundry_dirty",
        }
    }

    /// Laundry baskets are provisioned by the wardrobe, never by users
    pub fn is_system_managed(&self) -> bool {
        matches!(self, LocationKind::LaundryWorn | LocationKind::LaundryDirty)
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        LocationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown location kind: {}", s))
    }
}

/// A physical storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: Option<String>,
    pub kind: LocationKind,
    pub parent_id: Option<LocationId>,
    pub aliases: Vec<String>,
    pub qr_code_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A location together with its read-time counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationView {
    #[serde(flatten)]
    pub location: Location,
    pub item_count: u64,
    pub children_count: u64,
}

/// One step of a root-to-node breadcrumb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
}

/// A location with its breadcrumb path and direct children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub view: LocationView,
    pub path: Vec<PathSegment>,
    pub children: Vec<LocationView>,
}

/// A nested tree node, built on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationNode {
    pub id: LocationId,
    pub name: String,
    pub description: Option<String>,
    pub kind: LocationKind,
    pub aliases: Vec<String>,
    pub qr_code_id: String,
    pub item_count: u64,
    pub children: Vec<LocationNode>,
}

/// Request to create a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub kind: LocationKind,
    #[serde(default)]
    pub parent_id: Option<LocationId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl NewLocation {
    pub fn new(name: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            description: None,
            aliases: Vec::new(),
        }
    }

    pub fn under(mut self, parent_id: LocationId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Editable location fields; kind and parent are fixed after creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub(crate) const MAX_NAME_LEN: usize = 255;
pub(crate) const MAX_DESCRIPTION_LEN: usize = 500;

/// Trim and bound-check a display name
pub(crate) fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StowageError::validation("Name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(StowageError::validation(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_description(description: Option<&str>) -> Result<Option<String>> {
    match description.map(str::trim) {
        None | Some("") => Ok(None),
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(StowageError::validation(
            format!("Description must be at most {} characters", MAX_DESCRIPTION_LEN),
        )),
        Some(d) => Ok(Some(d.to_string())),
    }
}

/// Trimmed, non-empty, de-duplicated aliases in first-seen order
pub(crate) fn normalize_aliases(aliases: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for alias in aliases {
        let alias = alias.trim();
        if !alias.is_empty() && !out.iter().any(|a| a == alias) {
            out.push(alias.to_string());
        }
    }
    out
}

/// Flat collection of locations indexed by parent, for tree views and paths.
///
/// Nothing about the hierarchy is stored beyond each node's `parent_id`;
/// children are resolved through the index at read time.
pub struct LocationForest {
    nodes: Vec<LocationView>,
    by_id: HashMap<LocationId, usize>,
    children: HashMap<Option<LocationId>, Vec<usize>>,
}

impl LocationForest {
    pub fn new(mut nodes: Vec<LocationView>) -> Self {
        nodes.sort_by(|a, b| {
            a.location
                .name
                .to_lowercase()
                .cmp(&b.location.name.to_lowercase())
        });
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<Option<LocationId>, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            by_id.insert(node.location.id, idx);
            children
                .entry(node.location.parent_id)
                .or_default()
                .push(idx);
        }
        Self {
            nodes,
            by_id,
            children,
        }
    }

    pub fn get(&self, id: LocationId) -> Option<&LocationView> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Direct children of `parent` (`None` for roots), sorted by name
    pub fn children_of(&self, parent: Option<LocationId>) -> Vec<&LocationView> {
        self.children
            .get(&parent)
            .map(|idxs| idxs.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// Nested trees for every root location
    pub fn roots(&self) -> Vec<LocationNode> {
        self.children
            .get(&None)
            .map(|idxs| idxs.iter().map(|&i| self.build(i, 0)).collect())
            .unwrap_or_default()
    }

    /// Nested tree rooted at `id`
    pub fn subtree(&self, id: LocationId) -> Option<LocationNode> {
        self.by_id.get(&id).map(|&idx| self.build(idx, 0))
    }

    /// Breadcrumbs from the root down to `id` (inclusive)
    pub fn path(&self, id: LocationId) -> Vec<PathSegment> {
        let mut path = Vec::new();
        let mut current = self.get(id);
        while let Some(view) = current {
            // parent pointers cannot be reassigned, but never loop on bad data
            if path.len() > self.nodes.len() {
                break;
            }
            path.push(PathSegment {
                id: view.location.id,
                name: view.location.name.clone(),
                kind: view.location.kind,
            });
            current = view.location.parent_id.and_then(|p| self.get(p));
        }
        path.reverse();
        path
    }

    fn build(&self, idx: usize, depth: usize) -> LocationNode {
        let view = &self.nodes[idx];
        let children = if depth >= self.nodes.len() {
            Vec::new()
        } else {
            self.children
                .get(&Some(view.location.id))
                .map(|idxs| idxs.iter().map(|&i| self.build(i, depth + 1)).collect())
                .unwrap_or_default()
        };
        LocationNode {
            id: view.location.id,
            name: view.location.name.clone(),
            description: view.location.description.clone(),
            kind: view.location.kind,
            aliases: view.location.aliases.clone(),
            qr_code_id: view.location.qr_code_id.clone(),
            item_count: view.item_count,
            children,
        }
    }
}

/// Render breadcrumbs the way search results show them: "Home → Bedroom → Dresser"
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" → ")
}
