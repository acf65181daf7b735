//! Location nesting rules
//!
//! Which location kind may sit directly under which parent kind:
//! ```text
//! (root)     → room, furniture, container, surface
//! room       → furniture, container, surface, portable
//! furniture  → container, surface
//! container  → container
//! surface    → container, portable
//! portable   → container
//! laundry_*  → (nothing)
//! ```
//! Items are not constrained by these rules; any location kind can hold items.

use crate::location::LocationKind;

const ROOT_KINDS: &[LocationKind] = &[
    LocationKind::Room,
    LocationKind::Furniture,
    LocationKind::Container,
    LocationKind::Surface,
];

/// Kinds that may be nested directly under `parent`
pub fn allowed_children(parent: LocationKind) -> &'static [LocationKind] {
    match parent {
        LocationKind::Room => &[
            LocationKind::Furniture,
            LocationKind::Container,
            LocationKind::Surface,
            LocationKind::Portable,
        ],
        LocationKind::Furniture => &[LocationKind::Container, LocationKind::Surface],
        LocationKind::Container => &[LocationKind::Container],
        LocationKind::Surface => &[LocationKind::Container, LocationKind::Portable],
        LocationKind::Portable => &[LocationKind::Container],
        LocationKind::LaundryWorn | LocationKind::LaundryDirty => &[],
    }
}

/// Kinds that may exist without a parent
pub fn root_kinds() -> &'static [LocationKind] {
    ROOT_KINDS
}

/// Whether a location of kind `child` may be created under `parent`
/// (`None` meaning at the root).
pub fn can_nest(parent: Option<LocationKind>, child: LocationKind) -> bool {
    match parent {
        Some(parent) => allowed_children(parent).contains(&child),
        None => ROOT_KINDS.contains(&child),
    }
}

/// Human-readable reason a nesting is rejected, or `None` if it is allowed.
pub fn nesting_violation(parent: Option<LocationKind>, child: LocationKind) -> Option<String> {
    if can_nest(parent, child) {
        return None;
    }
    Some(match parent {
        None => format!("A {} location cannot be created at the top level", child),
        Some(parent) if allowed_children(parent).is_empty() => {
            format!("A {} location cannot contain other locations", parent)
        }
        Some(parent) => format!(
            "A {} location cannot be placed inside a {} (allowed: {})",
            child,
            parent,
            allowed_children(parent)
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}
