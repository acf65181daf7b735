//! Error types for stowage-core

use thiserror::Error;

/// Result type alias for stowage operations
pub type Result<T> = std::result::Result<T, StowageError>;

/// The kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Location,
    Item,
    ClothingItem,
    QrCode,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Location => write!(f, "Location"),
            Entity::Item => write!(f, "Item"),
            Entity::ClothingItem => write!(f, "Clothing item"),
            Entity::QrCode => write!(f, "QR code"),
        }
    }
}

/// Main error type for stowage operations.
///
/// Every variant except `Storage` describes invalid input and is surfaced
/// to the caller as-is; none of them are worth retrying.
#[derive(Error, Debug)]
pub enum StowageError {
    /// A referenced id does not exist
    #[error("{0} not found: {1}")]
    NotFound(Entity, String),

    /// Nesting rule violated, missing or malformed field, non-positive quantity
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is well-formed but the current state forbids it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StowageError {
    pub fn not_found(entity: Entity, id: impl std::fmt::Display) -> Self {
        StowageError::NotFound(entity, id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        StowageError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StowageError::Conflict(msg.into())
    }

    /// Message suitable for showing to the user
    pub fn detail(&self) -> String {
        match self {
            StowageError::NotFound(entity, _) => format!("{} not found", entity),
            StowageError::Validation(msg) | StowageError::Conflict(msg) => msg.clone(),
            StowageError::Storage(_) => "Internal storage error".to_string(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StowageError {
    fn from(err: rusqlite::Error) -> Self {
        StowageError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StowageError {
    fn from(err: serde_json::Error) -> Self {
        StowageError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for StowageError {
    fn from(err: std::io::Error) -> Self {
        StowageError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_entity() {
        let err = StowageError::not_found(Entity::ClothingItem, "abc");
        assert_eq!(err.to_string(), "Clothing item not found: abc");
        assert_eq!(err.detail(), "Clothing item not found");
    }

    #[test]
    fn detail_hides_storage_internals() {
        let err = StowageError::Storage("disk I/O error at page 12".into());
        assert!(!err.detail().contains("page 12"));

        let err = StowageError::conflict("Item is already at its permanent location");
        assert_eq!(err.detail(), "Item is already at its permanent location");
    }
}
