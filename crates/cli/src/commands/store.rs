//! Store management commands.
//!
//! # Usage
//!
//! ```bash
//! sd-cli store create -n "Corner Shop" -u user_2abc
//! sd-cli store list -u user_2abc
//! ```

use thiserror::Error;

use storedesk_admin::db::{RepositoryError, StoreRepository};
use storedesk_core::{StoreId, ValidationErrors};

use super::{ConnectError, connect};

const MAX_NAME_CHARS: usize = 256;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationErrors),

    /// Store names are unique across the dashboard.
    #[error("Store already exist: {0}")]
    StoreExists(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a store owned by `user_id`.
///
/// # Errors
///
/// Returns `StoreError` on invalid input, a taken name, or a database failure.
pub async fn create(name: &str, user_id: &str) -> Result<StoreId, StoreError> {
    let (name, user_id) = validate(name, user_id)?;

    let pool = connect().await?;
    let repo = StoreRepository::new(&pool);
    if repo.find_by_name(&name).await?.is_some() {
        return Err(StoreError::StoreExists(name));
    }

    let store = repo.create(&name, &user_id).await?;
    tracing::info!(store_id = %store.id, "Store created: {}", store.name);
    Ok(store.id)
}

/// Log every store owned by `user_id`.
///
/// # Errors
///
/// Returns `StoreError` if the database is unreachable.
pub async fn list(user_id: &str) -> Result<(), StoreError> {
    let pool = connect().await?;
    let stores = StoreRepository::new(&pool).list_for_user(user_id).await?;

    if stores.is_empty() {
        tracing::info!("No stores for {user_id}");
    }
    for store in stores {
        tracing::info!(store_id = %store.id, created_at = %store.created_at, "{}", store.name);
    }
    Ok(())
}

fn validate(name: &str, user_id: &str) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = errors.required_text("name", Some(name), MAX_NAME_CHARS);
    let user_id = errors.required_text("user", Some(user_id), MAX_NAME_CHARS);
    match (name, user_id) {
        (Some(name), Some(user_id)) if errors.is_empty() => Ok((name, user_id)),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_requires() {
        let (name, user) = validate("  Corner Shop ", "user_1").unwrap();
        assert_eq!(name, "Corner Shop");
        assert_eq!(user, "user_1");

        let err = validate(" ", "").unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("user"));
    }
}
