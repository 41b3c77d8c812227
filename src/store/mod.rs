pub mod memory;
pub mod models;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{Collection, CollectionFields, CollectionPatch, Garment, Tag, User};
pub use postgres::PgStore;

/// Errors surfaced by entity store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence contract for users, tags, garments, collections and the two
/// collection association sets. Backends own durability and id assignment;
/// ids are monotonically increasing per entity kind so that descending-by-id
/// ordering doubles as most-recently-created-first.
///
/// Owner scoping is NOT enforced here; that is the scoped service's job.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // Users
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // Tags
    async fn create_tag(&self, owner: i64, name: &str) -> Result<Tag, StoreError>;
    async fn tag_by_id(&self, id: i64) -> Result<Option<Tag>, StoreError>;
    async fn tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, StoreError>;
    /// First tag matching exact `(owner, name)`, if any
    async fn find_tag(&self, owner: i64, name: &str) -> Result<Option<Tag>, StoreError>;
    async fn tags_for_owner(&self, owner: i64) -> Result<Vec<Tag>, StoreError>;
    async fn update_tag_name(&self, id: i64, name: &str) -> Result<Tag, StoreError>;
    /// Removes the tag row and detaches it from any collection
    async fn delete_tag(&self, id: i64) -> Result<(), StoreError>;
    /// Ids of tags attached to at least one collection, across all owners
    async fn assigned_tag_ids(&self) -> Result<HashSet<i64>, StoreError>;

    // Garments
    async fn create_garment(&self, owner: i64, name: &str) -> Result<Garment, StoreError>;
    async fn garment_by_id(&self, id: i64) -> Result<Option<Garment>, StoreError>;
    async fn garments_by_ids(&self, ids: &[i64]) -> Result<Vec<Garment>, StoreError>;
    async fn find_garment(&self, owner: i64, name: &str) -> Result<Option<Garment>, StoreError>;
    async fn garments_for_owner(&self, owner: i64) -> Result<Vec<Garment>, StoreError>;
    async fn update_garment_name(&self, id: i64, name: &str) -> Result<Garment, StoreError>;
    async fn set_garment_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> Result<Garment, StoreError>;
    async fn delete_garment(&self, id: i64) -> Result<(), StoreError>;
    async fn assigned_garment_ids(&self) -> Result<HashSet<i64>, StoreError>;

    // Collections
    async fn create_collection(
        &self,
        owner: i64,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError>;
    async fn collection_by_id(&self, id: i64) -> Result<Option<Collection>, StoreError>;
    async fn collections_for_owner(&self, owner: i64) -> Result<Vec<Collection>, StoreError>;
    async fn update_collection(
        &self,
        id: i64,
        patch: &CollectionPatch,
    ) -> Result<Collection, StoreError>;
    async fn set_collection_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> Result<Collection, StoreError>;
    /// Removes the row and its association links; never cascades into tag or
    /// garment rows
    async fn delete_collection(&self, id: i64) -> Result<(), StoreError>;
    /// Replaces the collection's tag association set wholesale
    async fn set_collection_tags(&self, id: i64, tag_ids: &[i64]) -> Result<(), StoreError>;
    async fn set_collection_garments(
        &self,
        id: i64,
        garment_ids: &[i64],
    ) -> Result<(), StoreError>;
}
