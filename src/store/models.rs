use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Tag owned by a user. Names are not unique-constrained; the reconciler's
/// get-or-create keys on exact `(owner, name)` and tolerates duplicates.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Garment {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub user_id: i64,
}

/// Collection row plus its many-to-many association ids. The join sets are
/// unordered; no ordering guarantee is exposed to callers.
#[derive(Debug, Clone, FromRow)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub user_id: i64,
    #[sqlx(skip)]
    pub tag_ids: Vec<i64>,
    #[sqlx(skip)]
    pub garment_ids: Vec<i64>,
}

/// Plain column values for a collection insert. Association descriptors are
/// handled separately by the reconciler.
#[derive(Debug, Clone, Default)]
pub struct CollectionFields {
    pub title: String,
    pub description: String,
    pub link: String,
}

/// Column-level patch for a collection update. `None` leaves the column
/// untouched; the owner is never part of a patch.
#[derive(Debug, Clone, Default)]
pub struct CollectionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}
