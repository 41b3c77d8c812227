use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::store::models::{Collection, CollectionFields, CollectionPatch, Garment, Tag, User};
use crate::store::{EntityStore, StoreError};

/// DDL applied by `migrate()`. Join tables cascade on both sides so deleting
/// a collection, tag or garment only ever removes links, never peer rows.
const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_staff BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tags (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS garments (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        image TEXT,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS collections (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        link TEXT NOT NULL DEFAULT '',
        image TEXT,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS collection_tags (
        collection_id BIGINT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (collection_id, tag_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS collection_garments (
        collection_id BIGINT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        garment_id BIGINT NOT NULL REFERENCES garments(id) ON DELETE CASCADE,
        PRIMARY KEY (collection_id, garment_id)
    )"#,
];

/// Postgres-backed entity store over a sqlx pool
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        info!("database schema up to date");
        Ok(())
    }

    /// Loads the association id sets for a batch of collection rows
    async fn attach_association_ids(
        &self,
        mut rows: Vec<Collection>,
    ) -> Result<Vec<Collection>, StoreError> {
        if rows.is_empty() {
            return Ok(rows);
        }
        let ids: Vec<i64> = rows.iter().map(|c| c.id).collect();

        let tag_links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT collection_id, tag_id FROM collection_tags WHERE collection_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let garment_links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT collection_id, garment_id FROM collection_garments WHERE collection_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags_by_collection: HashMap<i64, Vec<i64>> = HashMap::new();
        for (cid, tid) in tag_links {
            tags_by_collection.entry(cid).or_default().push(tid);
        }
        let mut garments_by_collection: HashMap<i64, Vec<i64>> = HashMap::new();
        for (cid, gid) in garment_links {
            garments_by_collection.entry(cid).or_default().push(gid);
        }

        for row in &mut rows {
            row.tag_ids = tags_by_collection.remove(&row.id).unwrap_or_default();
            row.garment_ids = garments_by_collection.remove(&row.id).unwrap_or_default();
        }
        Ok(rows)
    }
}

fn map_unique_violation(err: sqlx::Error, message: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message),
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("user with email {} already exists", email)))
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_tag(&self, owner: i64, name: &str) -> Result<Tag, StoreError> {
        Ok(sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn tag_by_id(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        Ok(sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(
            sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = ANY($1) ORDER BY id")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_tag(&self, owner: i64, name: &str) -> Result<Option<Tag>, StoreError> {
        Ok(sqlx::query_as::<_, Tag>(
            "SELECT * FROM tags WHERE user_id = $1 AND name = $2 ORDER BY id LIMIT 1",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn tags_for_owner(&self, owner: i64) -> Result<Vec<Tag>, StoreError> {
        Ok(
            sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE user_id = $1")
                .bind(owner)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update_tag_name(&self, id: i64, name: &str) -> Result<Tag, StoreError> {
        sqlx::query_as::<_, Tag>("UPDATE tags SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("tag {} not found", id)))
    }

    async fn delete_tag(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("tag {} not found", id)));
        }
        Ok(())
    }

    async fn assigned_tag_ids(&self) -> Result<HashSet<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT DISTINCT tag_id FROM collection_tags")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn create_garment(&self, owner: i64, name: &str) -> Result<Garment, StoreError> {
        Ok(sqlx::query_as::<_, Garment>(
            "INSERT INTO garments (name, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn garment_by_id(&self, id: i64) -> Result<Option<Garment>, StoreError> {
        Ok(
            sqlx::query_as::<_, Garment>("SELECT * FROM garments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn garments_by_ids(&self, ids: &[i64]) -> Result<Vec<Garment>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(
            sqlx::query_as::<_, Garment>("SELECT * FROM garments WHERE id = ANY($1) ORDER BY id")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_garment(&self, owner: i64, name: &str) -> Result<Option<Garment>, StoreError> {
        Ok(sqlx::query_as::<_, Garment>(
            "SELECT * FROM garments WHERE user_id = $1 AND name = $2 ORDER BY id LIMIT 1",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn garments_for_owner(&self, owner: i64) -> Result<Vec<Garment>, StoreError> {
        Ok(
            sqlx::query_as::<_, Garment>("SELECT * FROM garments WHERE user_id = $1")
                .bind(owner)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update_garment_name(&self, id: i64, name: &str) -> Result<Garment, StoreError> {
        sqlx::query_as::<_, Garment>("UPDATE garments SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("garment {} not found", id)))
    }

    async fn set_garment_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> Result<Garment, StoreError> {
        sqlx::query_as::<_, Garment>("UPDATE garments SET image = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(image)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("garment {} not found", id)))
    }

    async fn delete_garment(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM garments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("garment {} not found", id)));
        }
        Ok(())
    }

    async fn assigned_garment_ids(&self) -> Result<HashSet<i64>, StoreError> {
        let ids =
            sqlx::query_scalar::<_, i64>("SELECT DISTINCT garment_id FROM collection_garments")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    async fn create_collection(
        &self,
        owner: i64,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError> {
        let row = sqlx::query_as::<_, Collection>(
            "INSERT INTO collections (title, description, link, user_id) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.link)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn collection_by_id(&self, id: i64) -> Result<Option<Collection>, StoreError> {
        let row = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.attach_association_ids(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn collections_for_owner(&self, owner: i64) -> Result<Vec<Collection>, StoreError> {
        let rows = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE user_id = $1")
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        self.attach_association_ids(rows).await
    }

    async fn update_collection(
        &self,
        id: i64,
        patch: &CollectionPatch,
    ) -> Result<Collection, StoreError> {
        let row = sqlx::query_as::<_, Collection>(
            "UPDATE collections SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                link = COALESCE($4, link) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.link)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("collection {} not found", id)))?;
        Ok(self
            .attach_association_ids(vec![row])
            .await?
            .pop()
            .expect("row present"))
    }

    async fn set_collection_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> Result<Collection, StoreError> {
        let row = sqlx::query_as::<_, Collection>(
            "UPDATE collections SET image = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("collection {} not found", id)))?;
        Ok(self
            .attach_association_ids(vec![row])
            .await?
            .pop()
            .expect("row present"))
    }

    async fn delete_collection(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("collection {} not found", id)));
        }
        Ok(())
    }

    async fn set_collection_tags(&self, id: i64, tag_ids: &[i64]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM collection_tags WHERE collection_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO collection_tags (collection_id, tag_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_collection_garments(
        &self,
        id: i64,
        garment_ids: &[i64],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM collection_garments WHERE collection_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for garment_id in garment_ids {
            sqlx::query(
                "INSERT INTO collection_garments (collection_id, garment_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(garment_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
