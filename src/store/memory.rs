use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::store::models::{Collection, CollectionFields, CollectionPatch, Garment, Tag, User};
use crate::store::{EntityStore, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    tags: HashMap<i64, Tag>,
    garments: HashMap<i64, Garment>,
    collections: HashMap<i64, Collection>,
    next_user_id: i64,
    next_tag_id: i64,
    next_garment_id: i64,
    next_collection_id: i64,
}

/// In-memory entity store. Backs tests and `serve --backend memory`; rows
/// live in HashMaps behind a single RwLock, ids count up from 1 per kind.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(kind: &str, id: i64) -> StoreError {
    StoreError::NotFound(format!("{} {} not found", kind, id))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!(
                "user with email {} already exists",
                email
            )));
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_staff: false,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_tag(&self, owner: i64, name: &str) -> Result<Tag, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_tag_id += 1;
        let tag = Tag {
            id: inner.next_tag_id,
            name: name.to_string(),
            user_id: owner,
        };
        inner.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn tag_by_id(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        Ok(self.inner.read().await.tags.get(&id).cloned())
    }

    async fn tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.tags.get(id).cloned()).collect())
    }

    async fn find_tag(&self, owner: i64, name: &str) -> Result<Option<Tag>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Tag> = inner
            .tags
            .values()
            .filter(|t| t.user_id == owner && t.name == name)
            .collect();
        // Duplicates are possible; first-match means lowest id
        matching.sort_by_key(|t| t.id);
        Ok(matching.first().map(|t| (*t).clone()))
    }

    async fn tags_for_owner(&self, owner: i64) -> Result<Vec<Tag>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tags
            .values()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect())
    }

    async fn update_tag_name(&self, id: i64, name: &str) -> Result<Tag, StoreError> {
        let mut inner = self.inner.write().await;
        let tag = inner.tags.get_mut(&id).ok_or_else(|| not_found("tag", id))?;
        tag.name = name.to_string();
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.tags.remove(&id).ok_or_else(|| not_found("tag", id))?;
        for collection in inner.collections.values_mut() {
            collection.tag_ids.retain(|tid| *tid != id);
        }
        Ok(())
    }

    async fn assigned_tag_ids(&self) -> Result<HashSet<i64>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .values()
            .flat_map(|c| c.tag_ids.iter().copied())
            .collect())
    }

    async fn create_garment(&self, owner: i64, name: &str) -> Result<Garment, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_garment_id += 1;
        let garment = Garment {
            id: inner.next_garment_id,
            name: name.to_string(),
            image: None,
            user_id: owner,
        };
        inner.garments.insert(garment.id, garment.clone());
        Ok(garment)
    }

    async fn garment_by_id(&self, id: i64) -> Result<Option<Garment>, StoreError> {
        Ok(self.inner.read().await.garments.get(&id).cloned())
    }

    async fn garments_by_ids(&self, ids: &[i64]) -> Result<Vec<Garment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.garments.get(id).cloned())
            .collect())
    }

    async fn find_garment(&self, owner: i64, name: &str) -> Result<Option<Garment>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Garment> = inner
            .garments
            .values()
            .filter(|g| g.user_id == owner && g.name == name)
            .collect();
        matching.sort_by_key(|g| g.id);
        Ok(matching.first().map(|g| (*g).clone()))
    }

    async fn garments_for_owner(&self, owner: i64) -> Result<Vec<Garment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .garments
            .values()
            .filter(|g| g.user_id == owner)
            .cloned()
            .collect())
    }

    async fn update_garment_name(&self, id: i64, name: &str) -> Result<Garment, StoreError> {
        let mut inner = self.inner.write().await;
        let garment = inner
            .garments
            .get_mut(&id)
            .ok_or_else(|| not_found("garment", id))?;
        garment.name = name.to_string();
        Ok(garment.clone())
    }

    async fn set_garment_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> Result<Garment, StoreError> {
        let mut inner = self.inner.write().await;
        let garment = inner
            .garments
            .get_mut(&id)
            .ok_or_else(|| not_found("garment", id))?;
        garment.image = image.map(str::to_string);
        Ok(garment.clone())
    }

    async fn delete_garment(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .garments
            .remove(&id)
            .ok_or_else(|| not_found("garment", id))?;
        for collection in inner.collections.values_mut() {
            collection.garment_ids.retain(|gid| *gid != id);
        }
        Ok(())
    }

    async fn assigned_garment_ids(&self) -> Result<HashSet<i64>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .values()
            .flat_map(|c| c.garment_ids.iter().copied())
            .collect())
    }

    async fn create_collection(
        &self,
        owner: i64,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_collection_id += 1;
        let collection = Collection {
            id: inner.next_collection_id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            link: fields.link.clone(),
            image: None,
            user_id: owner,
            tag_ids: Vec::new(),
            garment_ids: Vec::new(),
        };
        inner.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn collection_by_id(&self, id: i64) -> Result<Option<Collection>, StoreError> {
        Ok(self.inner.read().await.collections.get(&id).cloned())
    }

    async fn collections_for_owner(&self, owner: i64) -> Result<Vec<Collection>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect())
    }

    async fn update_collection(
        &self,
        id: i64,
        patch: &CollectionPatch,
    ) -> Result<Collection, StoreError> {
        let mut inner = self.inner.write().await;
        let collection = inner
            .collections
            .get_mut(&id)
            .ok_or_else(|| not_found("collection", id))?;
        if let Some(title) = &patch.title {
            collection.title = title.clone();
        }
        if let Some(description) = &patch.description {
            collection.description = description.clone();
        }
        if let Some(link) = &patch.link {
            collection.link = link.clone();
        }
        Ok(collection.clone())
    }

    async fn set_collection_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> Result<Collection, StoreError> {
        let mut inner = self.inner.write().await;
        let collection = inner
            .collections
            .get_mut(&id)
            .ok_or_else(|| not_found("collection", id))?;
        collection.image = image.map(str::to_string);
        Ok(collection.clone())
    }

    async fn delete_collection(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .collections
            .remove(&id)
            .ok_or_else(|| not_found("collection", id))?;
        Ok(())
    }

    async fn set_collection_tags(&self, id: i64, tag_ids: &[i64]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let collection = inner
            .collections
            .get_mut(&id)
            .ok_or_else(|| not_found("collection", id))?;
        collection.tag_ids = tag_ids.to_vec();
        Ok(())
    }

    async fn set_collection_garments(
        &self,
        id: i64,
        garment_ids: &[i64],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let collection = inner
            .collections
            .get_mut(&id)
            .ok_or_else(|| not_found("collection", id))?;
        collection.garment_ids = garment_ids.to_vec();
        Ok(())
    }
}
