pub mod reconcile;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::filter;
use crate::media::MediaStore;
use crate::store::{Collection, CollectionFields, CollectionPatch, EntityStore, Garment, Tag};

use reconcile::AttrDescriptor;

/// Incoming collection fields. The owner never appears here: any owner value
/// in a request body is dropped by deserialization, never applied.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<AttrDescriptor>>,
    pub garments: Option<Vec<AttrDescriptor>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttrPayload {
    pub name: Option<String>,
}

/// Collection shape for list responses (no description)
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub garments: Vec<Garment>,
}

/// Collection shape for detail responses
#[derive(Debug, Serialize)]
pub struct CollectionDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub garments: Vec<Garment>,
}

/// CRUD service bound to one requesting user. Every read filters on the
/// owner and every write checks ownership first, so a caller holding this
/// capability can never see or touch another tenant's rows. Absent and
/// cross-owner ids both surface as the same `NotFound`.
pub struct Scoped {
    store: Arc<dyn EntityStore>,
    media: MediaStore,
    owner: i64,
}

impl Scoped {
    pub fn new(store: Arc<dyn EntityStore>, media: MediaStore, owner: i64) -> Self {
        Self {
            store,
            media,
            owner,
        }
    }

    // -- collections -------------------------------------------------------

    async fn owned_collection(&self, id: i64) -> Result<Collection, ApiError> {
        match self.store.collection_by_id(id).await? {
            Some(collection) if collection.user_id == self.owner => Ok(collection),
            _ => Err(ApiError::not_found("Collection not found")),
        }
    }

    async fn collection_detail(&self, collection: Collection) -> Result<CollectionDetail, ApiError> {
        let tags = self.store.tags_by_ids(&collection.tag_ids).await?;
        let garments = self.store.garments_by_ids(&collection.garment_ids).await?;
        Ok(CollectionDetail {
            id: collection.id,
            title: collection.title,
            description: collection.description,
            link: collection.link,
            image: collection.image,
            tags,
            garments,
        })
    }

    pub async fn list_collections(
        &self,
        tag_ids: Option<Vec<i64>>,
        garment_ids: Option<Vec<i64>>,
    ) -> Result<Vec<CollectionSummary>, ApiError> {
        let all = self.store.collections_for_owner(self.owner).await?;
        let filtered =
            filter::filter_collections(all, tag_ids.as_deref(), garment_ids.as_deref());

        let mut summaries = Vec::with_capacity(filtered.len());
        for collection in filtered {
            let tags = self.store.tags_by_ids(&collection.tag_ids).await?;
            let garments = self.store.garments_by_ids(&collection.garment_ids).await?;
            summaries.push(CollectionSummary {
                id: collection.id,
                title: collection.title,
                link: collection.link,
                image: collection.image,
                tags,
                garments,
            });
        }
        Ok(summaries)
    }

    pub async fn get_collection(&self, id: i64) -> Result<CollectionDetail, ApiError> {
        let collection = self.owned_collection(id).await?;
        self.collection_detail(collection).await
    }

    pub async fn create_collection(
        &self,
        payload: CollectionPayload,
    ) -> Result<CollectionDetail, ApiError> {
        let title = payload.title.ok_or_else(|| ApiError::missing_field("title"))?;
        let fields = CollectionFields {
            title,
            description: payload.description.unwrap_or_default(),
            link: payload.link.unwrap_or_default(),
        };
        let collection = self.store.create_collection(self.owner, &fields).await?;

        // Absent descriptor lists mean "no associations", not an error
        let tag_descriptors = payload.tags.unwrap_or_default();
        let tag_ids =
            reconcile::reconcile_tags(self.store.as_ref(), self.owner, &tag_descriptors).await?;
        self.store.set_collection_tags(collection.id, &tag_ids).await?;

        let garment_descriptors = payload.garments.unwrap_or_default();
        let garment_ids =
            reconcile::reconcile_garments(self.store.as_ref(), self.owner, &garment_descriptors)
                .await?;
        self.store
            .set_collection_garments(collection.id, &garment_ids)
            .await?;

        let collection = self.owned_collection(collection.id).await?;
        self.collection_detail(collection).await
    }

    /// Applies a full (`partial == false`) or partial update. Association
    /// sets are cleared and rebuilt independently, each only when its field
    /// is present in the payload; an absent field leaves that set untouched.
    pub async fn update_collection(
        &self,
        id: i64,
        payload: CollectionPayload,
        partial: bool,
    ) -> Result<CollectionDetail, ApiError> {
        let collection = self.owned_collection(id).await?;

        if !partial && payload.title.is_none() {
            return Err(ApiError::missing_field("title"));
        }

        let patch = CollectionPatch {
            title: payload.title,
            description: payload.description,
            link: payload.link,
        };
        self.store.update_collection(collection.id, &patch).await?;

        if let Some(descriptors) = payload.tags {
            let tag_ids =
                reconcile::reconcile_tags(self.store.as_ref(), self.owner, &descriptors).await?;
            self.store.set_collection_tags(collection.id, &tag_ids).await?;
        }
        if let Some(descriptors) = payload.garments {
            let garment_ids =
                reconcile::reconcile_garments(self.store.as_ref(), self.owner, &descriptors)
                    .await?;
            self.store
                .set_collection_garments(collection.id, &garment_ids)
                .await?;
        }

        let collection = self.owned_collection(collection.id).await?;
        self.collection_detail(collection).await
    }

    /// Deletes the collection and its stored image asset; associated tags
    /// and garments are detached, not deleted
    pub async fn delete_collection(&self, id: i64) -> Result<(), ApiError> {
        let collection = self.owned_collection(id).await?;
        if let Some(image) = &collection.image {
            self.media.remove(image);
        }
        self.store.delete_collection(collection.id).await?;
        Ok(())
    }

    pub async fn upload_collection_image(
        &self,
        id: i64,
        bytes: &[u8],
    ) -> Result<CollectionDetail, ApiError> {
        let collection = self.owned_collection(id).await?;
        let relative = self.media.save_image("collection", bytes)?;
        if let Some(old) = &collection.image {
            self.media.remove(old);
        }
        let updated = self
            .store
            .set_collection_image(collection.id, Some(&relative))
            .await?;
        self.collection_detail(updated).await
    }

    // -- tags --------------------------------------------------------------

    async fn owned_tag(&self, id: i64) -> Result<Tag, ApiError> {
        match self.store.tag_by_id(id).await? {
            Some(tag) if tag.user_id == self.owner => Ok(tag),
            _ => Err(ApiError::not_found("Tag not found")),
        }
    }

    pub async fn list_tags(&self, assigned_only: bool) -> Result<Vec<Tag>, ApiError> {
        let tags = self.store.tags_for_owner(self.owner).await?;
        let assigned = if assigned_only {
            Some(self.store.assigned_tag_ids().await?)
        } else {
            None
        };
        Ok(filter::filter_attrs(tags, assigned.as_ref()))
    }

    pub async fn get_tag(&self, id: i64) -> Result<Tag, ApiError> {
        self.owned_tag(id).await
    }

    pub async fn update_tag(&self, id: i64, payload: AttrPayload) -> Result<Tag, ApiError> {
        let tag = self.owned_tag(id).await?;
        match payload.name {
            Some(name) => Ok(self.store.update_tag_name(tag.id, &name).await?),
            None => Ok(tag),
        }
    }

    pub async fn delete_tag(&self, id: i64) -> Result<(), ApiError> {
        let tag = self.owned_tag(id).await?;
        self.store.delete_tag(tag.id).await?;
        Ok(())
    }

    // -- garments ----------------------------------------------------------

    async fn owned_garment(&self, id: i64) -> Result<Garment, ApiError> {
        match self.store.garment_by_id(id).await? {
            Some(garment) if garment.user_id == self.owner => Ok(garment),
            _ => Err(ApiError::not_found("Garment not found")),
        }
    }

    pub async fn list_garments(&self, assigned_only: bool) -> Result<Vec<Garment>, ApiError> {
        let garments = self.store.garments_for_owner(self.owner).await?;
        let assigned = if assigned_only {
            Some(self.store.assigned_garment_ids().await?)
        } else {
            None
        };
        Ok(filter::filter_attrs(garments, assigned.as_ref()))
    }

    pub async fn get_garment(&self, id: i64) -> Result<Garment, ApiError> {
        self.owned_garment(id).await
    }

    pub async fn update_garment(&self, id: i64, payload: AttrPayload) -> Result<Garment, ApiError> {
        let garment = self.owned_garment(id).await?;
        match payload.name {
            Some(name) => Ok(self.store.update_garment_name(garment.id, &name).await?),
            None => Ok(garment),
        }
    }

    pub async fn delete_garment(&self, id: i64) -> Result<(), ApiError> {
        let garment = self.owned_garment(id).await?;
        if let Some(image) = &garment.image {
            self.media.remove(image);
        }
        self.store.delete_garment(garment.id).await?;
        Ok(())
    }

    pub async fn upload_garment_image(&self, id: i64, bytes: &[u8]) -> Result<Garment, ApiError> {
        let garment = self.owned_garment(id).await?;
        let relative = self.media.save_image("garment", bytes)?;
        if let Some(old) = &garment.image {
            self.media.remove(old);
        }
        Ok(self
            .store
            .set_garment_image(garment.id, Some(&relative))
            .await?)
    }
}
