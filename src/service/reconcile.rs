use serde::Deserialize;

use crate::store::{EntityStore, StoreError};

/// Name-keyed reference to a tag or garment, as submitted inside a
/// collection payload
#[derive(Debug, Clone, Deserialize)]
pub struct AttrDescriptor {
    pub name: String,
}

/// Resolves tag descriptors to entity ids for one owner, in input order:
/// reuse the first existing `(owner, name)` match, create otherwise. Never
/// touches rows of another owner and never deletes anything; repeated names
/// in one request resolve to a single id.
pub async fn reconcile_tags(
    store: &dyn EntityStore,
    owner: i64,
    descriptors: &[AttrDescriptor],
) -> Result<Vec<i64>, StoreError> {
    let mut ids = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let tag = match store.find_tag(owner, &descriptor.name).await? {
            Some(existing) => existing,
            None => store.create_tag(owner, &descriptor.name).await?,
        };
        if !ids.contains(&tag.id) {
            ids.push(tag.id);
        }
    }
    Ok(ids)
}

/// Garment counterpart of [`reconcile_tags`]
pub async fn reconcile_garments(
    store: &dyn EntityStore,
    owner: i64,
    descriptors: &[AttrDescriptor],
) -> Result<Vec<i64>, StoreError> {
    let mut ids = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let garment = match store.find_garment(owner, &descriptor.name).await? {
            Some(existing) => existing,
            None => store.create_garment(owner, &descriptor.name).await?,
        };
        if !ids.contains(&garment.id) {
            ids.push(garment.id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn descriptors(names: &[&str]) -> Vec<AttrDescriptor> {
        names
            .iter()
            .map(|n| AttrDescriptor {
                name: n.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn creates_new_tags_for_fresh_owner() {
        let store = MemoryStore::new();
        let ids = reconcile_tags(&store, 1, &descriptors(&["Athletic", "Beachwear"]))
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.tags_for_owner(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reuses_existing_tag_by_owner_and_name() {
        let store = MemoryStore::new();
        let existing = store.create_tag(1, "Athletic").await.unwrap();
        let ids = reconcile_tags(&store, 1, &descriptors(&["Athletic"]))
            .await
            .unwrap();
        assert_eq!(ids, vec![existing.id]);
        assert_eq!(store.tags_for_owner(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn never_reuses_another_owners_tag() {
        let store = MemoryStore::new();
        let theirs = store.create_tag(1, "Athletic").await.unwrap();
        let ids = reconcile_tags(&store, 2, &descriptors(&["Athletic"]))
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], theirs.id);
        assert_eq!(store.tags_for_owner(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_descriptor_resolves_once() {
        let store = MemoryStore::new();
        let ids = reconcile_tags(&store, 1, &descriptors(&["Denim", "Denim"]))
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.tags_for_owner(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn garments_reconcile_independently_of_tags() {
        let store = MemoryStore::new();
        store.create_tag(1, "Jacket").await.unwrap();
        let ids = reconcile_garments(&store, 1, &descriptors(&["Jacket"]))
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.garments_for_owner(1).await.unwrap().len(), 1);
    }
}
