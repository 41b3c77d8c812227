pub mod error;

use std::collections::HashSet;

pub use error::FilterError;

use crate::store::models::Collection;

/// Parses a comma-separated id list query value ("1,5,12"). Every token must
/// be an integer; anything else is a caller error, not a server fault.
pub fn parse_id_list(param: &str, raw: &str) -> Result<Vec<i64>, FilterError> {
    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<i64>()
                .map_err(|_| FilterError::invalid(param, token.trim()))
        })
        .collect()
}

/// Parses the `assigned_only` query value (0 or 1, absent means off)
pub fn parse_assigned_only(raw: Option<&str>) -> Result<bool, FilterError> {
    match raw {
        None => Ok(false),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| FilterError::invalid("assigned_only", value.trim())),
    }
}

/// Narrows an owner's collections by optional tag-id and garment-id sets.
///
/// Each filter matches collections holding at least one of the given ids;
/// both filters compose with AND. Results are deduplicated by id and ordered
/// descending by id (most recently created first).
pub fn filter_collections(
    collections: Vec<Collection>,
    tag_ids: Option<&[i64]>,
    garment_ids: Option<&[i64]>,
) -> Vec<Collection> {
    let mut seen = HashSet::new();
    let mut result: Vec<Collection> = collections
        .into_iter()
        .filter(|c| match tag_ids {
            Some(wanted) => c.tag_ids.iter().any(|id| wanted.contains(id)),
            None => true,
        })
        .filter(|c| match garment_ids {
            Some(wanted) => c.garment_ids.iter().any(|id| wanted.contains(id)),
            None => true,
        })
        .filter(|c| seen.insert(c.id))
        .collect();
    result.sort_by(|a, b| b.id.cmp(&a.id));
    result
}

/// A named, id-carrying collection attribute (tag or garment)
pub trait Attr {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

impl Attr for crate::store::models::Tag {
    fn id(&self) -> i64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Attr for crate::store::models::Garment {
    fn id(&self) -> i64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Shared listing shape for tags and garments: optionally restrict to rows
/// attached to at least one collection, deduplicate, order descending by name.
pub fn filter_attrs<T: Attr>(attrs: Vec<T>, assigned: Option<&HashSet<i64>>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut result: Vec<T> = attrs
        .into_iter()
        .filter(|a| match assigned {
            Some(assigned) => assigned.contains(&a.id()),
            None => true,
        })
        .filter(|a| seen.insert(a.id()))
        .collect();
    result.sort_by(|a, b| b.name().cmp(a.name()).then(b.id().cmp(&a.id())));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::Tag;

    fn collection(id: i64, tag_ids: Vec<i64>, garment_ids: Vec<i64>) -> Collection {
        Collection {
            id,
            title: format!("c{}", id),
            description: String::new(),
            link: String::new(),
            image: None,
            user_id: 1,
            tag_ids,
            garment_ids,
        }
    }

    #[test]
    fn parses_id_lists() {
        assert_eq!(parse_id_list("tags", "1,5, 12").unwrap(), vec![1, 5, 12]);
        assert!(parse_id_list("tags", "1,abc").is_err());
        assert!(parse_id_list("tags", "").is_err());
    }

    #[test]
    fn parses_assigned_only() {
        assert!(!parse_assigned_only(None).unwrap());
        assert!(!parse_assigned_only(Some("0")).unwrap());
        assert!(parse_assigned_only(Some("1")).unwrap());
        assert!(parse_assigned_only(Some("yes")).is_err());
    }

    #[test]
    fn tag_filter_matches_any_listed_id() {
        let cols = vec![
            collection(1, vec![10], vec![]),
            collection(2, vec![11], vec![]),
            collection(3, vec![12], vec![]),
        ];
        let out = filter_collections(cols, Some(&[10, 11]), None);
        let ids: Vec<i64> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn both_filters_compose_with_and() {
        let cols = vec![
            collection(1, vec![10], vec![20]),
            collection(2, vec![10], vec![]),
            collection(3, vec![], vec![20]),
        ];
        let out = filter_collections(cols, Some(&[10]), Some(&[20]));
        let ids: Vec<i64> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn collection_with_multiple_matching_tags_appears_once() {
        let cols = vec![collection(1, vec![10, 11], vec![])];
        let out = filter_collections(cols, Some(&[10, 11]), None);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unfiltered_listing_orders_descending_by_id() {
        let cols = vec![
            collection(2, vec![], vec![]),
            collection(5, vec![], vec![]),
            collection(3, vec![], vec![]),
        ];
        let ids: Vec<i64> = filter_collections(cols, None, None)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![5, 3, 2]);
    }

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            user_id: 1,
        }
    }

    #[test]
    fn attrs_ordered_descending_by_name() {
        let out = filter_attrs(
            vec![tag(1, "Athletic"), tag(2, "Denim"), tag(3, "Casual")],
            None,
        );
        let names: Vec<&str> = out.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Denim", "Casual", "Athletic"]);
    }

    #[test]
    fn assigned_only_excludes_unattached_attrs() {
        let assigned: HashSet<i64> = [1].into_iter().collect();
        let out = filter_attrs(vec![tag(1, "Worn"), tag(2, "Idle")], Some(&assigned));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 1);
    }
}
