// ── Indexed resource collection ──
//
// Insertion-ordered storage keyed by id. Name lookups scan the values;
// catalogs hold a few hundred records at most, so a secondary name index
// would only add a second thing to keep in sync.

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::Resource;

/// Outcome of resolving a user-supplied identifier.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a, T> {
    Found(&'a T),
    NotFound,
    Ambiguous(Vec<&'a T>),
}

impl<'a, T: Resource> Lookup<'a, T> {
    /// Turn the lookup into a single match or a lookup error.
    pub fn into_result(self, identifier: &str) -> Result<&'a T, CoreError> {
        match self {
            Lookup::Found(item) => Ok(item),
            Lookup::NotFound => Err(CoreError::NotFound {
                kind: T::KIND,
                identifier: identifier.to_owned(),
            }),
            Lookup::Ambiguous(matches) => Err(CoreError::Ambiguous {
                kind: T::KIND,
                identifier: identifier.to_owned(),
                candidates: matches.iter().map(|m| m.label()).collect(),
            }),
        }
    }

    fn from_matches(mut matches: Vec<&'a T>) -> Self {
        match matches.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(matches.remove(0)),
            _ => Lookup::Ambiguous(matches),
        }
    }
}

/// All known records of one resource type, in server order.
#[derive(Debug, Clone)]
pub struct ResourceCollection<T> {
    by_id: IndexMap<i64, T>,
}

impl<T> Default for ResourceCollection<T> {
    fn default() -> Self {
        Self {
            by_id: IndexMap::new(),
        }
    }
}

impl<T: Resource> ResourceCollection<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let mut collection = Self::default();
        collection.replace(items);
        collection
    }

    /// Drop everything and load `items`.
    pub fn replace(&mut self, items: impl IntoIterator<Item = T>) {
        self.by_id = items.into_iter().map(|item| (item.id(), item)).collect();
    }

    /// Insert or overwrite one record. Returns `true` if the id was new.
    pub fn upsert(&mut self, item: T) -> bool {
        self.by_id.insert(item.id(), item).is_none()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.by_id.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolve an identifier: all digits means an id, anything else a
    /// case-insensitive substring of the name.
    pub fn find(&self, identifier: &str) -> Lookup<'_, T> {
        if let Some(id) = parse_id(identifier) {
            return self.get(id).map_or(Lookup::NotFound, Lookup::Found);
        }

        let needle = identifier.to_lowercase();
        Lookup::from_matches(
            self.iter()
                .filter(|item| item.name().to_lowercase().contains(&needle))
                .collect(),
        )
    }

    /// Like [`find`](Self::find), but an ambiguous substring match is
    /// narrowed to an exact case-insensitive name match when one exists.
    pub fn find_exact_fallback(&self, identifier: &str) -> Lookup<'_, T> {
        match self.find(identifier) {
            Lookup::Ambiguous(matches) => {
                let exact: Vec<&T> = matches
                    .iter()
                    .copied()
                    .filter(|item| item.name().eq_ignore_ascii_case(identifier))
                    .collect();
                if exact.len() == 1 {
                    Lookup::from_matches(exact)
                } else {
                    Lookup::Ambiguous(matches)
                }
            }
            other => other,
        }
    }
}

/// `Some(id)` if the identifier is purely numeric.
pub fn parse_id(identifier: &str) -> Option<i64> {
    if identifier.is_empty() || !identifier.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    identifier.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{Project, ResourceKind};

    fn projects(names: &[(i64, &str)]) -> ResourceCollection<Project> {
        ResourceCollection::new(
            names
                .iter()
                .map(|(id, name)| Project::from_value(json!({ "id": id, "name": name })).unwrap()),
        )
    }

    #[test]
    fn numeric_identifier_is_an_id() {
        let col = projects(&[(42, "api-core"), (7, "42-ops")]);
        assert!(matches!(col.find("42"), Lookup::Found(p) if p.name == "api-core"));
        assert_eq!(col.find("43"), Lookup::NotFound);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let col = projects(&[(1, "API-Core"), (2, "billing")]);
        assert!(matches!(col.find("core"), Lookup::Found(p) if p.id == 1));
        assert_eq!(col.find("nothing"), Lookup::NotFound);
    }

    #[test]
    fn ambiguous_match_lists_candidates() {
        let col = projects(&[(1, "api-core"), (2, "api-edge"), (3, "web")]);
        let err = col.find("api").into_result("api").unwrap_err();
        match err {
            CoreError::Ambiguous {
                kind, candidates, ..
            } => {
                assert_eq!(kind, ResourceKind::Projects);
                assert_eq!(candidates, vec!["api-core (1)", "api-edge (2)"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn exact_name_breaks_ambiguity() {
        let col = projects(&[(1, "api"), (2, "api-edge")]);
        assert!(matches!(col.find("api"), Lookup::Ambiguous(_)));
        assert!(matches!(col.find_exact_fallback("API"), Lookup::Found(p) if p.id == 1));

        let col = projects(&[(1, "api-core"), (2, "api-edge")]);
        assert!(matches!(col.find_exact_fallback("api"), Lookup::Ambiguous(m) if m.len() == 2));
    }

    #[test]
    fn replace_drops_stale_entries() {
        let mut col = projects(&[(1, "old"), (2, "kept")]);
        col.replace([Project::from_value(json!({ "id": 2, "name": "kept" })).unwrap()]);
        assert_eq!(col.len(), 1);
        assert!(col.get(1).is_none());
    }

    #[test]
    fn parse_id_requires_digits_only() {
        assert_eq!(parse_id("0042"), Some(42));
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("4a"), None);
        assert_eq!(parse_id(""), None);
    }
}
