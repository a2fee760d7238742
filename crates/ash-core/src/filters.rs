// ── Listing filters ──
//
// Each listing accepts `key:value` filters from a fixed vocabulary plus
// bare search words. Keys are translated to controller lookups here so the
// query engine stays filter-agnostic.

use ash_api::CollectionQuery;
use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::ResourceKind;

/// One `key:value` filter a listing accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterKey {
    pub key: &'static str,
    /// Controller lookup the value is sent under.
    pub lookup: &'static str,
}

const fn key(key: &'static str, lookup: &'static str) -> FilterKey {
    FilterKey { key, lookup }
}

const CREATED_BY: FilterKey = key("created_by", "created_by__username__icontains");
const MODIFIED_BY: FilterKey = key("modified_by", "modified_by__username__icontains");
const LABELS: FilterKey = key("labels", "labels__name__icontains");
const INVENTORY: FilterKey = key("inventory", "inventory__name__icontains");
const PROJECT: FilterKey = key("project", "project__name__icontains");
const ORGANIZATION: FilterKey = key("organization", "organization__name__icontains");
const PLAYBOOK: FilterKey = key("playbook", "playbook__icontains");
const HOSTS: FilterKey = key("hosts", "hosts__name__icontains");
const JOB_TEMPLATES: FilterKey = key("job_templates", "job_templates__name__icontains");

/// Not a lookup: caps the number of jobs returned.
pub const RESULT_LIMIT: &str = "result_limit";

/// Free-text search parameter for bare words.
pub const SEARCH: &str = "search";

/// Filters accepted by `ls <kind>`.
pub fn vocabulary(kind: ResourceKind) -> &'static [FilterKey] {
    match kind {
        ResourceKind::JobTemplates => &[
            CREATED_BY,
            MODIFIED_BY,
            LABELS,
            INVENTORY,
            PROJECT,
            ORGANIZATION,
            PLAYBOOK,
        ],
        ResourceKind::Jobs => &[CREATED_BY, LABELS, INVENTORY, PROJECT, ORGANIZATION],
        ResourceKind::Projects => &[CREATED_BY, MODIFIED_BY, ORGANIZATION],
        ResourceKind::Inventories => &[
            CREATED_BY,
            MODIFIED_BY,
            HOSTS,
            JOB_TEMPLATES,
            ORGANIZATION,
        ],
        ResourceKind::Hosts | ResourceKind::Groups => &[],
    }
}

/// Parsed `ls` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub filters: IndexMap<String, Vec<String>>,
    pub result_limit: Option<usize>,
}

impl ListRequest {
    /// Parse `key:value` filters and bare search words for `kind`.
    pub fn parse<S: AsRef<str>>(kind: ResourceKind, tokens: &[S]) -> Result<Self, CoreError> {
        let vocabulary = vocabulary(kind);
        let mut request = Self::default();

        for token in tokens {
            let token = token.as_ref();
            let Some((name, value)) = token.split_once(':') else {
                request.push(SEARCH, token);
                continue;
            };

            if name == RESULT_LIMIT && kind == ResourceKind::Jobs {
                let limit = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        CoreError::validation(format!(
                            "result_limit must be a positive integer, got '{value}'"
                        ))
                    })?;
                request.result_limit = Some(limit);
                continue;
            }

            let filter = vocabulary.iter().find(|f| f.key == name).ok_or_else(|| {
                let known: Vec<&str> = vocabulary.iter().map(|f| f.key).collect();
                CoreError::validation(format!(
                    "unknown filter '{name}' for {}; expected one of: {}",
                    kind.collection(),
                    known.join(", ")
                ))
            })?;
            request.push(filter.lookup, value);
        }

        Ok(request)
    }

    /// No filters and no explicit limit: the catalog can answer.
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty() && self.result_limit.is_none()
    }

    /// Build the collection query for `kind`.
    pub fn query(&self, kind: ResourceKind, default_limit: usize) -> CollectionQuery {
        let query = CollectionQuery::new(kind.collection()).filters(self.filters.clone());
        if kind == ResourceKind::Jobs {
            query
                .limit(self.result_limit.unwrap_or(default_limit))
                .order_by("-finished")
        } else {
            query
        }
    }

    fn push(&mut self, lookup: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        self.filters
            .entry(lookup.to_owned())
            .or_default()
            .push(value.to_owned());
    }
}
