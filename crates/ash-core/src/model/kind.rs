// ── Resource kinds ──

use std::fmt;

use strum::{EnumIter, EnumString, IntoStaticStr};

/// The resource types the shell knows about.
///
/// The string form (`job_templates`, `inventories`, ...) is the controller
/// collection name, which doubles as the `ls` argument and the cache table
/// name. `Display` renders the singular noun for messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Inventories,
    Projects,
    JobTemplates,
    Jobs,
    Hosts,
    Groups,
}

impl ResourceKind {
    /// Kinds mirrored into the local cache and the in-memory catalog.
    pub const CACHED: [ResourceKind; 3] = [Self::JobTemplates, Self::Projects, Self::Inventories];

    /// Collection name under the API root, e.g. `job_templates`.
    pub fn collection(self) -> &'static str {
        self.into()
    }

    /// Collection endpoint relative to the API root, e.g. `job_templates/`.
    pub fn endpoint(self) -> String {
        format!("{}/", self.collection())
    }

    /// Detail endpoint for one record, e.g. `jobs/42/`.
    pub fn detail_endpoint(self, id: i64) -> String {
        format!("{}/{id}/", self.collection())
    }

    /// Singular keyword used by `cd`, e.g. `job_template`.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Inventories => "inventory",
            Self::Projects => "project",
            Self::JobTemplates => "job_template",
            Self::Jobs => "job",
            Self::Hosts => "host",
            Self::Groups => "group",
        }
    }

    /// Parse a singular `cd` keyword.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "inventory" => Some(Self::Inventories),
            "project" => Some(Self::Projects),
            "job_template" => Some(Self::JobTemplates),
            "job" => Some(Self::Jobs),
            _ => None,
        }
    }

    pub fn is_cached(self) -> bool {
        Self::CACHED.contains(&self)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self {
            Self::Inventories => "inventory",
            Self::Projects => "project",
            Self::JobTemplates => "job template",
            Self::Jobs => "job",
            Self::Hosts => "host",
            Self::Groups => "group",
        };
        f.write_str(noun)
    }
}
