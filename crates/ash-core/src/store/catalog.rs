// ── In-memory catalog ──
//
// The three cached resource types, indexed for `cd` and `ls`. Loaded from
// the local cache at startup and rebuilt wholesale by the `cache` command.

use crate::model::{Inventory, JobTemplate, Project, Resource, ResourceKind};

use super::collection::ResourceCollection;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub job_templates: ResourceCollection<JobTemplate>,
    pub projects: ResourceCollection<Project>,
    pub inventories: ResourceCollection<Inventory>,
}

impl Catalog {
    /// Number of records held for a cached kind; `0` for anything else.
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::JobTemplates => self.job_templates.len(),
            ResourceKind::Projects => self.projects.len(),
            ResourceKind::Inventories => self.inventories.len(),
            ResourceKind::Jobs | ResourceKind::Hosts | ResourceKind::Groups => 0,
        }
    }
}

/// Catalog access by resource type, so callers can stay generic.
pub trait Cataloged: Resource {
    fn collection(catalog: &Catalog) -> &ResourceCollection<Self>;
    fn collection_mut(catalog: &mut Catalog) -> &mut ResourceCollection<Self>;
}

impl Cataloged for JobTemplate {
    fn collection(catalog: &Catalog) -> &ResourceCollection<Self> {
        &catalog.job_templates
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut ResourceCollection<Self> {
        &mut catalog.job_templates
    }
}

impl Cataloged for Project {
    fn collection(catalog: &Catalog) -> &ResourceCollection<Self> {
        &catalog.projects
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut ResourceCollection<Self> {
        &mut catalog.projects
    }
}

impl Cataloged for Inventory {
    fn collection(catalog: &Catalog) -> &ResourceCollection<Self> {
        &catalog.inventories
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut ResourceCollection<Self> {
        &mut catalog.inventories
    }
}
