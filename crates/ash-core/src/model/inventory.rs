// ── Inventories, hosts, and groups ──

use serde::Deserialize;
use serde_json::Value;

use super::common::{Resource, decode, null_as_default, related_name, show_ref};
use super::ResourceKind;
use crate::error::CoreError;

const INVENTORY_UI: &str = "execution/infrastructure/inventories/inventory";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Inventory {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Empty for regular inventories, `smart` or `constructed` otherwise.
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default)]
    pub organization: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_hosts: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_groups: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts_with_active_failures: u64,
    #[serde(skip)]
    data: Value,
}

impl Resource for Inventory {
    const KIND: ResourceKind = ResourceKind::Inventories;

    fn from_value(data: Value) -> Result<Self, CoreError> {
        let mut inventory: Self = decode(Self::KIND, &data)?;
        inventory.data = data;
        Ok(inventory)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> &Value {
        &self.data
    }

    fn ui_path(&self) -> String {
        format!("{INVENTORY_UI}/{}/details", self.id)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            (
                "kind",
                if self.kind.is_empty() {
                    "regular".into()
                } else {
                    self.kind.clone()
                },
            ),
            (
                "organization",
                related_name(&self.data, "organization")
                    .unwrap_or_else(|| show_ref(self.organization)),
            ),
            ("hosts", self.total_hosts.to_string()),
            ("groups", self.total_groups.to_string()),
            ("failed hosts", self.hosts_with_active_failures.to_string()),
        ]
    }
}

// ── Host ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Host {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Parent inventory.
    pub inventory: i64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_active_failures: bool,
    #[serde(skip)]
    data: Value,
}

fn enabled_by_default() -> bool {
    true
}

impl Resource for Host {
    const KIND: ResourceKind = ResourceKind::Hosts;

    fn from_value(data: Value) -> Result<Self, CoreError> {
        let mut host: Self = decode(Self::KIND, &data)?;
        host.data = data;
        Ok(host)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> &Value {
        &self.data
    }

    fn ui_path(&self) -> String {
        format!("{INVENTORY_UI}/{}/hosts/{}/details", self.inventory, self.id)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("inventory", self.inventory.to_string()),
            ("enabled", self.enabled.to_string()),
            ("failed", self.has_active_failures.to_string()),
        ]
    }
}

// ── Group ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub inventory: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_hosts: u64,
    #[serde(skip)]
    data: Value,
}

impl Resource for Group {
    const KIND: ResourceKind = ResourceKind::Groups;

    fn from_value(data: Value) -> Result<Self, CoreError> {
        let mut group: Self = decode(Self::KIND, &data)?;
        group.data = data;
        Ok(group)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> &Value {
        &self.data
    }

    fn ui_path(&self) -> String {
        format!("{INVENTORY_UI}/{}/groups/{}/details", self.inventory, self.id)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("inventory", self.inventory.to_string()),
            ("hosts", self.total_hosts.to_string()),
        ]
    }
}
