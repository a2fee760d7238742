// ── Common resource behaviour ──

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

use super::ResourceKind;
use crate::error::CoreError;

/// A controller record with an identity, a raw JSON body, and a place in
/// both the API and the web UI.
pub trait Resource: Clone + Sized {
    const KIND: ResourceKind;

    /// Decode a raw API record. Fails only if identifying fields are missing
    /// or mistyped; unknown keys are ignored.
    fn from_value(data: Value) -> Result<Self, CoreError>;

    fn id(&self) -> i64;

    fn name(&self) -> &str;

    /// The record exactly as the controller returned it.
    fn data(&self) -> &Value;

    /// Detail endpoint relative to the API root.
    fn uri(&self) -> String {
        Self::KIND.detail_endpoint(self.id())
    }

    /// Web UI path relative to the platform root.
    fn ui_path(&self) -> String;

    /// Deep link into the web UI. `base` must end with `/`.
    fn absolute_url(&self, base: &Url) -> String {
        format!("{base}{}", self.ui_path())
    }

    /// Key fields for `info`, in display order.
    fn summary(&self) -> Vec<(&'static str, String)>;

    /// `name (id)`, used when listing ambiguous matches.
    fn label(&self) -> String {
        format!("{} ({})", self.name(), self.id())
    }
}

/// Decode a typed view of `data`, tagging failures with the resource kind.
pub(crate) fn decode<T: DeserializeOwned>(kind: ResourceKind, data: &Value) -> Result<T, CoreError> {
    T::deserialize(data).map_err(|e| CoreError::Model {
        kind,
        message: e.to_string(),
    })
}

/// The controller sends `null` for many unset fields; treat it as the
/// type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Render an optional id reference for display.
pub(crate) fn show_ref(id: Option<i64>) -> String {
    id.map_or_else(|| "-".into(), |id| id.to_string())
}

/// Name of a related object from `summary_fields.<field>.name`, if present.
pub(crate) fn related_name(data: &Value, field: &str) -> Option<String> {
    data.get("summary_fields")?
        .get(field)?
        .get("name")?
        .as_str()
        .map(str::to_owned)
}
