// ── Local state ──
//
// `Catalog` is the in-memory index the shell resolves names against;
// `Cache` persists the same records to SQLite between sessions.

pub mod cache;
pub mod catalog;
pub mod collection;

pub use cache::Cache;
pub use catalog::{Catalog, Cataloged};
pub use collection::{Lookup, ResourceCollection, parse_id};
