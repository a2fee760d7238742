// ash-core: Resource model, local state, and typed controller operations
// between ash-api and the shell.

pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod launch;
pub mod model;
pub mod platform;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{PlatformConfig, TlsVerification};
pub use context::Context;
pub use error::CoreError;
pub use filters::ListRequest;
pub use launch::{LaunchParam, LaunchPayload, ParamKind};
pub use platform::Platform;
pub use store::{Cache, Catalog, Cataloged, Lookup, ResourceCollection};

pub use model::{
    Group, Host, Inventory, Job, JobStatus, JobTemplate, Project, QuestionKind, Resource,
    ResourceKind, SurveyQuestion,
};
