// ash-api: Async Rust client for the automation controller REST API.
//
// Transport (bearer auth, TLS, timeouts), buffered responses, and the
// paginated collection query engine. Resource typing lives in ash-core.

pub mod client;
pub mod error;
pub mod query;
pub mod response;
pub mod transport;

pub use client::{ApiClient, DEFAULT_API_PATH};
pub use error::Error;
pub use query::{CollectionQuery, MAX_PAGE_SIZE, Page};
pub use response::ApiResponse;
pub use transport::{TlsMode, TransportConfig};

pub use reqwest::StatusCode;
