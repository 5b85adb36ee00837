pub mod api_key;
pub mod error;
pub mod validation;

pub use api_key::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};
pub use error::KeydeckError;
pub use validation::ValidationError;

/// Placeholder owner for every record until real accounts exist.
pub const STATIC_USER_ID: &str = "dev-local";
