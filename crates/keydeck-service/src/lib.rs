mod blocking;
mod http;
mod keys;
mod local;
mod traits;

pub use blocking::BlockingKeyList;
pub use http::HttpStore;
pub use keys::{messages, KeyList, NoticeKind, Notifier};
pub use local::LocalStore;
pub use traits::{KeyStore, ServiceError};
