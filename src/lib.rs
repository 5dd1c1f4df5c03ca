pub mod api;
pub mod catalog;
pub mod config;
pub mod handler;
pub mod observability;
pub mod server;
pub mod storage;

pub use api::ApiHandler;
pub use handler::BaseHandler;
pub use storage::sas::{SharedKeyCredential, UrlSigner};
pub use storage::{BlobStore, ObjectMetadata};
