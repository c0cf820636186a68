// casegen-store: per-user document persistence.

pub mod db;
pub mod documents;
pub mod error;
pub mod gateway;
pub mod paths;

pub use documents::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore};
pub use error::StoreError;
pub use gateway::{PersistenceGateway, SavedIssue};
