pub mod error;
pub mod sqlite_store;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use sqlite_store::SqliteStore;
pub use store::{MenuStore, UserStore};
