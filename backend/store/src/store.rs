use async_trait::async_trait;
use uuid::Uuid;

use menuscan_core::{Menu, User};

use crate::error::StoreResult;

/// Document storage for menus, keyed by id.
#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn insert_menu(&self, menu: &Menu) -> StoreResult<()>;

    async fn get_menu(&self, id: Uuid) -> StoreResult<Option<Menu>>;

    /// All menus, or only those owned by `owner`, oldest first.
    async fn list_menus(&self, owner: Option<Uuid>) -> StoreResult<Vec<Menu>>;

    /// Replace a stored menu. Returns false when no menu has that id.
    async fn update_menu(&self, menu: &Menu) -> StoreResult<bool>;

    /// Remove a menu and return what was stored.
    async fn delete_menu(&self, id: Uuid) -> StoreResult<Option<Menu>>;
}

/// Account storage. Emails are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persist every mutable field of `user`. Returns false when it does not exist.
    async fn update_user(&self, user: &User) -> StoreResult<bool>;
}
