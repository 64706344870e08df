//! `menuscan promote-admin <email>`

use anyhow::{bail, Context, Result};
use chrono::Utc;

use menuscan_config::ServiceConfig;
use menuscan_core::{Role, User};
use menuscan_security::normalize_email;
use menuscan_store::{SqliteStore, UserStore};

pub async fn run(config: &ServiceConfig, email: &str) -> Result<()> {
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let user = promote(&store, email).await?;
    println!("{} <{}> is now an admin", user.name, user.email);
    Ok(())
}

/// Set the admin role on the account registered under `email`.
pub async fn promote(store: &dyn UserStore, email: &str) -> Result<User> {
    let email = normalize_email(email);
    let Some(mut user) = store.find_user_by_email(&email).await? else {
        bail!("no user registered with email {email}");
    };
    if user.role == Role::Admin {
        return Ok(user);
    }
    user.role = Role::Admin;
    user.updated_at = Utc::now();
    if !store.update_user(&user).await? {
        bail!("user {email} disappeared during update");
    }
    tracing::info!(user_id = %user.id, "User promoted to admin");
    Ok(user)
}
