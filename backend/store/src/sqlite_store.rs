/// SQLite-backed document store.
///
/// Menus keep their category tree as a JSON column; users keep their
/// restaurant list the same way. One connection behind an async mutex.
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use menuscan_core::{Menu, User};

use crate::error::{StoreError, StoreResult};
use crate::store::{MenuStore, UserStore};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS menus (
        id              TEXT PRIMARY KEY,
        restaurant_name TEXT NOT NULL,
        owner           TEXT NOT NULL,
        menu_json       TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_menus_owner ON menus(owner);
    CREATE TABLE IF NOT EXISTS users (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        email            TEXT NOT NULL UNIQUE,
        password_hash    TEXT NOT NULL,
        role             TEXT NOT NULL,
        restaurants_json TEXT NOT NULL,
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL
    );";

const MENU_COLUMNS: &str = "id, restaurant_name, owner, menu_json, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, restaurants_json, created_at, updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL mode")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize menuscan schema")?;
        info!(path = %path.as_ref().display(), "Menu store opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

/// Raw column values, decoded outside the rusqlite row callback.
struct MenuRow {
    id: String,
    restaurant_name: String,
    owner: String,
    menu_json: String,
    created_at: String,
    updated_at: String,
}

impl MenuRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            restaurant_name: row.get(1)?,
            owner: row.get(2)?,
            menu_json: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn decode(self) -> StoreResult<Menu> {
        Ok(Menu {
            id: parse_uuid(&self.id, &self.id)?,
            restaurant_name: self.restaurant_name,
            owner: parse_uuid(&self.id, &self.owner)?,
            menu: serde_json::from_str(&self.menu_json)?,
            created_at: parse_time(&self.id, &self.created_at)?,
            updated_at: parse_time(&self.id, &self.updated_at)?,
        })
    }
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    restaurants_json: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get(4)?,
            restaurants_json: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn decode(self) -> StoreResult<User> {
        let role = self.role.parse().map_err(|reason| StoreError::Corrupt {
            id: self.id.clone(),
            reason,
        })?;
        Ok(User {
            id: parse_uuid(&self.id, &self.id)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            restaurants: serde_json::from_str(&self.restaurants_json)?,
            created_at: parse_time(&self.id, &self.created_at)?,
            updated_at: parse_time(&self.id, &self.updated_at)?,
        })
    }
}

fn parse_uuid(record: &str, raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt {
        id: record.to_string(),
        reason: e.to_string(),
    })
}

fn parse_time(record: &str, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            id: record.to_string(),
            reason: e.to_string(),
        })
}

fn map_unique_email(error: rusqlite::Error, email: &str) -> StoreError {
    match &error {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::DuplicateEmail(email.to_string())
        }
        _ => StoreError::Database(error),
    }
}

#[async_trait]
impl MenuStore for SqliteStore {
    async fn insert_menu(&self, menu: &Menu) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO menus (id, restaurant_name, owner, menu_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                menu.id.to_string(),
                menu.restaurant_name,
                menu.owner.to_string(),
                serde_json::to_string(&menu.menu)?,
                menu.created_at.to_rfc3339(),
                menu.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(menu_id = %menu.id, "Menu inserted");
        Ok(())
    }

    async fn get_menu(&self, id: Uuid) -> StoreResult<Option<Menu>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {MENU_COLUMNS} FROM menus WHERE id = ?1"),
                params![id.to_string()],
                MenuRow::read,
            )
            .optional()?;
        row.map(MenuRow::decode).transpose()
    }

    async fn list_menus(&self, owner: Option<Uuid>) -> StoreResult<Vec<Menu>> {
        let conn = self.conn.lock().await;
        let rows = match owner {
            Some(owner) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MENU_COLUMNS} FROM menus WHERE owner = ?1 ORDER BY created_at ASC"
                ))?;
                let rows = stmt
                    .query_map(params![owner.to_string()], MenuRow::read)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MENU_COLUMNS} FROM menus ORDER BY created_at ASC"
                ))?;
                let rows = stmt
                    .query_map([], MenuRow::read)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        rows.into_iter().map(MenuRow::decode).collect()
    }

    async fn update_menu(&self, menu: &Menu) -> StoreResult<bool> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE menus SET restaurant_name = ?2, owner = ?3, menu_json = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                menu.id.to_string(),
                menu.restaurant_name,
                menu.owner.to_string(),
                serde_json::to_string(&menu.menu)?,
                menu.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    async fn delete_menu(&self, id: Uuid) -> StoreResult<Option<Menu>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {MENU_COLUMNS} FROM menus WHERE id = ?1"),
                params![id.to_string()],
                MenuRow::read,
            )
            .optional()?;
        let Some(row) = row else { return Ok(None) };
        conn.execute("DELETE FROM menus WHERE id = ?1", params![id.to_string()])?;
        row.decode().map(Some)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, role, restaurants_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.role.to_string(),
                serde_json::to_string(&user.restaurants)?,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| map_unique_email(e, &user.email))?;
        debug!(user_id = %user.id, "User inserted");
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                UserRow::read,
            )
            .optional()?;
        row.map(UserRow::decode).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                UserRow::read,
            )
            .optional()?;
        row.map(UserRow::decode).transpose()
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "UPDATE users SET name = ?2, email = ?3, password_hash = ?4, role = ?5,
                 restaurants_json = ?6, updated_at = ?7 WHERE id = ?1",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role.to_string(),
                    serde_json::to_string(&user.restaurants)?,
                    user.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| map_unique_email(e, &user.email))?;
        Ok(changed > 0)
    }
}
