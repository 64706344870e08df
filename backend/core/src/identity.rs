use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Menu;

/// Account role. Admins bypass ownership checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Owner,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A restaurant registered to a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restaurant {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// A registered account. The password hash never leaves the store layer in
/// serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub restaurants: Vec<Restaurant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        restaurants: Vec<Restaurant>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::Owner,
            restaurants,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive lookup of a restaurant by name.
    pub fn owns_restaurant(&self, name: &str) -> bool {
        self.restaurants
            .iter()
            .any(|r| r.name.to_lowercase() == name.to_lowercase())
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            role: self.role,
            owned_restaurants: self.restaurants.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

/// The authenticated caller as seen by ownership checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub owned_restaurants: Vec<String>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns_restaurant(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.owned_restaurants
            .iter()
            .any(|owned| owned.to_lowercase() == wanted)
    }

    /// Admins may manage any restaurant; owners only their own.
    pub fn can_manage_restaurant(&self, name: &str) -> bool {
        self.is_admin() || self.owns_restaurant(name)
    }

    pub fn can_access_menu(&self, menu: &Menu) -> bool {
        self.is_admin() || menu.owner == self.user_id
    }
}
