use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// Identifier of a menu item, unique within its category.
///
/// The vision model is asked for numbers but any truthy JSON value is accepted,
/// so strings and other shapes are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// A single dish on the menu.
///
/// Optional fields are typed only when the model sent the expected JSON type.
/// Anything else, including unknown keys, stays in `extra` so the item
/// serializes back to what was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ItemDocument")]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    pub price: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_vegetarian: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuItem {
    /// Build an item from its required fields and the remaining keys of the
    /// JSON object.
    pub fn from_parts(id: ItemId, name: String, price: Number, mut rest: Map<String, Value>) -> Self {
        let description = take_typed(&mut rest, "description", |v| v.as_str().map(str::to_string));
        let is_vegetarian = take_typed(&mut rest, "is_vegetarian", Value::as_bool);
        let image_url = take_typed(&mut rest, "image_url", |v| v.as_str().map(str::to_string));
        Self {
            id,
            name,
            price,
            description,
            is_vegetarian,
            image_url,
            extra: rest,
        }
    }
}

/// Remove `key` from `rest` only when `convert` accepts its value.
fn take_typed<T>(
    rest: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let typed = rest.get(key).and_then(convert)?;
    rest.remove(key);
    Some(typed)
}

#[derive(Deserialize)]
struct ItemDocument {
    id: ItemId,
    name: String,
    price: Number,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<ItemDocument> for MenuItem {
    fn from(doc: ItemDocument) -> Self {
        Self::from_parts(doc.id, doc.name, doc.price, doc.rest)
    }
}

/// A named group of items ("Appetizers", "Mains", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub category: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuCategory {
    pub fn new(category: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            category: category.into(),
            items,
            extra: Map::new(),
        }
    }
}

/// Output of the extraction pipeline: a checked, structured menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMenu {
    pub restaurant_name: String,
    pub menu: Vec<MenuCategory>,
}

impl ExtractedMenu {
    pub fn item_count(&self) -> usize {
        self.menu.iter().map(|c| c.items.len()).sum()
    }
}

/// An extracted menu after caller overrides were applied, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalMenu {
    pub restaurant_name: String,
    pub menu: Vec<MenuCategory>,
    pub owner: Uuid,
}

/// A stored menu document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: Uuid,
    pub restaurant_name: String,
    pub menu: Vec<MenuCategory>,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    /// Build a new document from a reconciled menu, stamping both timestamps.
    pub fn create(final_menu: FinalMenu) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            restaurant_name: final_menu.restaurant_name,
            menu: final_menu.menu,
            owner: final_menu.owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Swap in a re-extracted menu, keeping id and creation time.
    pub fn replace_with(&mut self, final_menu: FinalMenu) {
        self.restaurant_name = final_menu.restaurant_name;
        self.menu = final_menu.menu;
        self.owner = final_menu.owner;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
