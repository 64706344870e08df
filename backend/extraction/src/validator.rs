//! Shape checks for menus read by the vision model.
//!
//! Checks run in a fixed order and stop at the first violation. Nothing is
//! coerced: a price of `"12.50"` is rejected, not parsed.

use serde_json::Value;

use menuscan_core::{ExtractedMenu, ItemId, MenuCategory, MenuItem, ValidationError};

/// Validate a parsed candidate and convert it into a typed menu.
pub fn validate(candidate: &Value) -> Result<ExtractedMenu, ValidationError> {
    let restaurant_name = match candidate.get("restaurant_name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(ValidationError::MissingRestaurantName),
    };
    let menu = validate_categories(candidate.get("menu").unwrap_or(&Value::Null))?;
    Ok(ExtractedMenu {
        restaurant_name,
        menu,
    })
}

/// Validate a `menu` array on its own. Also used for manual menu edits.
pub fn validate_categories(menu: &Value) -> Result<Vec<MenuCategory>, ValidationError> {
    let categories = menu.as_array().ok_or(ValidationError::MenuNotArray)?;
    categories
        .iter()
        .enumerate()
        .map(|(index, category)| validate_category(index, category))
        .collect()
}

fn validate_category(index: usize, category: &Value) -> Result<MenuCategory, ValidationError> {
    let name = match category.get("category") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(ValidationError::CategoryMissingName { category: index }),
    };
    let items = category
        .get("items")
        .and_then(Value::as_array)
        .ok_or(ValidationError::ItemsNotArray { category: index })?;

    let items = items
        .iter()
        .enumerate()
        .map(|(item_index, item)| validate_item(index, item_index, item))
        .collect::<Result<Vec<_>, _>>()?;

    let mut extra = category.as_object().cloned().unwrap_or_default();
    extra.remove("category");
    extra.remove("items");
    Ok(MenuCategory {
        category: name,
        items,
        extra,
    })
}

fn validate_item(category: usize, item: usize, value: &Value) -> Result<MenuItem, ValidationError> {
    let id = match value.get("id") {
        Some(id) if is_truthy(id) => item_id(id),
        _ => return Err(ValidationError::ItemMissingId { category, item }),
    };
    let name = match value.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(ValidationError::ItemMissingName { category, item }),
    };
    let price = match value.get("price") {
        Some(Value::Number(price)) => price.clone(),
        _ => return Err(ValidationError::PriceNotNumber { category, item }),
    };

    let mut rest = value.as_object().cloned().unwrap_or_default();
    for key in ["id", "name", "price"] {
        rest.remove(key);
    }
    Ok(MenuItem::from_parts(id, name, price, rest))
}

fn item_id(value: &Value) -> ItemId {
    match value {
        Value::Number(n) => ItemId::Number(n.clone()),
        Value::String(s) => ItemId::Text(s.clone()),
        other => ItemId::Other(other.clone()),
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
