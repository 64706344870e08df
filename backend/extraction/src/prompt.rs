/// Instruction block sent with every batch of menu photographs.
///
/// The JSON shape described here is exactly what `validator::validate` checks.
pub const MENU_EXTRACTION_PROMPT: &str = r#"You are reading photographs of a printed restaurant menu.
Extract every dish visible across all of the images and answer with a single JSON object of this shape:
{
  "restaurant_name": "Name of the restaurant",
  "menu": [
    {
      "category": "Category name, e.g. Starters or Main Course",
      "items": [
        {
          "id": unique_number,
          "name": "Item name",
          "description": "Item description",
          "price": price_as_number,
          "is_vegetarian": boolean_value,
          "image_url": null
        }
      ]
    }
  ]
}

Rules:
1. Capture all menu text that is visible.
2. Put each item in the category it is printed under.
3. Prices must be JSON numbers, never strings, without currency symbols.
4. Mark items vegetarian when the description or a menu symbol says so.
5. Give every item an id that is unique within its category."#;
