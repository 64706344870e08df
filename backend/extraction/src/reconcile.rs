use uuid::Uuid;

use menuscan_core::{ExtractedMenu, FinalMenu, Menu};

/// Caller-supplied values that take part in reconciliation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides<'a> {
    /// Restaurant name sent with the upload. Blank values are ignored.
    pub restaurant_name: Option<&'a str>,
    /// The stored menu being replaced, on the update path.
    pub existing: Option<&'a Menu>,
}

/// Merge a freshly extracted menu with caller overrides.
///
/// Name priority: explicit override, then the stored name when the model
/// produced none, then whatever the model read. The owner always comes from
/// the stored menu or the caller, never from model output.
pub fn reconcile(extracted: ExtractedMenu, overrides: Overrides<'_>, caller: Uuid) -> FinalMenu {
    let explicit = overrides.restaurant_name.filter(|name| !name.is_empty());

    let restaurant_name = match (explicit, overrides.existing) {
        (Some(name), _) => name.to_string(),
        (None, Some(existing)) if extracted.restaurant_name.is_empty() => {
            existing.restaurant_name.clone()
        }
        _ => extracted.restaurant_name,
    };

    let owner = overrides.existing.map(|m| m.owner).unwrap_or(caller);

    FinalMenu {
        restaurant_name,
        menu: extracted.menu,
        owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuscan_core::MenuCategory;

    fn extracted(name: &str) -> ExtractedMenu {
        ExtractedMenu {
            restaurant_name: name.to_string(),
            menu: vec![MenuCategory::new("Mains", vec![])],
        }
    }

    fn stored(name: &str, owner: Uuid) -> Menu {
        Menu::create(FinalMenu {
            restaurant_name: name.to_string(),
            menu: vec![],
            owner,
        })
    }

    #[test]
    fn explicit_name_beats_extracted_name() {
        let caller = Uuid::new_v4();
        let result = reconcile(
            extracted("Extracted Name"),
            Overrides { restaurant_name: Some("Override Name"), existing: None },
            caller,
        );
        assert_eq!(result.restaurant_name, "Override Name");
        assert_eq!(result.owner, caller);
        assert_eq!(result.menu.len(), 1);
    }

    #[test]
    fn empty_extracted_name_falls_back_to_stored_name() {
        let owner = Uuid::new_v4();
        let existing = stored("Old Name", owner);
        let result = reconcile(
            extracted(""),
            Overrides { restaurant_name: None, existing: Some(&existing) },
            Uuid::new_v4(),
        );
        assert_eq!(result.restaurant_name, "Old Name");
        assert_eq!(result.owner, owner);
    }

    #[test]
    fn model_name_is_trusted_on_update_without_override() {
        let existing = stored("Old Name", Uuid::new_v4());
        let result = reconcile(
            extracted("New Sign"),
            Overrides { restaurant_name: None, existing: Some(&existing) },
            Uuid::new_v4(),
        );
        assert_eq!(result.restaurant_name, "New Sign");
    }

    #[test]
    fn empty_override_is_ignored() {
        let result = reconcile(
            extracted("Extracted"),
            Overrides { restaurant_name: Some(""), existing: None },
            Uuid::new_v4(),
        );
        assert_eq!(result.restaurant_name, "Extracted");
    }

    #[test]
    fn override_is_applied_as_given() {
        let result = reconcile(
            extracted("Extracted"),
            Overrides { restaurant_name: Some("  Joe's "), existing: None },
            Uuid::new_v4(),
        );
        assert_eq!(result.restaurant_name, "  Joe's ");
    }

    #[test]
    fn override_wins_on_update_and_owner_is_preserved() {
        let owner = Uuid::new_v4();
        let existing = stored("Old Name", owner);
        let admin = Uuid::new_v4();
        let result = reconcile(
            extracted(""),
            Overrides { restaurant_name: Some("Renamed"), existing: Some(&existing) },
            admin,
        );
        assert_eq!(result.restaurant_name, "Renamed");
        assert_eq!(result.owner, owner);
    }
}
