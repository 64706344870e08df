//! Menu routes under `/api/menus`. Every route requires authentication.

use std::time::Instant;

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use menuscan_core::{Identity, Menu, MenuImage};
use menuscan_extraction::{Overrides, reconcile, validate_categories};

use crate::auth::RequireAuth;
use crate::response::{ApiError, ApiResponse, ApiResult};
use crate::server::GatewayState;
use crate::uploads::read_upload;

fn not_owned(name: &str) -> ApiError {
    ApiError::forbidden(format!("You don't own the restaurant '{name}'"))
}

/// Load a menu the caller may act on. Unknown or malformed ids are 404.
async fn load_menu(
    state: &GatewayState,
    id: &str,
    caller: &Identity,
    denied: &str,
) -> Result<Menu, ApiError> {
    let menu = match Uuid::parse_str(id) {
        Ok(id) => state.menus.get_menu(id).await?,
        Err(_) => None,
    };
    let menu = menu.ok_or_else(|| ApiError::not_found("Menu not found"))?;
    if !caller.can_access_menu(&menu) {
        info!(menu_id = %menu.id, user_id = %caller.user_id, "Menu access denied");
        return Err(ApiError::forbidden(denied));
    }
    Ok(menu)
}

/// Run the extraction under the concurrency cap.
async fn extract(
    state: &GatewayState,
    images: Vec<MenuImage>,
) -> Result<menuscan_core::ExtractedMenu, ApiError> {
    let _permit = state.limiter.acquire().await?;
    let start = Instant::now();
    let extracted = state.extractor.extract_menu(images).await?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        restaurant = %extracted.restaurant_name,
        "Menu extraction finished"
    );
    Ok(extracted)
}

/// `POST /api/menus` (multipart: `images`, `restaurant_name`)
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_menu(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> ApiResult {
    let form = read_upload(multipart, &state.upload_policy).await?;
    let caller = user.identity();

    let name = form
        .restaurant_name()
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Restaurant name is required"))?;
    if !caller.can_manage_restaurant(&name) {
        return Err(not_owned(&name));
    }
    form.require_images()?;
    info!(restaurant = %name, images = form.images.len(), "Creating menu from upload");

    let images = form.store(&state.images).await?;
    let extracted = extract(&state, images).await?;
    let final_menu = reconcile(
        extracted,
        Overrides {
            restaurant_name: Some(&name),
            existing: None,
        },
        user.id,
    );

    let menu = Menu::create(final_menu);
    state.menus.insert_menu(&menu).await?;
    info!(menu_id = %menu.id, "Menu created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(menu).with_message("Menu created successfully"),
    )
        .into_response())
}

/// `GET /api/menus`: admins see every menu, owners their own.
pub async fn list_menus(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
) -> ApiResult {
    let owner = (!user.identity().is_admin()).then_some(user.id);
    let menus = state.menus.list_menus(owner).await?;
    info!(user_id = %user.id, count = menus.len(), "Listed menus");
    let count = menus.len();
    Ok(ApiResponse::data(menus).with_count(count).into_response())
}

/// `GET /api/menus/:id`
pub async fn get_menu(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> ApiResult {
    let menu = load_menu(&state, &id, &user.identity(), "Not authorized to view this menu").await?;
    Ok(ApiResponse::data(menu).into_response())
}

/// `PUT /api/menus/:id` with a partial JSON body.
#[instrument(skip_all, fields(user_id = %user.id, menu_id = %id))]
pub async fn update_menu(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let caller = user.identity();
    let mut menu = load_menu(&state, &id, &caller, "Not authorized to modify this menu").await?;

    let Some(mut fields) = body.as_object().cloned().filter(|f| !f.is_empty()) else {
        return Err(ApiError::bad_request("No update data provided"));
    };
    // Ownership never changes through this route.
    fields.remove("owner");

    if let Some(name) = fields.get("restaurant_name") {
        let name = name
            .as_str()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::bad_request("Restaurant name is required"))?;
        if !caller.can_manage_restaurant(name) {
            return Err(not_owned(name));
        }
        menu.restaurant_name = name.to_string();
    }
    if let Some(categories) = fields.get("menu") {
        menu.menu = validate_categories(categories)?;
    }
    menu.touch();

    if !state.menus.update_menu(&menu).await? {
        return Err(ApiError::not_found("Menu not found"));
    }
    info!("Menu updated");
    Ok(ApiResponse::data(menu)
        .with_message("Menu updated successfully")
        .into_response())
}

/// `PUT /api/menus/:id/images`: re-extract from new photographs.
#[instrument(skip_all, fields(user_id = %user.id, menu_id = %id))]
pub async fn update_menu_images(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult {
    let caller = user.identity();
    let mut menu = load_menu(&state, &id, &caller, "Not authorized to modify this menu").await?;
    let form = read_upload(multipart, &state.upload_policy).await?;

    let provided = form.restaurant_name().map(str::to_string);
    if let Some(name) = &provided {
        if !caller.can_manage_restaurant(name) {
            return Err(not_owned(name));
        }
    }
    form.require_images()?;
    info!(images = form.images.len(), "Re-extracting menu from new images");

    let images = form.store(&state.images).await?;
    let extracted = extract(&state, images).await?;
    let final_menu = reconcile(
        extracted,
        Overrides {
            restaurant_name: provided.as_deref(),
            existing: Some(&menu),
        },
        user.id,
    );
    menu.replace_with(final_menu);

    if !state.menus.update_menu(&menu).await? {
        return Err(ApiError::not_found("Menu not found"));
    }
    info!(restaurant = %menu.restaurant_name, "Menu updated from new images");
    Ok(ApiResponse::data(menu)
        .with_message("Menu updated successfully with new images")
        .into_response())
}

/// `DELETE /api/menus/:id`
pub async fn delete_menu(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> ApiResult {
    let menu = load_menu(&state, &id, &user.identity(), "Not authorized to modify this menu").await?;
    state.menus.delete_menu(menu.id).await?;
    info!(menu_id = %menu.id, restaurant = %menu.restaurant_name, "Menu deleted");
    Ok(ApiResponse::message("Menu deleted successfully").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{JOES_OUTPUT, TestApp, get, json_request, upload_request};
    use menuscan_core::{FinalMenu, MenuCategory, Role};
    use menuscan_store::MenuStore;
    use menuscan_understanding::ScriptedVisionClient;
    use serde_json::json;

    const JPEG: (&str, &str, &[u8]) = ("menu.jpg", "image/jpeg", b"fake-jpeg");

    async fn stored_menu(app: &TestApp, owner: Uuid, name: &str) -> Menu {
        let menu = Menu::create(FinalMenu {
            restaurant_name: name.to_string(),
            menu: vec![MenuCategory::new("Drinks", vec![])],
            owner,
        });
        app.store.insert_menu(&menu).await.unwrap();
        menu
    }

    #[tokio::test]
    async fn create_uses_provided_name_and_caller_as_owner() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (user, token) = app.user("joe@diner.com", &["Joe's Diner"], Role::Owner).await;

        let (status, body) = app
            .send(upload_request("POST", "/api/menus", &token, Some("joe's diner"), &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Menu created successfully");
        assert_eq!(body["data"]["restaurant_name"], "joe's diner");
        assert_eq!(body["data"]["owner"], user.id.to_string());
        assert_eq!(body["data"]["menu"][0]["items"][0]["name"], "Burger");
        assert_eq!(app.vision.calls(), 1);

        let stored = std::fs::read_dir(app.uploads.path().join("images")).unwrap().count();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn create_rejects_restaurant_the_caller_does_not_own() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (_, token) = app.user("joe@diner.com", &["Joe's Diner"], Role::Owner).await;

        let (status, body) = app
            .send(upload_request("POST", "/api/menus", &token, Some("Other Place"), &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "You don't own the restaurant 'Other Place'");
        assert_eq!(app.vision.calls(), 0);
    }

    #[tokio::test]
    async fn admin_may_create_for_any_restaurant() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (_, token) = app.user("admin@diner.com", &[], Role::Admin).await;

        let (status, _) = app
            .send(upload_request("POST", "/api/menus", &token, Some("Anywhere"), &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn create_validates_the_upload() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (_, token) = app.user("joe@diner.com", &["Joe's"], Role::Owner).await;

        let (status, body) = app
            .send(upload_request("POST", "/api/menus", &token, None, &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Restaurant name is required");

        let (status, body) = app
            .send(upload_request("POST", "/api/menus", &token, Some("Joe's"), &[]))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No image files were uploaded");

        let (status, body) = app
            .send(upload_request(
                "POST",
                "/api/menus",
                &token,
                Some("Joe's"),
                &[("notes.txt", "text/plain", b"hello")],
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Only image files are allowed (JPEG, JPG, PNG, WEBP, HEIC)"
        );
        assert_eq!(app.vision.calls(), 0);
    }

    #[tokio::test]
    async fn exhausted_extraction_is_bad_gateway() {
        let app = TestApp::new(ScriptedVisionClient::always("I cannot read this menu."));
        let (_, token) = app.user("joe@diner.com", &["Joe's"], Role::Owner).await;

        let (status, body) = app
            .send(upload_request("POST", "/api/menus", &token, Some("Joe's"), &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("after 3 attempts"));
        assert_eq!(app.vision.calls(), 3);
        assert!(app.store.list_menus(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owners_list_their_own_menus_and_admins_list_all() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (alice, alice_token) = app.user("alice@diner.com", &["A"], Role::Owner).await;
        let (bob, _) = app.user("bob@diner.com", &["B"], Role::Owner).await;
        let (_, admin_token) = app.user("admin@diner.com", &[], Role::Admin).await;
        stored_menu(&app, alice.id, "A").await;
        stored_menu(&app, bob.id, "B").await;

        let (status, body) = app.send(get("/api/menus", Some(&alice_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["restaurant_name"], "A");

        let (_, body) = app.send(get("/api/menus", Some(&admin_token))).await;
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn get_enforces_ownership() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (alice, _) = app.user("alice@diner.com", &["A"], Role::Owner).await;
        let (_, bob_token) = app.user("bob@diner.com", &["B"], Role::Owner).await;
        let (_, admin_token) = app.user("admin@diner.com", &[], Role::Admin).await;
        let menu = stored_menu(&app, alice.id, "A").await;
        let uri = format!("/api/menus/{}", menu.id);

        let (status, body) = app.send(get(&uri, Some(&bob_token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not authorized to view this menu");

        let (status, _) = app.send(get(&uri, Some(&admin_token))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.send(get("/api/menus/not-a-menu", Some(&admin_token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Menu not found");
    }

    #[tokio::test]
    async fn json_update_applies_fields_and_ignores_owner() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (alice, token) = app.user("alice@diner.com", &["A", "A2"], Role::Owner).await;
        let menu = stored_menu(&app, alice.id, "A").await;
        let uri = format!("/api/menus/{}", menu.id);

        let (status, body) = app.send(json_request("PUT", &uri, Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No update data provided");

        let bad_menu = json!({ "menu": [{ "category": "X", "items": [{ "id": 1, "name": "Tea", "price": "2" }] }] });
        let (status, _) = app.send(json_request("PUT", &uri, Some(&token), bad_menu)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(json_request("PUT", &uri, Some(&token), json!({ "restaurant_name": "Elsewhere" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "You don't own the restaurant 'Elsewhere'");

        let update = json!({
            "restaurant_name": "A2",
            "owner": Uuid::new_v4(),
            "menu": [{ "category": "Tea", "items": [{ "id": 1, "name": "Green", "price": 2 }] }]
        });
        let (status, body) = app.send(json_request("PUT", &uri, Some(&token), update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["restaurant_name"], "A2");
        assert_eq!(body["data"]["owner"], alice.id.to_string());
        assert_eq!(body["data"]["menu"][0]["items"][0]["name"], "Green");

        let stored = app.store.get_menu(menu.id).await.unwrap().unwrap();
        assert_eq!(stored.owner, alice.id);
        assert_eq!(stored.restaurant_name, "A2");
    }

    #[tokio::test]
    async fn image_update_keeps_owner_and_trusts_model_name_without_override() {
        let output = "{\"restaurant_name\":\"New Sign\",\"menu\":[{\"category\":\"Soups\",\"items\":[{\"id\":1,\"name\":\"Miso\",\"price\":4}]}]}";
        let app = TestApp::new(ScriptedVisionClient::always(output));
        let (alice, _) = app.user("alice@diner.com", &["A"], Role::Owner).await;
        let (_, admin_token) = app.user("admin@diner.com", &[], Role::Admin).await;
        let menu = stored_menu(&app, alice.id, "A").await;
        let uri = format!("/api/menus/{}/images", menu.id);

        let (status, body) = app
            .send(upload_request("PUT", &uri, &admin_token, None, &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Menu updated successfully with new images");
        assert_eq!(body["data"]["restaurant_name"], "New Sign");
        assert_eq!(body["data"]["owner"], alice.id.to_string());
        assert_eq!(body["data"]["menu"][0]["category"], "Soups");
        assert_eq!(body["data"]["id"], menu.id.to_string());
    }

    #[tokio::test]
    async fn image_update_checks_the_new_name() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (alice, token) = app.user("alice@diner.com", &["A"], Role::Owner).await;
        let menu = stored_menu(&app, alice.id, "A").await;
        let uri = format!("/api/menus/{}/images", menu.id);

        let (status, _) = app
            .send(upload_request("PUT", &uri, &token, Some("Not Mine"), &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(upload_request("PUT", &uri, &token, Some("a"), &[JPEG]))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["restaurant_name"], "a");
        assert_eq!(app.vision.calls(), 1);
    }

    #[tokio::test]
    async fn delete_then_missing() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (alice, token) = app.user("alice@diner.com", &["A"], Role::Owner).await;
        let (_, bob_token) = app.user("bob@diner.com", &["B"], Role::Owner).await;
        let menu = stored_menu(&app, alice.id, "A").await;
        let uri = format!("/api/menus/{}", menu.id);

        let (status, _) = app.send(json_request("DELETE", &uri, Some(&bob_token), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.send(json_request("DELETE", &uri, Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Menu deleted successfully");

        let (status, _) = app.send(get(&uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn menu_routes_require_a_token() {
        let app = TestApp::new(ScriptedVisionClient::always(JOES_OUTPUT));
        let (status, body) = app.send(get("/api/menus", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized to access this route");
    }
}
