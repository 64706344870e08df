//! Account routes under `/api/auth`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies};
use tracing::{info, warn};

use menuscan_core::{Restaurant, User};
use menuscan_security::{
    MAX_TTL_DAYS, hash_password, normalize_email, validate_email, validate_password, verify_password,
};

use crate::auth::{RequireAuth, TOKEN_COOKIE};
use crate::response::{ApiError, ApiResponse, ApiResult};
use crate::server::{CookieSettings, GatewayState};

#[derive(Debug, Deserialize)]
pub struct RestaurantInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl RestaurantInput {
    fn into_restaurant(self) -> Result<Restaurant, ApiError> {
        let name = non_blank(self.name)
            .ok_or_else(|| ApiError::bad_request("Restaurant name is required"))?;
        Ok(Restaurant {
            name,
            description: self.description.unwrap_or_default().trim().to_string(),
            location: self.location.unwrap_or_default().trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub restaurants: Option<Vec<RestaurantInput>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn session_cookie(token: String, settings: CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_secure(settings.secure);
    cookie.set_path("/");
    cookie.set_expires(Some(
        time::OffsetDateTime::now_utc() + time::Duration::days(settings.ttl_days.clamp(1, MAX_TTL_DAYS)),
    ));
    cookie
}

/// Issue a token, set the cookie and return the user alongside the token.
fn token_response(
    state: &GatewayState,
    cookies: &Cookies,
    user: User,
    status: StatusCode,
    message: &str,
) -> ApiResult {
    let token = state.tokens.issue(user.id)?;
    cookies.add(session_cookie(token.clone(), state.cookie));
    Ok((
        status,
        ApiResponse::data(user)
            .with_message(message)
            .with_token(token),
    )
        .into_response())
}

async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal("Password hashing failed", e))?
        .map_err(ApiError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal("Password verification failed", e))
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<GatewayState>,
    cookies: Cookies,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;

    let name = non_blank(body.name).ok_or_else(|| ApiError::bad_request("Name is required"))?;
    let email = body
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("Email is required"))?;
    validate_email(&email)?;
    let password = body
        .password
        .ok_or_else(|| ApiError::bad_request("Password is required"))?;
    validate_password(&password)?;
    let restaurants = body
        .restaurants
        .unwrap_or_default()
        .into_iter()
        .map(RestaurantInput::into_restaurant)
        .collect::<Result<Vec<_>, _>>()?;

    info!(email = %email, "[Auth] Registering new user");
    if state.users.find_user_by_email(&email).await?.is_some() {
        info!(email = %email, "[Auth] Email already registered");
        return Err(ApiError::bad_request("User with this email already exists"));
    }

    let hash = hash_blocking(password).await?;
    let user = User::new(name, email, hash, restaurants);
    state.users.insert_user(&user).await?;
    info!(user_id = %user.id, "[Auth] User registered");

    token_response(&state, &cookies, user, StatusCode::CREATED, "User registered successfully")
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<GatewayState>,
    cookies: Cookies,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let (Some(email), Some(password)) = (non_blank(body.email), body.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("Please provide email and password"));
    };
    let email = normalize_email(&email);

    let Some(user) = state.users.find_user_by_email(&email).await? else {
        warn!(email = %email, "[Auth] Login for unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    if !verify_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "[Auth] Wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    info!(user_id = %user.id, "[Auth] Login successful");
    token_response(&state, &cookies, user, StatusCode::OK, "Login successful")
}

/// `GET /api/auth/me`
pub async fn me(RequireAuth(user): RequireAuth) -> ApiResponse<User> {
    ApiResponse::data(user)
}

/// `PUT /api/auth/updatedetails`
pub async fn update_details(
    State(state): State<GatewayState>,
    RequireAuth(mut user): RequireAuth,
    payload: Result<Json<UpdateDetailsRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;

    if let Some(name) = non_blank(body.name) {
        user.name = name;
    }
    if let Some(email) = body.email.as_deref().map(normalize_email).filter(|e| !e.is_empty()) {
        validate_email(&email)?;
        if email != user.email {
            if state.users.find_user_by_email(&email).await?.is_some() {
                return Err(ApiError::bad_request("User with this email already exists"));
            }
            user.email = email;
        }
    }
    user.updated_at = chrono::Utc::now();

    if !state.users.update_user(&user).await? {
        return Err(ApiError::unauthorized("User not found"));
    }
    info!(user_id = %user.id, "[Auth] User details updated");
    Ok(ApiResponse::data(user).into_response())
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<GatewayState>,
    RequireAuth(user): RequireAuth,
    cookies: Cookies,
) -> ApiResponse<()> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, "none");
    cookie.set_http_only(true);
    cookie.set_secure(state.cookie.secure);
    cookie.set_path("/");
    cookie.set_expires(Some(time::OffsetDateTime::now_utc() + time::Duration::seconds(10)));
    cookies.add(cookie);
    info!(user_id = %user.id, "[Auth] User logged out");
    ApiResponse::message("User logged out successfully")
}

/// `GET /api/auth/restaurants`
pub async fn list_restaurants(RequireAuth(user): RequireAuth) -> ApiResponse<Vec<Restaurant>> {
    let count = user.restaurants.len();
    ApiResponse::data(user.restaurants).with_count(count)
}

/// `POST /api/auth/restaurants`
pub async fn add_restaurant(
    State(state): State<GatewayState>,
    RequireAuth(mut user): RequireAuth,
    payload: Result<Json<RestaurantInput>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let restaurant = body.into_restaurant()?;

    if user.owns_restaurant(&restaurant.name) {
        return Err(ApiError::bad_request(format!(
            "You already have a restaurant named '{}'",
            restaurant.name
        )));
    }

    info!(user_id = %user.id, restaurant = %restaurant.name, "[Auth] Adding restaurant");
    user.restaurants.push(restaurant);
    user.updated_at = chrono::Utc::now();
    state.users.update_user(&user).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(user.restaurants).with_message("Restaurant added successfully"),
    )
        .into_response())
}
