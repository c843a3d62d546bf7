/// Session endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/register`: enroll a credential and receive a token
/// - `POST /api/v1/login`: exchange username + password for a token
/// - `POST /api/v1/logout`: revoke the presented token (gated)
/// - `GET /api/v1/protected`: profile of the token's subject (gated)
/// - `GET /api/v1/secure-endpoint`: echo of the verified identity (gated)
///
/// Login answers unknown usernames and wrong passwords with the same
/// `invalid_credentials` error, and spends the same hashing work on both.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tokoku_shared::{
    auth::middleware::AuthContext, models::user::UserProfile, store::StoreError,
};
use validator::Validate;

/// Register and login request body
///
/// Missing fields deserialize as empty strings and are then rejected by
/// validation. Deliberately not `Debug`: it holds a plaintext password.
#[derive(Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Login name
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,

    /// Plaintext password
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,

    /// New credential id
    pub user_id: i64,

    /// Session token
    pub token: String,

    /// Token expiry (Unix seconds), absent when tokens do not expire
    pub expires_at: Option<i64>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub expires_at: Option<i64>,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /protected` response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub data: UserProfile,
}

/// `GET /secure-endpoint` response
#[derive(Debug, Serialize, Deserialize)]
pub struct SecureResponse {
    pub message: String,
    pub user: AuthContext,
}

/// Register a new credential
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/register
/// Content-Type: application/json
///
/// { "username": "alice", "password": "pw123" }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "User registered successfully",
///   "user_id": 1,
///   "token": "eyJ...",
///   "expires_at": 1735776000
/// }
/// ```
///
/// # Errors
///
/// - `400 bad_request`: body is not JSON
/// - `422 validation_error`: missing or out-of-range fields
/// - `409 duplicate_username`: username already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let password_hash = state.hasher.hash(req.password).await?;

    let user = match state.credentials.insert(&req.username, &password_hash).await {
        Ok(user) => user,
        Err(StoreError::DuplicateUsername) => {
            tracing::info!("Registration rejected: username already exists");
            return Err(ApiError::DuplicateUsername);
        }
        Err(e) => return Err(e.into()),
    };

    let issued = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// Authenticate and receive a fresh token
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "pw123" }
/// ```
///
/// # Errors
///
/// - `401 invalid_credentials`: unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let Some(user) = state.credentials.find_by_username(&req.username).await? else {
        state.hasher.verify_dummy(req.password).await;
        tracing::debug!("Login failed: unknown username");
        return Err(ApiError::InvalidCredentials);
    };

    if !state.hasher.verify(req.password, user.password_hash.clone()).await {
        tracing::debug!(user_id = user.id, "Login failed: password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    let issued = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// Revoke the token that authenticated this request
///
/// The token stays revoked until it would have expired anyway.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<MessageResponse>> {
    state.revocations.revoke(&auth.token()).await?;
    tracing::info!(user_id = auth.user_id, token_id = %auth.token_id, "User logged out");

    Ok(Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    }))
}

/// Profile of the authenticated subject
///
/// Unlike the gate, this looks the subject up: a token for a deleted
/// credential is rejected as `unauthenticated`.
pub async fn protected(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<ProtectedResponse>> {
    let user = state
        .credentials
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = auth.user_id, "Token subject no longer exists");
            ApiError::Unauthenticated("User no longer exists".to_string())
        })?;

    Ok(Json(ProtectedResponse {
        message: "Access granted".to_string(),
        data: UserProfile::from(user),
    }))
}

/// Echo of the verified identity
pub async fn secure_endpoint(auth: AuthContext) -> Json<SecureResponse> {
    Json(SecureResponse {
        message: "You are authorized!".to_string(),
        user: auth,
    })
}
