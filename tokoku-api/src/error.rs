/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Library errors are translated into
/// the coarse public taxonomy here, so a response never reveals which
/// internal check failed.
///
/// | Variant | Status | `error` |
/// |---|---|---|
/// | `BadRequest` | 400 | `bad_request` |
/// | `InvalidCredentials` | 401 | `invalid_credentials` |
/// | `Unauthenticated` | 401 | `unauthenticated` |
/// | `NotFound` | 404 | `not_found` |
/// | `DuplicateUsername` | 409 | `duplicate_username` |
/// | `Conflict` | 409 | `conflict` |
/// | `ValidationError` | 422 | `validation_error` |
/// | `InternalError` | 500 | `internal_error` |
/// | `ServiceUnavailable` | 503 | `service_unavailable` |
///
/// # Example
///
/// ```
/// use tokoku_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Category not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokoku_shared::auth::{
    middleware::AuthError, password::PasswordError, revocation::RevocationError,
    token::TokenError,
};
use tokoku_shared::store::StoreError;
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message for every failed login
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    BadRequest(String),

    /// Login failed; unknown user and wrong password are the same error (401)
    InvalidCredentials,

    /// Missing, malformed, invalid, expired or revoked token (401)
    Unauthenticated(String),

    /// Not found (404)
    NotFound(String),

    /// Registration with a taken username (409)
    DuplicateUsername,

    /// Unique or reference conflict (409)
    Conflict(String),

    /// Field validation failed (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the message is logged, not returned
    InternalError(String),

    /// Backing service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable kind (e.g. "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Stable kind string used in the response body
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::NotFound(_) => "not_found",
            ApiError::DuplicateUsername => "duplicate_username",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateUsername | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Maps a failed `DELETE`: a row still referenced elsewhere is a conflict
    pub fn from_delete(err: sqlx::Error, resource: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => ApiError::Conflict(
                format!("{} is still referenced by other records", resource),
            ),
            _ => ApiError::from(err),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::InvalidCredentials => write!(f, "{}", INVALID_CREDENTIALS_MESSAGE),
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DuplicateUsername => write!(f, "Username already exists"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let (message, details) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
            ApiError::InvalidCredentials => (INVALID_CREDENTIALS_MESSAGE.to_string(), None),
            ApiError::DuplicateUsername => ("Username already exists".to_string(), None),
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: kind.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Field name from a default PostgreSQL FK name (`products_category_id_fkey`)
fn field_from_fkey(constraint: &str) -> String {
    let column = constraint.strip_suffix("_fkey").unwrap_or(constraint);
    column
        .split_once('_')
        .map(|(_, field)| field)
        .unwrap_or(column)
        .to_string()
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let message = match db_err.constraint() {
                        Some(constraint) => format!("Value already exists ({})", constraint),
                        None => "Value already exists".to_string(),
                    };
                    return ApiError::Conflict(message);
                }

                if db_err.is_foreign_key_violation() {
                    let field = db_err
                        .constraint()
                        .map(field_from_fkey)
                        .unwrap_or_else(|| "reference".to_string());
                    return ApiError::ValidationError(vec![ValidationErrorDetail::new(
                        field,
                        "Referenced record does not exist",
                    )]);
                }

                if db_err.is_check_violation() {
                    return ApiError::ValidationError(vec![ValidationErrorDetail::new(
                        db_err.constraint().unwrap_or("value"),
                        "Value is out of range",
                    )]);
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database is unavailable".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator errors to API errors
impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        // HashMap order is random; keep responses stable
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected path parameters");
        ApiError::BadRequest("Invalid resource id".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => ApiError::DuplicateUsername,
            StoreError::Database(e) => ApiError::from(e),
        }
    }
}

/// Hashing failures are never the caller's fault
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Token creation failures; verification failures go through `AuthError`
impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            other => {
                tracing::debug!(reason = %other, "Token rejected");
                ApiError::Unauthenticated(
                    AuthError::InvalidToken(other).public_message().to_string(),
                )
            }
        }
    }
}

impl From<RevocationError> for ApiError {
    fn from(err: RevocationError) -> Self {
        tracing::error!(error = %err, "Revocation backend failure");
        ApiError::ServiceUnavailable(
            AuthError::RevocationUnavailable(err).public_message().to_string(),
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::RevocationUnavailable(e) => ApiError::from(e),
            other => ApiError::Unauthenticated(other.public_message().to_string()),
        }
    }
}
