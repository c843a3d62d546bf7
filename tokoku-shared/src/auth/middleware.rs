/// Authentication gate for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, verifies the token,
/// checks the revocation list, and inserts an [`AuthContext`] into the
/// request extensions. Every rejection is a `401 unauthenticated`; the
/// specific cause is only logged.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use tokoku_shared::auth::middleware::{auth_gate, AuthContext, AuthGate};
/// use tokoku_shared::auth::revocation::MemoryRevocationList;
/// use tokoku_shared::auth::token::TokenService;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let tokens = Arc::new(TokenService::new("a-signing-key-of-at-least-32-bytes!!", "tokoku", None));
/// let gate = AuthGate::new(tokens, Arc::new(MemoryRevocationList::new()));
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(gate, auth_gate));
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::revocation::{RevocationError, RevocationList};
use super::token::{TokenError, TokenService, VerifiedToken};

/// Verified identity attached to a request
///
/// Handlers behind the gate can take it directly as an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated credential id
    pub user_id: i64,

    /// Id of the token that authenticated this request
    pub token_id: Uuid,

    /// When the token was issued (Unix seconds)
    pub issued_at: i64,

    /// When the token expires (Unix seconds), if ever
    pub expires_at: Option<i64>,
}

impl From<VerifiedToken> for AuthContext {
    fn from(token: VerifiedToken) -> Self {
        Self {
            user_id: token.subject_id,
            token_id: token.token_id,
            issued_at: token.issued_at,
            expires_at: token.expires_at,
        }
    }
}

impl AuthContext {
    /// The verified token this context was built from
    pub fn token(&self) -> VerifiedToken {
        VerifiedToken {
            subject_id: self.user_id,
            token_id: self.token_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

/// Why the gate rejected a request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("No token provided")]
    MissingCredentials,

    /// Header is not exactly `Bearer <token>`
    #[error("Invalid authorization header format")]
    InvalidFormat,

    /// Token failed verification
    #[error("Token rejected: {0}")]
    InvalidToken(#[from] TokenError),

    /// Token was revoked by logout
    #[error("Token has been revoked")]
    Revoked,

    /// The revocation list could not be consulted
    #[error("Revocation check failed: {0}")]
    RevocationUnavailable(#[from] RevocationError),
}

impl AuthError {
    /// Message shown to the client; token failures share one message
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "No token provided",
            AuthError::InvalidFormat => "Invalid authorization header format",
            AuthError::InvalidToken(_) | AuthError::Revoked => "Invalid or expired token",
            AuthError::RevocationUnavailable(_) => "Authentication temporarily unavailable",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, kind) = match self {
            AuthError::RevocationUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            _ => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        };

        let body = Json(json!({
            "error": kind,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Splits an `Authorization` value into its token
///
/// Accepts exactly two space-separated parts, the first being `Bearer`.
pub fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidFormat),
    }
}

/// The Auth Gate: token service plus revocation list
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    revocations: Arc<dyn RevocationList>,
}

impl AuthGate {
    /// Creates a gate over the given token service and revocation list
    pub fn new(tokens: Arc<TokenService>, revocations: Arc<dyn RevocationList>) -> Self {
        Self { tokens, revocations }
    }

    /// Token service used for verification
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Revocation list consulted after verification
    pub fn revocations(&self) -> &dyn RevocationList {
        self.revocations.as_ref()
    }

    /// Authenticates a request from its headers
    ///
    /// Has no side effects; the caller decides what to do with the context.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = parse_bearer(value)?;
        let verified = self.tokens.verify(token)?;

        if self.revocations.is_revoked(verified.token_id).await? {
            return Err(AuthError::Revoked);
        }

        Ok(AuthContext::from(verified))
    }
}

/// Gate middleware, for use with `axum::middleware::from_fn_with_state`
pub async fn auth_gate(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = match gate.authenticate(req.headers()).await {
        Ok(context) => context,
        Err(err) => {
            match &err {
                AuthError::RevocationUnavailable(_) => {
                    tracing::error!(error = %err, "Rejected request: revocation check failed")
                }
                _ => tracing::debug!(reason = %err, "Rejected unauthenticated request"),
            }
            return Err(err);
        }
    };

    tracing::debug!(user_id = context.user_id, "Request authenticated");
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
