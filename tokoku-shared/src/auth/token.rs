/// Session token issuance and verification
///
/// Tokens are JWTs signed with HS256 (HMAC-SHA256) under a single
/// process-wide symmetric key. They are self-contained: nothing is stored
/// server-side at issue time, and verification never touches the
/// credential store.
///
/// # Claims
///
/// - `sub`: credential id, as a decimal string
/// - `iss`: configured issuer (default `"tokoku"`)
/// - `iat`: issued-at (Unix seconds)
/// - `exp`: expiry (Unix seconds), omitted when expiry is disabled
/// - `jti`: random token id, used by the revocation list
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use tokoku_shared::auth::token::TokenService;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(
///     "a-signing-key-of-at-least-32-bytes!!",
///     "tokoku",
///     Some(Duration::hours(24)),
/// );
///
/// let issued = tokens.issue(42)?;
/// let verified = tokens.verify(&issued.token)?;
/// assert_eq!(verified.subject_id, 42);
/// # Ok(())
/// # }
/// ```

use std::collections::HashSet;
use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for token operations
///
/// `Invalid` deliberately covers malformed, tampered, and wrongly signed
/// tokens alike.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to encode or sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token is malformed, tampered with, or signed with another key
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// JWT claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - credential id as a decimal string
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp); absent when expiry is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Unique token id
    pub jti: Uuid,
}

/// A freshly issued token together with its metadata
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded JWT
    pub token: String,

    /// Token id (`jti`)
    pub token_id: Uuid,

    /// Issued-at (Unix seconds)
    pub issued_at: i64,

    /// Expiry (Unix seconds), if expiry is enabled
    pub expires_at: Option<i64>,
}

/// The verified content of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Credential id the token was issued for
    pub subject_id: i64,

    /// Token id (`jti`)
    pub token_id: Uuid,

    /// Issued-at (Unix seconds)
    pub issued_at: i64,

    /// Expiry (Unix seconds), if the token carries one
    pub expires_at: Option<i64>,
}

impl VerifiedToken {
    /// Time remaining before expiry, `None` for tokens without expiry
    pub fn remaining_lifetime(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| Duration::seconds((exp - Utc::now().timestamp()).max(0)))
    }
}

/// Issues and verifies signed session tokens
///
/// Holds the signing key for the lifetime of the process. The key material
/// is never exposed through `Debug`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Option<Duration>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenService {
    /// Creates a token service
    ///
    /// # Arguments
    ///
    /// * `secret` - Symmetric signing key (should be at least 32 bytes)
    /// * `issuer` - Value of the `iss` claim, checked on verification
    /// * `ttl` - Token lifetime; `None` issues tokens that never expire
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Issues a token for `subject_id`
    ///
    /// # Errors
    ///
    /// Returns `TokenError::CreateError` if signing fails or the expiry
    /// falls outside the representable date range.
    pub fn issue(&self, subject_id: i64) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let exp = match self.ttl {
            Some(ttl) => {
                let exp = now
                    .checked_add_signed(ttl)
                    .ok_or_else(|| TokenError::CreateError("Token expiry out of range".to_string()))?;
                Some(exp.timestamp())
            }
            None => None,
        };

        let claims = Claims {
            sub: subject_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp,
            jti: Uuid::new_v4(),
        };

        let token = self.encode_claims(&claims)?;

        Ok(IssuedToken {
            token,
            token_id: claims.jti,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Signs arbitrary claims with this service's key
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns its subject
    ///
    /// Checks the signature, the algorithm, the issuer and, when the token
    /// carries `exp`, the expiry (zero leeway). Expiry is mandatory when
    /// this service is configured with a lifetime.
    ///
    /// # Errors
    ///
    /// - `TokenError::Expired` if `exp` has passed
    /// - `TokenError::Invalid` for every other failure
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.leeway = 0;
        validation.validate_exp = true;

        let mut required: HashSet<String> = ["sub", "iss"].iter().map(|c| c.to_string()).collect();
        if self.ttl.is_some() {
            required.insert("exp".to_string());
        }
        validation.required_spec_claims = required;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        let claims = data.claims;
        let subject_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Invalid("Subject is not a numeric id".to_string()))?;

        Ok(VerifiedToken {
            subject_id,
            token_id: claims.jti,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}
