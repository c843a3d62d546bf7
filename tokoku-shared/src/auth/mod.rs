/// Authentication core
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the bounded hashing pool
/// - [`token`]: signed, time-bound session tokens (HS256 JWT)
/// - [`revocation`]: denylist of logged-out token ids
/// - [`middleware`]: the Auth Gate that guards protected routes
///
/// # Example
///
/// ```
/// use tokoku_shared::auth::password::{hash_password, verify_password, HashingConfig};
/// use tokoku_shared::auth::token::TokenService;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password", &HashingConfig::default())?;
/// assert!(verify_password("user_password", &hash));
///
/// let tokens = TokenService::new("a-signing-key-of-at-least-32-bytes!!", "tokoku", None);
/// let issued = tokens.issue(1)?;
/// assert_eq!(tokens.verify(&issued.token)?.subject_id, 1);
/// # Ok(())
/// # }
/// ```

pub mod middleware;
pub mod password;
pub mod revocation;
pub mod token;
