/// Credential persistence
///
/// - `credentials`: the [`CredentialStore`](credentials::CredentialStore)
///   seam with its PostgreSQL and in-memory backends

pub mod credentials;

pub use credentials::{CredentialStore, MemoryCredentialStore, PgCredentialStore, StoreError};
