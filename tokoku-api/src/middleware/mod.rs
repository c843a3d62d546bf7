/// HTTP middleware owned by the API server
///
/// The Auth Gate itself lives in `tokoku_shared::auth::middleware`.

pub mod security;
