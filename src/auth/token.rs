//! Token secret wrapper and the cached record stored alongside its expiry.

pub mod record;
pub mod secret;
