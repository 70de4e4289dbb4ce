//! Upstream account credentials and cached token models.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::{record::*, secret::*};
