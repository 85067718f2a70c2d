//! Credential handling.
//!
//! # Security Guarantees
//! - Credentials are stored in `Zeroizing` containers for automatic memory clearing
//! - Passwords never appear in `Debug` or `Display` output, logs or errors

mod credentials;

pub use credentials::Credentials;
