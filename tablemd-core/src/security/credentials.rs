//! Secure credential container with automatic memory zeroing.
//!
//! # Security
//! - Credentials are stored in `Zeroizing<T>` containers
//! - Memory is automatically cleared when credentials go out of scope
//! - Passwords are never exposed in debug output or logs

use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Database login that zeroes its memory on drop.
///
/// The password may be absent when the properties file leaves it out; the
/// CLI then prompts for it and fills it in with [`Credentials::set_password`].
///
/// # Example
///
/// ```rust
/// use tablemd_core::security::Credentials;
///
/// let mut creds = Credentials::new("apps".to_string(), None);
/// assert!(!creds.has_password());
/// creds.set_password("secret".to_string());
/// assert_eq!(creds.password(), Some("secret"));
/// assert!(!format!("{creds:?}").contains("secret"));
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<Option<String>>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: String, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks if password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// The password, for handing to a driver.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Replaces the password; the previous value is zeroed.
    pub fn set_password(&mut self, password: String) {
        self.password = Zeroizing::new(Some(password));
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
