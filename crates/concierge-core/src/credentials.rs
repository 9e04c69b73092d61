//! Login credentials type.

use std::fmt;

/// Login credentials for password authentication.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use concierge_core::LoginCredentials;
///
/// let creds = LoginCredentials::new("frontdesk@hotel.example", "hunter2");
/// assert_eq!(creds.identifier(), "frontdesk@hotel.example");
/// ```
#[derive(Clone)]
pub struct LoginCredentials {
    identifier: String,
    password: String,
}

impl LoginCredentials {
    /// Create new credentials.
    ///
    /// # Arguments
    ///
    /// * `identifier` - A username or email address
    /// * `password` - The account password
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Returns the identifier (username or email).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the login request.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
