//! KIS app key / app secret pair.
//!
//! The secret is wrapped in `SecretString` so it cannot end up in logs.

use secrecy::{ExposeSecret, SecretString};

/// App credentials used to obtain access tokens and sign every request.
///
/// KIS expects both values as headers on each call, not just on the
/// token request, so the secret has to stay around for the whole session.
#[derive(Clone)]
pub struct ApiCredentials {
    app_key: String,
    app_secret: SecretString,
}

impl ApiCredentials {
    pub fn new(app_key: impl Into<String>, app_secret: SecretString) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret,
        }
    }

    /// Get the app key (public, safe to log).
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Expose the app secret for request headers.
    ///
    /// **WARNING**: never log or display the return value.
    pub fn expose_secret(&self) -> &str {
        self.app_secret.expose_secret()
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ApiCredentials {
        ApiCredentials::new("my_app_key", SecretString::from("super_secret_value".to_string()))
    }

    #[test]
    fn test_credentials_accessors() {
        let creds = creds();
        assert_eq!(creds.app_key(), "my_app_key");
        assert_eq!(creds.expose_secret(), "super_secret_value");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug_str = format!("{:?}", creds());

        assert!(debug_str.contains("my_app_key"));
        assert!(!debug_str.contains("super_secret_value"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
