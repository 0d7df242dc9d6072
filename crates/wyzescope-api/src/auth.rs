// Credentials and session types for the Wyze cloud login exchange.
//
// The login endpoint takes an api-key/key-id header pair plus a
// triple-MD5 hashed password and returns access/refresh tokens. Token
// state lives inside `WyzeClient`; nothing else mutates it.

use secrecy::{ExposeSecret, SecretString};

/// Account credentials for the login exchange.
///
/// Secret material is wrapped in [`SecretString`] so it never shows up
/// in debug output or serialized payloads by accident. Credentials are
/// supplied once per run and never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
    pub key_id: String,
    pub api_key: SecretString,
}

impl Credentials {
    /// Returns an error message naming the first missing field, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("email is empty".into());
        }
        if self.password.expose_secret().is_empty() {
            return Err("password is empty".into());
        }
        if self.key_id.trim().is_empty() {
            return Err("key_id is empty".into());
        }
        if self.api_key.expose_secret().is_empty() {
            return Err("api_key is empty".into());
        }
        Ok(())
    }
}

/// Tokens returned by the login/refresh exchange.
///
/// Owned exclusively by [`WyzeClient`](crate::client::WyzeClient);
/// mutated only by login and refresh, invalidated and re-acquired on
/// authentication failure.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
}

/// Hash a password the way the vendor's mobile app does: MD5 run three
/// times over the ASCII bytes.
///
/// Inputs prefixed `hashed:` or `md5:` are treated as already hashed
/// and passed through, so a captured hash can be reused without the
/// cleartext password.
pub fn hash_password(password: &str) -> String {
    let trimmed = password.trim();
    for prefix in ["hashed:", "md5:"] {
        if trimmed.to_ascii_lowercase().starts_with(prefix) {
            return trimmed[prefix.len()..].to_owned();
        }
    }
    let mut encoded = trimmed.to_owned();
    for _ in 0..3 {
        encoded = format!("{:x}", md5::compute(encoded.as_bytes()));
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_password_is_triple_md5() {
        // md5("a") = 0cc175..., applied three times.
        let once = format!("{:x}", md5::compute(b"a"));
        let twice = format!("{:x}", md5::compute(once.as_bytes()));
        let thrice = format!("{:x}", md5::compute(twice.as_bytes()));
        assert_eq!(hash_password("a"), thrice);
    }

    #[test]
    fn hash_password_passes_through_prehashed() {
        assert_eq!(hash_password("hashed:abc123"), "abc123");
        assert_eq!(hash_password("md5:abc123"), "abc123");
        assert_eq!(hash_password("MD5:abc123"), "abc123");
    }

    #[test]
    fn hash_password_trims_whitespace() {
        assert_eq!(hash_password(" secret "), hash_password("secret"));
    }

    #[test]
    fn credentials_validate_reports_missing_fields() {
        let creds = Credentials {
            email: String::new(),
            password: "pw".to_string().into(),
            key_id: "kid".into(),
            api_key: "ak".to_string().into(),
        };
        assert!(creds.validate().is_err());

        let creds = Credentials {
            email: "user@example.com".into(),
            password: "pw".to_string().into(),
            key_id: "kid".into(),
            api_key: "ak".to_string().into(),
        };
        assert!(creds.validate().is_ok());
    }
}
