//! Connection settings resolved from `SW360_*` environment variables and an optional dotenv file.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const ENV_PREFIX: &str = "SW360_";

pub const DEFAULT_HOST: &str = "http://localhost:8080";
pub const DEFAULT_COUCHDB_HOST: &str = "http://localhost:5984";
pub const DEFAULT_COUCHDB_USER: &str = "admin";
pub const DEFAULT_COUCHDB_PASSWORD: &str = "password";

/// Everything needed to reach the SW360 REST API and its `CouchDB` document store.
///
/// Built once at startup and handed to each command; never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub couchdb_host: String,
    pub couchdb_user: String,
    pub couchdb_password: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("couchdb_host", &self.couchdb_host)
            .field("couchdb_user", &self.couchdb_user)
            .field("couchdb_password", &"<redacted>")
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Resolve settings through `lookup`, which receives fully-prefixed keys (`SW360_HOST`, ...).
    ///
    /// Empty admin user/password values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));
        Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            user: get("USER").filter(|v| !v.is_empty()),
            password: get("PASSWORD").filter(|v| !v.is_empty()),
            couchdb_host: get("COUCHDB_HOST").unwrap_or_else(|| DEFAULT_COUCHDB_HOST.to_string()),
            couchdb_user: get("COUCHDB_USER").unwrap_or_else(|| DEFAULT_COUCHDB_USER.to_string()),
            couchdb_password: get("COUCHDB_PASSWORD")
                .unwrap_or_else(|| DEFAULT_COUCHDB_PASSWORD.to_string()),
        }
    }

    /// Load from the process environment, falling back to `env_file` and then to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the env file exists but cannot be read or parsed.
    pub fn load(env_file: &Path) -> Result<Self> {
        let file = load_env_file(env_file)?;
        Ok(Self::from_lookup(|key| {
            std::env::var(key).ok().or_else(|| file.get(key).cloned())
        }))
    }

    /// The SW360 admin credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either the user or the password is missing.
    pub fn admin_credentials(&self) -> Result<BasicCredentials> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Ok(BasicCredentials::new(user, password))
            }
            _ => Err(Error::Config("User and Password not provided.".to_string())),
        }
    }

    /// The `CouchDB` credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either value was explicitly set to an empty string.
    pub fn couchdb_credentials(&self) -> Result<BasicCredentials> {
        if self.couchdb_user.is_empty() || self.couchdb_password.is_empty() {
            return Err(Error::Config(
                "CouchDB user and password not provided.".to_string(),
            ));
        }
        Ok(BasicCredentials::new(
            &self.couchdb_user,
            &self.couchdb_password,
        ))
    }
}

/// A username/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read a dotenv file into a key/value map without touching the process environment.
///
/// A missing file yields an empty map.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or contains a malformed line.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(HashMap::new());
        }
        Err(e) => {
            return Err(Error::Config(format!(
                "read env file {}: {e}",
                path.display()
            )));
        }
    };
    iter.map(|item| {
        item.map_err(|e| Error::Config(format!("parse env file {}: {e}", path.display())))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::default();
        assert_eq!(settings.host, "http://localhost:8080");
        assert_eq!(settings.user, None);
        assert_eq!(settings.password, None);
        assert_eq!(settings.couchdb_host, "http://localhost:5984");
        assert_eq!(settings.couchdb_user, "admin");
        assert_eq!(settings.couchdb_password, "password");
    }

    #[test]
    fn keys_are_prefixed_and_case_sensitive() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SW360_HOST", "https://sw360.example.com"),
            ("SW360_USER", "admin@sw360.org"),
            ("sw360_PASSWORD", "ignored"),
        ]));
        assert_eq!(settings.host, "https://sw360.example.com");
        assert_eq!(settings.user.as_deref(), Some("admin@sw360.org"));
        assert_eq!(settings.password, None);
    }

    #[test]
    fn empty_admin_values_count_as_missing() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SW360_USER", ""),
            ("SW360_PASSWORD", "secret"),
        ]));
        let err = settings.admin_credentials().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("User and Password not provided."));
    }

    #[test]
    fn empty_couchdb_password_is_rejected() {
        let settings = Settings::from_lookup(lookup_from(&[("SW360_COUCHDB_PASSWORD", "")]));
        assert!(matches!(
            settings.couchdb_credentials(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = BasicCredentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn settings_debug_hides_both_passwords() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SW360_USER", "admin@sw360.org"),
            ("SW360_PASSWORD", "hunter2"),
            ("SW360_COUCHDB_PASSWORD", "couchsecret"),
        ]));
        let rendered = format!("{settings:?}");
        assert!(rendered.contains("admin@sw360.org"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("couchsecret"));
    }

    #[test]
    fn env_file_missing_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = load_env_file(&dir.path().join("absent.env")).expect("missing file is fine");
        assert!(map.is_empty());
    }

    #[test]
    fn env_file_values_are_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "SW360_USER=setup@sw360.org\nSW360_PASSWORD=\"s3cr3t #1\"\n# comment\n",
        )
        .expect("write env file");

        let file = load_env_file(&path).expect("parse env file");
        let settings = Settings::from_lookup(|key| file.get(key).cloned());
        assert_eq!(settings.user.as_deref(), Some("setup@sw360.org"));
        assert_eq!(settings.password.as_deref(), Some("s3cr3t #1"));
    }
}
