//! Credentials file handling.
//!
//! The tool reads a single JSON document at startup describing which domain controller to talk to
//! and which account to bind with. Only `dc_ip`, `username` and `password` are required; the
//! remaining keys override the directory layout and connection settings.
//!
//! ```json
//! {
//!   "dc_ip": "10.0.0.10",
//!   "username": "LAB\\Administrator",
//!   "password": "..."
//! }
//! ```

use crate::Error;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;
use validator::Validate;

/// Default location of the credentials file, relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
/// Default search base.
pub const DEFAULT_BASE_DN: &str = "DC=lab,DC=local";
/// Default container for new users and groups, relative to the base DN.
pub const DEFAULT_USERS_CONTAINER: &str = "CN=Users";
/// Default user principal name suffix.
pub const DEFAULT_UPN_SUFFIX: &str = "lab.local";

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct RawCredentials {
    #[validate(length(min = 1, message = "dc_ip must not be empty"))]
    dc_ip: String,

    #[validate(length(min = 1, message = "username must not be empty"))]
    username: String,

    #[validate(length(min = 1, message = "password must not be empty"))]
    password: String,

    #[validate(length(min = 1))]
    #[serde(default = "default_base_dn")]
    base_dn: String,

    #[validate(length(min = 1))]
    #[serde(default = "default_users_container")]
    users_container: String,

    #[validate(length(min = 1))]
    #[serde(default = "default_upn_suffix")]
    upn_suffix: String,

    #[serde(default)]
    use_ldaps: bool,

    #[serde(default = "default_tls_verify")]
    tls_verify: bool,

    #[serde(default)]
    tls_ca_cert: Option<PathBuf>,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    connection_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    operation_timeout_secs: u64,
}

fn default_base_dn() -> String {
    DEFAULT_BASE_DN.to_string()
}

fn default_users_container() -> String {
    DEFAULT_USERS_CONTAINER.to_string()
}

fn default_upn_suffix() -> String {
    DEFAULT_UPN_SUFFIX.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    10
}

const fn default_operation_timeout_secs() -> u64 {
    30
}

/// Parsed and validated credentials file.
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    /// Domain controller address (host, host:port, or a full `ldap://` / `ldaps://` URL).
    pub dc_ip: String,
    /// Account used for the bind (DN, `DOMAIN\user` or UPN).
    pub username: String,
    password: SecretString,
    /// Search base for every lookup.
    pub base_dn: String,
    /// Container holding users and groups, relative to `base_dn`.
    pub users_container: String,
    /// Suffix appended to account names to form the user principal name.
    pub upn_suffix: String,
    /// Connect with LDAPS when `dc_ip` carries no scheme.
    pub use_ldaps: bool,
    /// Whether to verify the server certificate.
    pub tls_verify: bool,
    /// Optional custom CA certificate.
    pub tls_ca_cert: Option<PathBuf>,
    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
    /// Per-request timeout in seconds.
    pub operation_timeout_secs: u64,
}

impl CredentialsFile {
    /// Reads and validates the credentials file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file is missing, unreadable, not valid JSON, or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!("Loading credentials from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read credentials file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parses and validates a credentials document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the document is malformed or fails validation.
    pub fn from_json(contents: &str) -> Result<Self, Error> {
        let raw: RawCredentials = serde_json::from_str(contents)?;
        raw.validate()?;

        let credentials = Self {
            dc_ip: raw.dc_ip.trim().to_string(),
            username: raw.username,
            password: SecretString::from(raw.password),
            base_dn: raw.base_dn,
            users_container: raw.users_container,
            upn_suffix: raw.upn_suffix,
            use_ldaps: raw.use_ldaps,
            tls_verify: raw.tls_verify,
            tls_ca_cert: raw.tls_ca_cert,
            connection_timeout_secs: raw.connection_timeout_secs,
            operation_timeout_secs: raw.operation_timeout_secs,
        };
        credentials.server_url()?;
        Ok(credentials)
    }

    /// Bind password.
    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Builds the LDAP URL for the configured domain controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the resulting URL cannot be parsed.
    pub fn server_url(&self) -> Result<String, Error> {
        let url = if self.dc_ip.contains("://") {
            self.dc_ip.clone()
        } else if self.use_ldaps {
            format!("ldaps://{}", self.dc_ip)
        } else {
            format!("ldap://{}", self.dc_ip)
        };

        let parsed = Url::parse(&url)?;
        match parsed.scheme() {
            "ldap" | "ldaps" | "ldapi" => Ok(url),
            other => Err(Error::ConfigError(format!(
                "unsupported directory URL scheme `{other}`"
            ))),
        }
    }

    /// Full DN of the users container (`users_container` joined with `base_dn`).
    #[must_use]
    pub fn container_dn(&self) -> String {
        format!("{},{}", self.users_container, self.base_dn)
    }
}
