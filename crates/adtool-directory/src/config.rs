//! Connection and layout configuration for the directory client.

use crate::dn::DistinguishedName;
use adtool_core::{CredentialsFile, Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Account and password used for the initial bind.
#[derive(Debug, Clone)]
pub struct BindCredentials {
    bind_dn: String,
    bind_password: SecretString,
}

impl BindCredentials {
    /// Creates bind credentials. `bind_dn` may be a DN, `DOMAIN\user` or a UPN.
    #[must_use]
    pub fn new(bind_dn: impl Into<String>, bind_password: SecretString) -> Self {
        Self {
            bind_dn: bind_dn.into(),
            bind_password,
        }
    }

    /// Bind identity.
    #[must_use]
    pub fn bind_dn(&self) -> &str {
        &self.bind_dn
    }

    /// Bind password.
    #[must_use]
    pub fn bind_password(&self) -> &SecretString {
        &self.bind_password
    }
}

/// Where entries live and how new ones are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    base_dn: DistinguishedName,
    container_dn: DistinguishedName,
    upn_suffix: String,
}

impl DirectoryLayout {
    /// Creates a layout.
    #[must_use]
    pub fn new(
        base_dn: DistinguishedName,
        container_dn: DistinguishedName,
        upn_suffix: impl Into<String>,
    ) -> Self {
        Self {
            base_dn,
            container_dn,
            upn_suffix: upn_suffix.into(),
        }
    }

    /// Search base for every lookup.
    #[must_use]
    pub const fn base_dn(&self) -> &DistinguishedName {
        &self.base_dn
    }

    /// Container that receives new users and groups.
    #[must_use]
    pub const fn container_dn(&self) -> &DistinguishedName {
        &self.container_dn
    }

    /// Suffix for user principal names.
    #[must_use]
    pub fn upn_suffix(&self) -> &str {
        &self.upn_suffix
    }

    /// DN of an entry named `common_name` directly inside the container.
    #[must_use]
    pub fn entry_dn(&self, common_name: &str) -> DistinguishedName {
        self.container_dn.child("CN", common_name)
    }
}

/// Configuration for connecting to the directory server.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    url: String,
    credentials: BindCredentials,
    layout: DirectoryLayout,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
    connection_timeout_secs: u64,
    operation_timeout_secs: u64,
}

impl DirectoryConfig {
    /// Creates a new configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provided URL is invalid.
    pub fn new(
        url: impl Into<String>,
        credentials: BindCredentials,
        layout: DirectoryLayout,
    ) -> Result<Self> {
        let url_string = url.into();
        Url::parse(&url_string)?;

        Ok(Self {
            url: url_string,
            credentials,
            layout,
            tls_verify: true,
            tls_ca_cert: None,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        })
    }

    /// Builds the configuration described by a credentials file.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address or one of the DNs is invalid.
    pub fn from_credentials(file: &CredentialsFile) -> Result<Self> {
        let base_dn = DistinguishedName::parse(&file.base_dn)
            .map_err(|err| Error::ConfigError(format!("base_dn: {err}")))?;
        let container_dn = DistinguishedName::parse(file.container_dn())
            .map_err(|err| Error::ConfigError(format!("users_container: {err}")))?;
        let layout = DirectoryLayout::new(base_dn, container_dn, file.upn_suffix.clone());
        let credentials = BindCredentials::new(file.username.clone(), file.password().clone());

        let mut config = Self::new(file.server_url()?, credentials, layout)?
            .with_tls_verification(file.tls_verify)
            .with_connection_timeout_secs(file.connection_timeout_secs)
            .with_operation_timeout_secs(file.operation_timeout_secs);
        if let Some(path) = &file.tls_ca_cert {
            config = config.with_tls_ca_cert(path.clone());
        }
        Ok(config)
    }

    /// Returns the directory endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the bind credentials.
    #[must_use]
    pub const fn credentials(&self) -> &BindCredentials {
        &self.credentials
    }

    /// Returns the directory layout.
    #[must_use]
    pub const fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }
}
