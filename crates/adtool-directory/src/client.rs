//! Directory client implementation.

use crate::{
    account_control::{AccountControl, ACCOUNT_CONTROL_ATTRIBUTE},
    config::{DirectoryConfig, DirectoryLayout},
    dn::DistinguishedName,
    filter,
    group::{GroupEntry, MembershipChange, NewGroup, MEMBER_ATTRIBUTE},
    user::{NewUser, UserEntry},
    Result,
};
use adtool_core::Error;
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope, SearchEntry};
use native_tls::{Certificate, TlsConnector};
use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

const USER_ATTRIBUTES: &[&str] = &["sAMAccountName", "distinguishedName", "userAccountControl"];

const GROUP_ATTRIBUTES: &[&str] = &["sAMAccountName", "distinguishedName"];

const MEMBER_LISTING_ATTRIBUTES: &[&str] = &["sAMAccountName"];

const PASSWORD_ATTRIBUTE: &str = "unicodePwd";

const SERVICE_NAME: &str = "directory";

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// LDAP entry representation used by the client.
#[derive(Debug, Clone, Default)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values preserved order from server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Returns all values for the attribute; names match case-insensitively.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, values)| values.as_slice())
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }
}

/// LDAP modification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryModification {
    /// Add attribute values.
    Add {
        /// Attribute to modify.
        attribute: String,
        /// Values to add.
        values: Vec<String>,
    },
    /// Delete attribute values.
    Delete {
        /// Attribute to modify.
        attribute: String,
        /// Values to delete (empty removes attribute).
        values: Vec<String>,
    },
    /// Replace attribute values.
    Replace {
        /// Attribute to modify.
        attribute: String,
        /// Replacement values.
        values: Vec<String>,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>>;
    async fn add(&mut self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<()>;
    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()>;
    async fn set_password(&mut self, dn: &str, password: &SecretString) -> Result<()>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Directory operations needed by the administration commands.
///
/// Every method issues exactly one request. Writes surface a non-zero result code as
/// [`Error::DirectoryRejected`] carrying the server's diagnostic text.
#[async_trait]
pub trait Directory: Send {
    /// Where entries live and how new ones are named.
    fn layout(&self) -> &DirectoryLayout;

    /// Looks up a user by `sAMAccountName`.
    async fn find_user(&mut self, account_name: &str) -> Result<Option<UserEntry>>;

    /// Looks up a group by `sAMAccountName`.
    async fn find_group(&mut self, name: &str) -> Result<Option<GroupEntry>>;

    /// Adds a new user entry.
    async fn create_user(&mut self, user: &NewUser) -> Result<()>;

    /// Adds a new group entry.
    async fn create_group(&mut self, group: &NewGroup) -> Result<()>;

    /// Sets the password of a user entry.
    async fn set_password(&mut self, user_dn: &DistinguishedName, password: &SecretString)
        -> Result<()>;

    /// Replaces `userAccountControl` on a user entry.
    async fn replace_account_control(
        &mut self,
        user_dn: &DistinguishedName,
        value: AccountControl,
    ) -> Result<()>;

    /// Adds or removes one member DN on a group, leaving other members untouched.
    async fn change_membership(
        &mut self,
        group_dn: &DistinguishedName,
        member_dn: &DistinguishedName,
        change: MembershipChange,
    ) -> Result<()>;

    /// Account names of entries whose `memberOf` contains `group_dn`, in server order.
    async fn list_members(&mut self, group_dn: &DistinguishedName) -> Result<Vec<String>>;
}

/// A bound directory connection.
///
/// Created by [`DirectoryClient::connect`], which binds with the configured credentials; release
/// it with [`DirectoryClient::unbind`].
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    session: Box<dyn LdapSession>,
}

impl DirectoryClient {
    /// Connects to the configured server and binds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindFailed`] if the server is unreachable or refuses the credentials.
    pub async fn connect(config: DirectoryConfig) -> Result<Self> {
        let config = Arc::new(config);
        let connector = RealLdapConnector::new(config.clone());
        Self::connect_with(config, &connector).await
    }

    pub(crate) async fn connect_with(
        config: Arc<DirectoryConfig>,
        connector: &dyn LdapConnector,
    ) -> Result<Self> {
        debug!("Connecting to {}", config.url());
        let mut session = connector
            .connect()
            .await
            .map_err(|err| Error::BindFailed(err.to_string()))?;

        let credentials = config.credentials();
        if let Err(err) = session
            .simple_bind(
                credentials.bind_dn(),
                credentials.bind_password().expose_secret(),
            )
            .await
        {
            if let Err(unbind_err) = session.unbind().await {
                debug!("Unbind after failed bind also failed: {unbind_err}");
            }
            return Err(Error::BindFailed(err.to_string()));
        }

        debug!("Bound to {} as {}", config.url(), credentials.bind_dn());
        Ok(Self { config, session })
    }

    /// Returns the configuration this client was created with.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the unbind request could not be sent.
    pub async fn unbind(mut self) -> Result<()> {
        self.session.unbind().await?;
        debug!("Unbound from {}", self.config.url());
        Ok(())
    }

    async fn search_base(
        &mut self,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>> {
        let base_dn = self.config.layout().base_dn().as_str().to_string();
        debug!("Searching {base_dn} for {filter}");
        self.session
            .search(&base_dn, SearchScope::Subtree, filter, attributes)
            .await
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    fn layout(&self) -> &DirectoryLayout {
        self.config.layout()
    }

    async fn find_user(&mut self, account_name: &str) -> Result<Option<UserEntry>> {
        let filter = filter::equality("sAMAccountName", account_name);
        let entries = self.search_base(&filter, USER_ATTRIBUTES).await?;
        if entries.len() > 1 {
            warn!(
                "{} entries match account name `{account_name}`, using the first",
                entries.len()
            );
        }

        entries
            .first()
            .map(|entry| parse_user_entry(entry, account_name))
            .transpose()
    }

    async fn find_group(&mut self, name: &str) -> Result<Option<GroupEntry>> {
        let filter = filter::and([
            filter::equality("objectClass", "group"),
            filter::equality("sAMAccountName", name),
        ]);
        let entries = self.search_base(&filter, GROUP_ATTRIBUTES).await?;

        entries
            .first()
            .map(|entry| parse_group_entry(entry, name))
            .transpose()
    }

    async fn create_user(&mut self, user: &NewUser) -> Result<()> {
        debug!("Adding user entry {}", user.dn);
        self.session.add(user.dn.as_str(), &user.attributes()).await
    }

    async fn create_group(&mut self, group: &NewGroup) -> Result<()> {
        debug!("Adding group entry {}", group.dn);
        self.session.add(group.dn.as_str(), &group.attributes()).await
    }

    async fn set_password(
        &mut self,
        user_dn: &DistinguishedName,
        password: &SecretString,
    ) -> Result<()> {
        debug!("Setting password on {user_dn}");
        self.session.set_password(user_dn.as_str(), password).await
    }

    async fn replace_account_control(
        &mut self,
        user_dn: &DistinguishedName,
        value: AccountControl,
    ) -> Result<()> {
        debug!("Setting {ACCOUNT_CONTROL_ATTRIBUTE}={value} on {user_dn}");
        self.session
            .modify(
                user_dn.as_str(),
                &[DirectoryModification::Replace {
                    attribute: ACCOUNT_CONTROL_ATTRIBUTE.to_string(),
                    values: vec![value.to_attribute_value()],
                }],
            )
            .await
    }

    async fn change_membership(
        &mut self,
        group_dn: &DistinguishedName,
        member_dn: &DistinguishedName,
        change: MembershipChange,
    ) -> Result<()> {
        let attribute = MEMBER_ATTRIBUTE.to_string();
        let values = vec![member_dn.as_str().to_string()];
        let modification = match change {
            MembershipChange::Add => DirectoryModification::Add { attribute, values },
            MembershipChange::Remove => DirectoryModification::Delete { attribute, values },
        };
        debug!("{change:?} {member_dn} on {group_dn}");
        self.session
            .modify(group_dn.as_str(), &[modification])
            .await
    }

    async fn list_members(&mut self, group_dn: &DistinguishedName) -> Result<Vec<String>> {
        let filter = filter::equality("memberOf", group_dn.as_str());
        let entries = self.search_base(&filter, MEMBER_LISTING_ATTRIBUTES).await?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let name = entry.first("sAMAccountName").map(str::to_owned);
                if name.is_none() {
                    warn!("Member entry {} has no sAMAccountName", entry.dn);
                }
                name
            })
            .collect())
    }
}

/// Real LDAP connector backed by `ldap3`.
pub struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, self.config.url())
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = timeout(self.operation_timeout, self.inner.simple_bind(dn, password))
            .await
            .map_err(|_| timed_out("bind"))?
            .map_err(map_ldap_error)?;
        ensure_ldap_success(result)
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>> {
        let result = timeout(
            self.operation_timeout,
            self.inner
                .search(base_dn, scope.into(), filter, attributes.to_vec()),
        )
        .await
        .map_err(|_| timed_out("search"))?
        .map_err(map_ldap_error)?;
        let (entries, _) = result.success().map_err(map_ldap_error)?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_ref())
            .map(SearchEntry::construct)
            .map(|entry| LdapEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect())
    }

    async fn add(&mut self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<()> {
        let attrs = attributes
            .iter()
            .map(|(attribute, values)| {
                (
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                )
            })
            .collect::<Vec<_>>();

        let result = timeout(self.operation_timeout, self.inner.add(dn, attrs))
            .await
            .map_err(|_| timed_out("add"))?
            .map_err(map_ldap_error)?;
        ensure_ldap_success(result)
    }

    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        let mods = modifications
            .iter()
            .map(|m| match m {
                DirectoryModification::Add { attribute, values } => Mod::Add(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Delete { attribute, values } => Mod::Delete(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Replace { attribute, values } => Mod::Replace(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
            })
            .collect::<Vec<_>>();

        let result = timeout(self.operation_timeout, self.inner.modify(dn, mods))
            .await
            .map_err(|_| timed_out("modify"))?
            .map_err(map_ldap_error)?;
        ensure_ldap_success(result)
    }

    async fn set_password(&mut self, dn: &str, password: &SecretString) -> Result<()> {
        let encoded = encode_unicode_password(password.expose_secret());
        let mods = vec![Mod::Replace(
            PASSWORD_ATTRIBUTE.as_bytes().to_vec(),
            HashSet::from([encoded]),
        )];

        let result = timeout(self.operation_timeout, self.inner.modify(dn, mods))
            .await
            .map_err(|_| timed_out("password set"))?
            .map_err(map_ldap_error)?;
        ensure_ldap_success(result)
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| timed_out("unbind"))?
            .map_err(map_ldap_error)?;
        Ok(())
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    if !config.tls_verify() {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

fn map_ldap_error(err: LdapError) -> Error {
    match err {
        LdapError::LdapResult { result } => Error::rejected(result.rc, result.text),
        other => Error::ExternalServiceError {
            service: SERVICE_NAME.to_string(),
            message: other.to_string(),
        },
    }
}

fn ensure_ldap_success(result: ldap3::LdapResult) -> Result<()> {
    result.success().map(|_| ()).map_err(map_ldap_error)
}

fn timed_out(operation: &str) -> Error {
    Error::Timeout(format!("{SERVICE_NAME} {operation} timed out"))
}

/// `unicodePwd` wants the password in double quotes, encoded as UTF-16LE.
fn encode_unicode_password(password: &str) -> Vec<u8> {
    format!("\"{password}\"")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn parse_user_entry(entry: &LdapEntry, searched: &str) -> Result<UserEntry> {
    let dn = DistinguishedName::parse(&entry.dn)?;
    let account_name = entry.first("sAMAccountName").unwrap_or(searched).to_string();
    let account_control = entry
        .first(ACCOUNT_CONTROL_ATTRIBUTE)
        .map(AccountControl::parse)
        .transpose()?;

    Ok(UserEntry {
        dn,
        account_name,
        account_control,
    })
}

fn parse_group_entry(entry: &LdapEntry, searched: &str) -> Result<GroupEntry> {
    let dn = DistinguishedName::parse(&entry.dn)?;
    let name = entry.first("sAMAccountName").unwrap_or(searched).to_string();
    Ok(GroupEntry { dn, name })
}
