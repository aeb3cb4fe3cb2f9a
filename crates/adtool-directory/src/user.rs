//! User accounts: account names, entries read from the directory, and new-account requests.

use std::fmt;
use std::str::FromStr;

use crate::account_control::AccountControl;
use crate::config::DirectoryLayout;
use crate::dn::DistinguishedName;
use adtool_core::Error;

/// Object classes written on new user entries.
pub const USER_OBJECT_CLASSES: &[&str] = &["top", "person", "organizationalPerson", "user"];

/// A `First.Last` account name.
///
/// Exactly one dot, with a non-empty first and last name on either side and no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountName {
    raw: String,
    split: usize,
}

impl AccountName {
    /// Validates and wraps an account name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the value is not of the form `First.Last`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let invalid =
            |reason: &str| Error::InvalidInput(format!("`{input}` is not First.Last: {reason}"));

        if input.chars().any(char::is_whitespace) {
            return Err(invalid("whitespace is not allowed"));
        }
        let split = input
            .find('.')
            .ok_or_else(|| invalid("missing separating dot"))?;
        let (first, last) = (&input[..split], &input[split + 1..]);
        if last.contains('.') {
            return Err(invalid("more than one dot"));
        }
        if first.is_empty() || last.is_empty() {
            return Err(invalid("first and last name must both be present"));
        }

        Ok(Self {
            raw: input.to_string(),
            split,
        })
    }

    /// The account name as typed (`First.Last`), used for `sAMAccountName`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// First name.
    #[must_use]
    pub fn first(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Last name.
    #[must_use]
    pub fn last(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// `First Last`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first(), self.last())
    }

    /// `First.Last@suffix`.
    #[must_use]
    pub fn principal_name(&self, suffix: &str) -> String {
        format!("{}@{suffix}", self.raw)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for AccountName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A user entry as found by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    /// Distinguished name of the entry.
    pub dn: DistinguishedName,
    /// `sAMAccountName`.
    pub account_name: String,
    /// `userAccountControl`, when the server returned one.
    pub account_control: Option<AccountControl>,
}

impl UserEntry {
    /// Current account control value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] when the entry carries no `userAccountControl`.
    pub fn require_account_control(&self) -> Result<AccountControl, Error> {
        self.account_control.ok_or_else(|| {
            Error::InvalidEntry(format!(
                "user `{}` ({}) has no userAccountControl value",
                self.account_name, self.dn
            ))
        })
    }
}

/// Attributes of an account about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Account name the entry is created for.
    pub account: AccountName,
    /// DN under the configured container, named after the display name.
    pub dn: DistinguishedName,
    /// `First Last`.
    pub display_name: String,
    /// `First.Last@suffix`.
    pub principal_name: String,
}

impl NewUser {
    /// Derives every attribute of the new entry from the account name and layout.
    #[must_use]
    pub fn new(account: AccountName, layout: &DirectoryLayout) -> Self {
        let display_name = account.display_name();
        Self {
            dn: layout.entry_dn(&display_name),
            principal_name: account.principal_name(layout.upn_suffix()),
            display_name,
            account,
        }
    }

    /// Attribute map for the add request, object classes included.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, Vec<String>)> {
        vec![
            (
                "objectClass".to_string(),
                USER_OBJECT_CLASSES.iter().map(|c| (*c).to_string()).collect(),
            ),
            (
                "sAMAccountName".to_string(),
                vec![self.account.as_str().to_string()],
            ),
            (
                "userPrincipalName".to_string(),
                vec![self.principal_name.clone()],
            ),
            ("givenName".to_string(), vec![self.account.first().to_string()]),
            ("sn".to_string(), vec![self.account.last().to_string()]),
            ("displayName".to_string(), vec![self.display_name.clone()]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> DirectoryLayout {
        DirectoryLayout::new(
            DistinguishedName::parse("DC=lab,DC=local").unwrap(),
            DistinguishedName::parse("CN=Users,DC=lab,DC=local").unwrap(),
            "lab.local",
        )
    }

    #[test]
    fn parse_first_last() {
        let name = AccountName::parse("Jack.Reacher").unwrap();
        assert_eq!(name.first(), "Jack");
        assert_eq!(name.last(), "Reacher");
        assert_eq!(name.display_name(), "Jack Reacher");
        assert_eq!(name.principal_name("lab.local"), "Jack.Reacher@lab.local");
    }

    #[test]
    fn reject_malformed_names() {
        for input in ["JackReacher", "Jack.", ".Reacher", "Jack.R.Reacher", "Jack .Reacher", ""] {
            assert!(
                matches!(AccountName::parse(input), Err(Error::InvalidInput(_))),
                "`{input}` should be rejected"
            );
        }
    }

    #[test]
    fn new_user_attributes() {
        let user = NewUser::new(AccountName::parse("Jack.Reacher").unwrap(), &layout());
        assert_eq!(user.dn.as_str(), "CN=Jack Reacher,CN=Users,DC=lab,DC=local");

        let attributes = user.attributes();
        let get = |name: &str| {
            attributes
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, values)| values.clone())
                .unwrap()
        };
        assert_eq!(
            get("objectClass"),
            vec!["top", "person", "organizationalPerson", "user"]
        );
        assert_eq!(get("sAMAccountName"), vec!["Jack.Reacher"]);
        assert_eq!(get("userPrincipalName"), vec!["Jack.Reacher@lab.local"]);
        assert_eq!(get("givenName"), vec!["Jack"]);
        assert_eq!(get("sn"), vec!["Reacher"]);
        assert_eq!(get("displayName"), vec!["Jack Reacher"]);
    }

    #[test]
    fn missing_account_control_is_invalid_entry() {
        let entry = UserEntry {
            dn: DistinguishedName::parse("CN=Jack Reacher,CN=Users,DC=lab,DC=local").unwrap(),
            account_name: "Jack.Reacher".to_string(),
            account_control: None,
        };
        assert!(matches!(
            entry.require_account_control(),
            Err(Error::InvalidEntry(_))
        ));
    }
}
