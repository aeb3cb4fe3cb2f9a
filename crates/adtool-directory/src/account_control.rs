//! The `userAccountControl` bitmask.
//!
//! Flags are cumulative; enabling or disabling an account flips [`AccountControl::ACCOUNT_DISABLE`]
//! and nothing else.

use std::fmt;

use adtool_core::{Error, Result};

/// Attribute name on user entries.
pub const ACCOUNT_CONTROL_ATTRIBUTE: &str = "userAccountControl";

/// Value of the `userAccountControl` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountControl(u32);

impl AccountControl {
    /// The logon script is executed.
    pub const SCRIPT: u32 = 0x0001;
    /// The account is disabled.
    pub const ACCOUNT_DISABLE: u32 = 0x0002;
    /// The home directory is required.
    pub const HOMEDIR_REQUIRED: u32 = 0x0008;
    /// The account is locked out.
    pub const LOCKOUT: u32 = 0x0010;
    /// No password is required.
    pub const PASSWD_NOTREQD: u32 = 0x0020;
    /// The user cannot change the password.
    pub const PASSWD_CANT_CHANGE: u32 = 0x0040;
    /// Default account type for a typical user.
    pub const NORMAL_ACCOUNT: u32 = 0x0200;
    /// The password never expires.
    pub const DONT_EXPIRE_PASSWORD: u32 = 0x0001_0000;
    /// Smart card logon is required.
    pub const SMARTCARD_REQUIRED: u32 = 0x0004_0000;
    /// The password has expired.
    pub const PASSWORD_EXPIRED: u32 = 0x0080_0000;

    /// Wraps a raw attribute value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// A normal, enabled user account (512).
    #[must_use]
    pub const fn normal_account() -> Self {
        Self(Self::NORMAL_ACCOUNT)
    }

    /// Parses the attribute value as returned by the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] when the value is not a decimal integer. Active Directory
    /// stores the attribute as a signed 32-bit integer, so negative values are reinterpreted.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        trimmed
            .parse::<u32>()
            .or_else(|_| {
                trimmed
                    .parse::<i32>()
                    .map(|signed| u32::from_ne_bytes(signed.to_ne_bytes()))
            })
            .map(Self)
            .map_err(|_| {
                Error::InvalidEntry(format!(
                    "{ACCOUNT_CONTROL_ATTRIBUTE} value `{value}` is not an integer"
                ))
            })
    }

    /// Raw value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Returns true if the account is disabled.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.contains(Self::ACCOUNT_DISABLE)
    }

    /// Same value with the disable bit cleared.
    #[must_use]
    pub const fn enabled(self) -> Self {
        Self(self.0 & !Self::ACCOUNT_DISABLE)
    }

    /// Same value with the disable bit set.
    #[must_use]
    pub const fn disabled(self) -> Self {
        Self(self.0 | Self::ACCOUNT_DISABLE)
    }

    /// Sets or clears the disable bit.
    #[must_use]
    pub const fn with_disabled(self, disabled: bool) -> Self {
        if disabled {
            self.disabled()
        } else {
            self.enabled()
        }
    }

    /// Attribute value as sent to the server, in the signed form the attribute is stored as.
    #[must_use]
    pub fn to_attribute_value(self) -> String {
        i32::from_ne_bytes(self.0.to_ne_bytes()).to_string()
    }
}

impl fmt::Display for AccountControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08x})", self.0, self.0)
    }
}
