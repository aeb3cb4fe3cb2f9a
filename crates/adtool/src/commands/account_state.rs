//! The `enable-user` and `disable-user` commands.

use std::fmt;

use adtool_core::Result;
use adtool_directory::{AccountName, Directory};
use tracing::debug;

use crate::outcome::{rejected, Outcome};

/// Desired state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// Logons allowed.
    Enabled,
    /// Logons refused.
    Disabled,
}

impl AccountState {
    const fn verb(self) -> &'static str {
        match self {
            Self::Enabled => "enable",
            Self::Disabled => "disable",
        }
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("enabled"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

/// Enables or disables `username`, leaving every other `userAccountControl` flag as it was.
///
/// # Errors
///
/// Returns an error if the lookup fails or the entry has no usable `userAccountControl`.
pub async fn set_account_state(
    directory: &mut dyn Directory,
    username: &AccountName,
    state: AccountState,
) -> Result<Outcome> {
    let Some(user) = directory.find_user(username.as_str()).await? else {
        return Ok(Outcome::not_found("User not found."));
    };

    let current = user.require_account_control()?;
    let updated = current.with_disabled(state == AccountState::Disabled);
    debug!("{username}: userAccountControl {current} -> {updated}");

    match directory.replace_account_control(&user.dn, updated).await {
        Ok(()) => Ok(Outcome::completed(format!("{username} {state}."))),
        Err(err) => rejected(format!("Failed to {} user.", state.verb()), err),
    }
}
