//! Command handlers.
//!
//! Each handler runs against an already-bound [`Directory`], issues its requests in order and
//! returns an [`Outcome`]. Handlers never print; the dispatcher reports for them.

mod account_state;
mod create_group;
mod create_user;
mod list_members;
mod membership;

pub use account_state::{set_account_state, AccountState};
pub use create_group::create_group;
pub use create_user::create_user;
pub use list_members::{list_members, MEMBER_LISTING_HEADER};
pub use membership::change_membership;

use adtool_core::Result;
use adtool_directory::{Directory, MembershipChange};

use crate::cli::Command;
use crate::outcome::Outcome;
use crate::password::PasswordSource;

/// Runs the handler for `command`.
///
/// # Errors
///
/// Returns an error for failures that are not directory outcomes: transport problems,
/// timeouts, malformed entries or a failed password prompt.
pub async fn execute(
    command: &Command,
    directory: &mut dyn Directory,
    passwords: &dyn PasswordSource,
) -> Result<Outcome> {
    match command {
        Command::CreateUser(args) => create_user(directory, &args.username, passwords).await,
        Command::CreateGroup(args) => create_group(directory, &args.group).await,
        Command::AddUserToGroup(args) => {
            change_membership(directory, &args.username, &args.group, MembershipChange::Add).await
        }
        Command::DeleteUserFromGroup(args) => {
            change_membership(
                directory,
                &args.username,
                &args.group,
                MembershipChange::Remove,
            )
            .await
        }
        Command::ListUsersInGroup(args) => list_members(directory, &args.group).await,
        Command::EnableUser(args) => {
            set_account_state(directory, &args.username, AccountState::Enabled).await
        }
        Command::DisableUser(args) => {
            set_account_state(directory, &args.username, AccountState::Disabled).await
        }
    }
}
