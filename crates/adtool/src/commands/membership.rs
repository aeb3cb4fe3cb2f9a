//! The `add-user-to-group` and `delete-user-from-group` commands.

use adtool_core::Result;
use adtool_directory::{AccountName, Directory, MembershipChange};

use crate::outcome::{rejected, Outcome};

/// Adds `username` to, or removes it from, `group`.
///
/// Both names are resolved first; nothing is written unless both exist. Whether the user is
/// already (or still) a member is left to the server.
///
/// # Errors
///
/// Returns an error if a lookup fails or the server cannot be reached.
pub async fn change_membership(
    directory: &mut dyn Directory,
    username: &AccountName,
    group: &str,
    change: MembershipChange,
) -> Result<Outcome> {
    let Some(user) = directory.find_user(username.as_str()).await? else {
        return Ok(Outcome::not_found("User not found."));
    };
    let Some(group_entry) = directory.find_group(group).await? else {
        return Ok(Outcome::not_found("Group not found."));
    };

    match directory
        .change_membership(&group_entry.dn, &user.dn, change)
        .await
    {
        Ok(()) => Ok(Outcome::completed(match change {
            MembershipChange::Add => format!("{username} added to {group}."),
            MembershipChange::Remove => format!("{username} removed from {group}."),
        })),
        Err(err) => rejected(
            match change {
                MembershipChange::Add => "Failed to add user to group.",
                MembershipChange::Remove => "Failed to remove from group.",
            },
            err,
        ),
    }
}
