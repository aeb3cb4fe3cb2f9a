//! The `list-users-in-group` command.

use adtool_core::Result;
use adtool_directory::Directory;

use crate::outcome::Outcome;

/// Printed above the member list.
pub const MEMBER_LISTING_HEADER: &str = "Users:";

/// Lists the account names of `group`'s members in server order.
///
/// The group DN is derived from the configured container rather than looked up, so an unknown
/// group lists no members.
///
/// # Errors
///
/// Returns an error if the search fails.
pub async fn list_members(directory: &mut dyn Directory, group: &str) -> Result<Outcome> {
    let group_dn = directory.layout().entry_dn(group);
    let rows = directory.list_members(&group_dn).await?;
    Ok(Outcome::Listing {
        header: MEMBER_LISTING_HEADER.to_string(),
        rows,
    })
}
