//! The `create-group` command.

use adtool_core::Result;
use adtool_directory::{Directory, NewGroup};

use crate::outcome::{rejected, Outcome};

/// Creates a group. Duplicates are left to the server to refuse.
///
/// # Errors
///
/// Returns an error for failures other than a directory rejection.
pub async fn create_group(directory: &mut dyn Directory, name: &str) -> Result<Outcome> {
    let group = NewGroup::new(name, directory.layout());
    match directory.create_group(&group).await {
        Ok(()) => Ok(Outcome::completed(format!(
            "Group {name} created successfully."
        ))),
        Err(err) => rejected("Group creation failed.", err),
    }
}
