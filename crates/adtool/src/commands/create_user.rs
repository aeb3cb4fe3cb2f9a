//! The `create-user` command.

use adtool_core::Result;
use adtool_directory::{AccountControl, AccountName, Directory, NewUser};
use tracing::debug;

use crate::outcome::{rejected, Outcome};
use crate::password::PasswordSource;

/// Creates `username`, sets its password and enables it.
///
/// An existing account with the same name is left alone. The password is only asked for once the
/// add has succeeded; a cancelled prompt leaves the new entry disabled.
///
/// # Errors
///
/// Returns an error if the lookup fails or no password could be obtained.
pub async fn create_user(
    directory: &mut dyn Directory,
    username: &AccountName,
    passwords: &dyn PasswordSource,
) -> Result<Outcome> {
    if let Some(existing) = directory.find_user(username.as_str()).await? {
        debug!("{username} already present at {}", existing.dn);
        return Ok(Outcome::AlreadyExists {
            message: "User already exists.".to_string(),
        });
    }

    let user = NewUser::new(username.clone(), directory.layout());

    if let Err(err) = directory.create_user(&user).await {
        return rejected("User creation failed.", err);
    }
    debug!("Created {}", user.dn);

    let password = passwords.new_password(username)?;
    if let Err(err) = directory.set_password(&user.dn, &password).await {
        return rejected(
            format!("User {username} was created, but setting its password failed."),
            err,
        );
    }

    if let Err(err) = directory
        .replace_account_control(&user.dn, AccountControl::normal_account())
        .await
    {
        return rejected(
            format!("User {username} was created, but enabling it failed."),
            err,
        );
    }

    Ok(Outcome::completed(format!(
        "User {username} created and enabled."
    )))
}
