//! Sources for the initial password of a new account.

use std::fs;
use std::path::{Path, PathBuf};

use adtool_core::{Error, Result};
use adtool_directory::AccountName;
use dialoguer::Password;
use secrecy::{ExposeSecret, SecretString};

/// Supplies the password for a newly created account.
pub trait PasswordSource: Send + Sync {
    /// Returns the password to set on `account`.
    ///
    /// # Errors
    ///
    /// Returns an error if no password could be obtained.
    fn new_password(&self, account: &AccountName) -> Result<SecretString>;
}

/// Prompts on the terminal, asking twice.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptPassword;

impl PasswordSource for PromptPassword {
    fn new_password(&self, account: &AccountName) -> Result<SecretString> {
        Password::new()
            .with_prompt(format!("Password for {account} (must meet domain complexity)"))
            .with_confirmation(
                format!("Retype password for {account}"),
                "Passwords do not match",
            )
            .interact()
            .map(SecretString::from)
            .map_err(|err| Error::InternalError(format!("password prompt failed: {err}")))
    }
}

/// Reads the password from a file. One trailing newline is dropped.
#[derive(Debug, Clone)]
pub struct PasswordFile {
    path: PathBuf,
}

impl PasswordFile {
    /// Reads from `path` when asked.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PasswordSource for PasswordFile {
    fn new_password(&self, _account: &AccountName) -> Result<SecretString> {
        let contents = SecretString::from(fs::read_to_string(&self.path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read password file {}: {err}",
                self.path.display()
            ))
        })?);

        let raw = contents.expose_secret();
        let password = raw
            .strip_suffix('\n')
            .map_or(raw, |line| line.strip_suffix('\r').unwrap_or(line));
        if password.is_empty() {
            return Err(Error::InvalidInput(format!(
                "password file {} is empty",
                self.path.display()
            )));
        }
        Ok(SecretString::from(password))
    }
}

/// Picks the password source for a command: the given file, else the terminal prompt.
#[must_use]
pub fn source_for(password_file: Option<&Path>) -> Box<dyn PasswordSource> {
    match password_file {
        Some(path) => Box::new(PasswordFile::new(path)),
        None => Box::new(PromptPassword),
    }
}
