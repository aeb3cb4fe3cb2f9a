//! Command-line schema.
//!
//! Arity and argument formats are checked here, before any connection is made. Handlers receive
//! already-typed arguments and never re-validate them.

use std::fmt;
use std::path::{Path, PathBuf};

use adtool_core::config::DEFAULT_CREDENTIALS_PATH;
use adtool_directory::AccountName;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

const EXAMPLES: &str = r"Examples:
  # Create a user, prompting for the initial password
  adtool create-user Jack.Reacher

  # Create a group and put the user in it
  adtool create-group Python-Test-Group
  adtool add-user-to-group Jack.Reacher Python-Test-Group

  # Show who is in the group
  adtool list-users-in-group Python-Test-Group

  # Lock the account without touching its other flags
  adtool disable-user Jack.Reacher
";

/// Administer Active Directory users and groups.
///
/// Reads the domain controller address and bind credentials from a JSON credentials file
/// and performs exactly one command per invocation.
#[derive(Parser, Debug)]
#[command(
    name = "adtool",
    version,
    about,
    disable_help_subcommand = true,
    subcommand_required = true,
    arg_required_else_help = true,
    after_long_help = EXAMPLES,
)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Credentials file with the server address and bind account.
    #[arg(
        long,
        value_name = "PATH",
        env = "ADTOOL_CONFIG",
        default_value = DEFAULT_CREDENTIALS_PATH,
        value_hint = clap::ValueHint::FilePath,
        global = true
    )]
    pub config: PathBuf,

    /// Log file to append to. Defaults to `~/adtool_logs/adtool.log`.
    #[arg(
        long,
        value_name = "PATH",
        env = "ADTOOL_LOG_FILE",
        value_hint = clap::ValueHint::FilePath,
        global = true
    )]
    pub log_file: Option<PathBuf>,

    /// Log verbosity.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// The commands `adtool` understands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a user account, set its password and enable it
    CreateUser(CreateUserArgs),

    /// Create a group
    CreateGroup(GroupArgs),

    /// Add a user to a group
    AddUserToGroup(MembershipArgs),

    /// Remove a user from a group
    DeleteUserFromGroup(MembershipArgs),

    /// List the account names of a group's members
    ListUsersInGroup(GroupArgs),

    /// Enable a user account
    EnableUser(UserArgs),

    /// Disable a user account
    DisableUser(UserArgs),
}

/// Arguments of `create-user`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CreateUserArgs {
    /// Account name of the new user
    #[arg(value_name = "First.Last")]
    pub username: AccountName,

    /// Read the initial password from a file instead of prompting for it
    #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub password_file: Option<PathBuf>,
}

/// Arguments of commands that take a single user.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct UserArgs {
    /// Account name of the user
    #[arg(value_name = "First.Last")]
    pub username: AccountName,
}

/// Arguments of commands that take a single group.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GroupArgs {
    /// Name of the group
    #[arg(value_name = "GroupName")]
    pub group: String,
}

/// Arguments of the membership commands.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MembershipArgs {
    /// Account name of the user
    #[arg(value_name = "First.Last")]
    pub username: AccountName,

    /// Name of the group
    #[arg(value_name = "GroupName")]
    pub group: String,
}

impl Command {
    /// Command name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateUser(_) => "create-user",
            Self::CreateGroup(_) => "create-group",
            Self::AddUserToGroup(_) => "add-user-to-group",
            Self::DeleteUserFromGroup(_) => "delete-user-from-group",
            Self::ListUsersInGroup(_) => "list-users-in-group",
            Self::EnableUser(_) => "enable-user",
            Self::DisableUser(_) => "disable-user",
        }
    }

    /// Password file given to `create-user`, if any.
    #[must_use]
    pub fn password_file(&self) -> Option<&Path> {
        match self {
            Self::CreateUser(args) => args.password_file.as_deref(),
            _ => None,
        }
    }
}

/// Every command with its one-line description, for reporting an unrecognized command.
#[must_use]
pub fn available_commands() -> String {
    let schema = Cli::command();
    let mut listing = String::from("Available commands:\n");
    for command in schema.get_subcommands() {
        let about = command.get_about().map(ToString::to_string).unwrap_or_default();
        listing.push_str(&format!("  {:<24}{about}\n", command.get_name()));
    }
    listing
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            Self::CreateUser(CreateUserArgs { username, .. })
            | Self::EnableUser(UserArgs { username })
            | Self::DisableUser(UserArgs { username }) => write!(f, " {username}"),
            Self::CreateGroup(GroupArgs { group }) | Self::ListUsersInGroup(GroupArgs { group }) => {
                write!(f, " {group}")
            }
            Self::AddUserToGroup(MembershipArgs { username, group })
            | Self::DeleteUserFromGroup(MembershipArgs { username, group }) => {
                write!(f, " {username} {group}")
            }
        }
    }
}
