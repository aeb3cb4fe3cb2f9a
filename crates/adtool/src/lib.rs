//! # adtool
//!
//! Command-line administration of Active Directory users and groups over LDAP.
//!
//! Each invocation parses one command, binds once, runs the command's handler against a
//! [`adtool_directory::Directory`] and releases the connection before exiting.
//!
//! ## Modules
//!
//! - [`cli`] - Argument schema
//! - [`commands`] - One handler per command
//! - [`dispatcher`] - Connection lifecycle and the single reporting point
//! - [`outcome`] - Handler outcomes and exit codes
//! - [`logging`] - Log file setup
//! - [`password`] - Where new account passwords come from

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod dispatcher;
pub mod logging;
pub mod outcome;
pub mod password;

pub use cli::{Cli, Command};
pub use dispatcher::{dispatch, Connect, LdapConnect};
pub use outcome::{exit_code, Outcome};
