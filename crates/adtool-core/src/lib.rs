//! # adtool-core
//!
//! Shared foundations for the `adtool` directory administration tool.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and LDAP result code naming
//! - [`config`] - Credentials file model and loader

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::CredentialsFile;
pub use error::{Error, Result};
