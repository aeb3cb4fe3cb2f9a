//! What a handler reports back to the dispatcher.

use adtool_core::{error::result_code_name, Error, Result};
use tracing::{error, info, warn};

/// Process exit codes.
pub mod exit_code {
    /// The command ran (including "already exists" and empty listings).
    pub const SUCCESS: u8 = 0;
    /// Unknown command, wrong arity or malformed arguments.
    pub const USAGE: u8 = 1;
    /// The directory answered, but not with what was asked for.
    pub const DIRECTORY: u8 = 2;
    /// Startup failure, bind failure or unexpected error.
    pub const FATAL: u8 = 3;
}

/// Operator-visible result of a command that ran to completion.
///
/// Unexpected failures are not outcomes; handlers return them as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The requested change was made.
    Completed {
        /// Confirmation line.
        message: String,
    },
    /// Rows produced by a query.
    Listing {
        /// Printed before the rows, even when there are none.
        header: String,
        /// One line per result, in server order.
        rows: Vec<String>,
    },
    /// Nothing was written because the entry is already there.
    AlreadyExists {
        /// Explanation line.
        message: String,
    },
    /// A user or group named on the command line does not exist.
    NotFound {
        /// Explanation line.
        message: String,
    },
    /// The server refused a write.
    Rejected {
        /// What failed, e.g. `User creation failed.`
        action: String,
        /// LDAP result code.
        code: u32,
        /// Diagnostic text from the server, verbatim.
        diagnostic: String,
    },
}

impl Outcome {
    /// Shorthand for [`Outcome::Completed`].
    #[must_use]
    pub fn completed(message: impl Into<String>) -> Self {
        Self::Completed {
            message: message.into(),
        }
    }

    /// Shorthand for [`Outcome::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Completed { .. } | Self::Listing { .. } | Self::AlreadyExists { .. } => {
                exit_code::SUCCESS
            }
            Self::NotFound { .. } | Self::Rejected { .. } => exit_code::DIRECTORY,
        }
    }

    /// Lines printed to the operator.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Completed { message }
            | Self::AlreadyExists { message }
            | Self::NotFound { message } => vec![message.clone()],
            Self::Listing { header, rows } => std::iter::once(header.clone())
                .chain(rows.iter().cloned())
                .collect(),
            Self::Rejected {
                action,
                code,
                diagnostic,
            } => vec![
                action.clone(),
                format!("{} ({code}): {diagnostic}", result_code_name(*code)),
            ],
        }
    }

    /// Writes the log entry for this outcome.
    pub fn log(&self, command: &str) {
        match self {
            Self::Completed { message } | Self::AlreadyExists { message } => {
                info!("{command}: {message}");
            }
            Self::Listing { rows, .. } => info!("{command}: {} entries listed", rows.len()),
            Self::NotFound { message } => warn!("{command}: {message}"),
            Self::Rejected {
                action,
                code,
                diagnostic,
            } => error!(
                "{command}: {action} {} (code {code}): {diagnostic}",
                result_code_name(*code)
            ),
        }
    }
}

/// Turns a directory rejection into [`Outcome::Rejected`]; any other error stays an error.
///
/// # Errors
///
/// Returns `err` unchanged unless it is [`Error::DirectoryRejected`].
pub fn rejected(action: impl Into<String>, err: Error) -> Result<Outcome> {
    match err {
        Error::DirectoryRejected { code, message } => Ok(Outcome::Rejected {
            action: action.into(),
            code,
            diagnostic: message,
        }),
        other => Err(other),
    }
}
