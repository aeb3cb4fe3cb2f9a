//! Connection lifecycle around a single command.
//!
//! [`dispatch`] binds once, runs the handler, releases the connection whatever the handler did
//! (including panicking) and is the only place that prints or logs the result.

use std::any::Any;
use std::io::Write;
use std::panic::AssertUnwindSafe;

use adtool_core::{Error, Result};
use adtool_directory::{Directory, DirectoryClient, DirectoryConfig};
use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::cli::Command;
use crate::commands;
use crate::outcome::{exit_code, Outcome};
use crate::password::PasswordSource;

/// Printed when the bind fails.
pub const BIND_FAILED_MESSAGE: &str = "Bind failed. Check log file.";

/// Printed for any failure that is not a directory outcome.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error occurred. Check log file.";

/// Opens and releases directory sessions.
#[async_trait]
pub trait Connect: Sync {
    /// Session type handed to the handlers.
    type Session: Directory;

    /// Connects and binds.
    async fn connect(&self) -> Result<Self::Session>;

    /// Releases a session obtained from [`Connect::connect`].
    async fn release(&self, session: Self::Session) -> Result<()>;
}

/// Connects to the configured server with `ldap3`.
#[derive(Debug, Clone)]
pub struct LdapConnect {
    config: DirectoryConfig,
}

impl LdapConnect {
    /// Creates a connector for `config`.
    #[must_use]
    pub const fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connect for LdapConnect {
    type Session = DirectoryClient;

    async fn connect(&self) -> Result<DirectoryClient> {
        DirectoryClient::connect(self.config.clone()).await
    }

    async fn release(&self, session: DirectoryClient) -> Result<()> {
        session.unbind().await
    }
}

/// Runs `command` in its own session and reports the result to `out`.
///
/// Returns the process exit code.
pub async fn dispatch<C, W>(
    connector: &C,
    command: &Command,
    passwords: &dyn PasswordSource,
    out: &mut W,
) -> u8
where
    C: Connect,
    W: Write,
{
    let label = command.to_string();
    info!("Running {label}");

    let mut session = match connector.connect().await {
        Ok(session) => session,
        Err(err) => {
            error!("{label}: {err}");
            emit(out, BIND_FAILED_MESSAGE);
            return exit_code::FATAL;
        }
    };

    let result = AssertUnwindSafe(commands::execute(command, &mut session, passwords))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(Error::InternalError(format!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

    match connector.release(session).await {
        Ok(()) => debug!("{label}: connection released"),
        Err(err) => warn!("{label}: releasing the connection failed: {err}"),
    }

    report(&label, result, out)
}

/// Prints and logs a handler result. Returns the exit code.
pub fn report<W: Write>(label: &str, result: Result<Outcome>, out: &mut W) -> u8 {
    match result {
        Ok(outcome) => {
            outcome.log(label);
            for line in outcome.lines() {
                emit(out, &line);
            }
            outcome.exit_code()
        }
        Err(err) => {
            if err.should_log() {
                error!("{label}: [{}] {err}", err.error_code());
            } else {
                warn!("{label}: [{}] {err}", err.error_code());
            }
            emit(out, UNEXPECTED_ERROR_MESSAGE);
            exit_code::FATAL
        }
    }
}

fn emit<W: Write>(out: &mut W, line: &str) {
    if let Err(err) = writeln!(out, "{line}") {
        warn!("failed to write output: {err}");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_prints_outcome_lines() {
        let mut out = Vec::new();
        let code = report(
            "list-users-in-group Ops",
            Ok(Outcome::Listing {
                header: "Users:".into(),
                rows: vec!["Jack.Reacher".into(), "Jane.Doe".into()],
            }),
            &mut out,
        );
        assert_eq!(code, exit_code::SUCCESS);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Users:\nJack.Reacher\nJane.Doe\n"
        );
    }

    #[test]
    fn report_hides_fatal_details() {
        let mut out = Vec::new();
        let code = report(
            "enable-user Jack.Reacher",
            Err(Error::Timeout("directory search timed out".into())),
            &mut out,
        );
        assert_eq!(code, exit_code::FATAL);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{UNEXPECTED_ERROR_MESSAGE}\n")
        );
    }

    #[test]
    fn panic_message_extracts_payload() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
