use std::io;
use std::process::ExitCode;

use adtool::{
    cli::{available_commands, Cli},
    dispatcher::{dispatch, LdapConnect},
    logging::{self, LogContext},
    outcome::exit_code,
    password,
};
use adtool_core::CredentialsFile;
use adtool_directory::DirectoryConfig;
use anyhow::Context;
use clap::{error::ErrorKind, Parser};
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_code::SUCCESS,
                _ => exit_code::USAGE,
            };
            // Nothing useful to do if the terminal is gone.
            let _ = err.print();
            if err.kind() == ErrorKind::InvalidSubcommand {
                eprint!("\n{}", available_commands());
            }
            return ExitCode::from(code);
        }
    };

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code::FATAL)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let log_file = match &cli.log_file {
        Some(path) => path.clone(),
        None => logging::default_log_file().context("Failed to determine the log file location")?,
    };
    let log_context = LogContext::init(&log_file, cli.verbose.tracing_level_filter())
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    logging::install_panic_hook();
    debug!("Logging to {}", log_context.path().display());

    let config = CredentialsFile::load(&cli.config)
        .and_then(|credentials| DirectoryConfig::from_credentials(&credentials))
        .map_err(|err| {
            error!("Failed to load {}: {err}", cli.config.display());
            err
        })
        .with_context(|| format!("Failed to load credentials from {}", cli.config.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let connector = LdapConnect::new(config);
    let passwords = password::source_for(cli.command.password_file());
    let code = runtime.block_on(dispatch(
        &connector,
        &cli.command,
        passwords.as_ref(),
        &mut io::stdout().lock(),
    ));

    drop(log_context);
    Ok(code)
}
