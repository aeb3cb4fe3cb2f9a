//! Error types for directory administration.
//!
//! Every failure the tool can hit is one of these variants. The binary decides how each one is
//! presented to the operator; this module only classifies them.

use thiserror::Error;

/// Main error type for adtool operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operator input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The bind request was refused or could not be sent
    #[error("Bind failed: {0}")]
    BindFailed(String),

    /// The directory answered with a non-zero result code
    #[error("Directory rejected the request ({}, code {code}): {message}", result_code_name(*.code))]
    DirectoryRejected {
        /// LDAP result code
        code: u32,
        /// Diagnostic text returned by the server
        message: String,
    },

    /// Transport or protocol failure talking to an external service
    #[error("External service error: {service}: {message}")]
    ExternalServiceError {
        /// Service name that failed
        service: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A directory entry was missing data or carried unparseable values
    #[error("Invalid directory entry: {0}")]
    InvalidEntry(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for adtool operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::BindFailed(_) => "BIND_FAILED",
            Self::DirectoryRejected { .. } => "DIRECTORY_REJECTED",
            Self::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::InvalidEntry(_) => "INVALID_ENTRY",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        !matches!(self, Self::InvalidInput(_))
    }

    /// Builds a rejection from an LDAP result code and diagnostic message.
    #[must_use]
    pub fn rejected(code: u32, message: impl Into<String>) -> Self {
        Self::DirectoryRejected {
            code,
            message: message.into(),
        }
    }
}

/// Returns the symbolic name for an LDAP result code (RFC 4511, section 4.1.9).
#[must_use]
pub const fn result_code_name(code: u32) -> &'static str {
    match code {
        0 => "success",
        1 => "operationsError",
        2 => "protocolError",
        3 => "timeLimitExceeded",
        4 => "sizeLimitExceeded",
        8 => "strongerAuthRequired",
        10 => "referral",
        16 => "noSuchAttribute",
        17 => "undefinedAttributeType",
        19 => "constraintViolation",
        20 => "attributeOrValueExists",
        21 => "invalidAttributeSyntax",
        32 => "noSuchObject",
        34 => "invalidDNSyntax",
        49 => "invalidCredentials",
        50 => "insufficientAccessRights",
        51 => "busy",
        52 => "unavailable",
        53 => "unwillingToPerform",
        64 => "namingViolation",
        65 => "objectClassViolation",
        68 => "entryAlreadyExists",
        80 => "other",
        _ => "unknown",
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid server address: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(format!("malformed credentials file: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::ConfigError("x".into()).error_code(), "CONFIG_ERROR");
        assert_eq!(Error::InvalidInput("x".into()).error_code(), "INVALID_INPUT");
        assert_eq!(Error::BindFailed("x".into()).error_code(), "BIND_FAILED");
        assert_eq!(Error::rejected(68, "exists").error_code(), "DIRECTORY_REJECTED");
        assert_eq!(Error::Timeout("x".into()).error_code(), "TIMEOUT");
        assert_eq!(Error::InvalidEntry("x".into()).error_code(), "INVALID_ENTRY");
        assert_eq!(Error::InternalError("x".into()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_rejection_display_names_result_code() {
        let err = Error::rejected(68, "00002071: UpdErr: DSID-0305038D, problem 6005 (ENTRY_EXISTS)");
        assert_eq!(
            err.to_string(),
            "Directory rejected the request (entryAlreadyExists, code 68): \
             00002071: UpdErr: DSID-0305038D, problem 6005 (ENTRY_EXISTS)"
        );
    }

    #[test]
    fn test_unknown_result_code_name() {
        assert_eq!(result_code_name(4242), "unknown");
        assert_eq!(result_code_name(53), "unwillingToPerform");
    }

    #[test]
    fn test_should_log() {
        assert!(Error::InternalError("test".to_string()).should_log());
        assert!(Error::BindFailed("test".to_string()).should_log());
        assert!(Error::rejected(19, "constraint").should_log());

        assert!(!Error::InvalidInput("test".to_string()).should_log());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ConfigError(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ConfigError(_)));
    }
}
