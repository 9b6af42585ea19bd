//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(err: ApplicationError) -> Self {
        CliError::Infra(err.into())
    }
}

impl From<DomainError> for CliError {
    fn from(err: DomainError) -> Self {
        CliError::Infra(ApplicationError::from(err).into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use crate::exitcode;

        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Server { .. } => exitcode::UNAVAILABLE,
                InfraError::Encoding(_) => exitcode::SOFTWARE,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(DomainError::MalformedIdentifier { .. }) => {
                        exitcode::USAGE
                    }
                    ApplicationError::UploadFormat { .. } => exitcode::DATAERR,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    e if e.is_not_found() => exitcode::NOINPUT,
                    _ => exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientId;

    #[test]
    fn given_malformed_id_when_exit_code_then_usage() {
        let err: CliError = "not-a-uuid".parse::<PatientId>().unwrap_err().into();
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn given_missing_patient_when_exit_code_then_noinput() {
        let err: CliError = ApplicationError::PatientNotFound(PatientId::new_random()).into();
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }
}
