use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of an external program run through a [CommandRunner](crate::CommandRunner).
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `code` is `None` when the program was terminated by a signal.
    #[error("program exited with {}: {stderr}", describe_exit(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_owned(),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid ticket options: {0}")]
    InvalidOptions(&'static str),

    #[error("configuration template {path} is unreadable")]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("keytab is empty")]
    EmptyKeytab,

    #[error("failed to fetch the keytab: {0}")]
    CredentialFetch(#[from] keytab_source::Error),

    #[error("ticket acquisition failed: {0}")]
    Acquisition(#[from] ProcessError),

    #[error("ticket manager is not initialized")]
    NotInitialized,

    #[error("IO error")]
    Io(#[from] io::Error),

    #[error("acquisition worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl Error {
    /// Configuration problems never go away by calling again.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOptions(_)
                | Error::TemplateUnreadable { .. }
                | Error::CredentialFetch(keytab_source::Error::InvalidLocator(_))
        )
    }

    /// Whether a later `ensure_initialized` call may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        !self.is_config_error() && !matches!(self, Error::NotInitialized)
    }

    /// Diagnostic text the external program wrote to its error stream, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::Acquisition(ProcessError::NonZeroExit { stderr, .. }) if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err if err.is_config_error() => io::Error::new(io::ErrorKind::InvalidInput, err),
            err => io::Error::other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ProcessError};

    #[test]
    fn acquisition_error_exposes_stderr() {
        let err = Error::from(ProcessError::NonZeroExit {
            code: Some(1),
            stderr: "kinit: Preauthentication failed".to_owned(),
        });

        assert_eq!(err.stderr(), Some("kinit: Preauthentication failed"));
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "ticket acquisition failed: program exited with code 1: kinit: Preauthentication failed"
        );
    }

    #[test]
    fn signal_exit_is_reported() {
        let err = ProcessError::NonZeroExit {
            code: None,
            stderr: String::new(),
        };

        assert_eq!(err.to_string(), "program exited with a signal: ");
    }

    #[test]
    fn invalid_locator_is_a_config_error() {
        let err = Error::from(keytab_source::Error::InvalidLocator("no-slash-here".to_owned()));

        assert!(err.is_config_error());
        assert!(!err.is_retryable());
        assert_eq!(err.stderr(), None);
    }

    #[test]
    fn fetch_failure_is_retryable() {
        let err = Error::from(keytab_source::Error::Unavailable("connection reset".to_owned()));

        assert!(!err.is_config_error());
        assert!(err.is_retryable());
    }
}
