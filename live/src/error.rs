//! Error types for live delivery sessions.
use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, InternalErrorKind,
};
use domain::Id;
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: LiveErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum LiveErrorKind {
    /// The sensor already has an active session.
    Conflict,
    /// The subscriber connection is unusable. Fatal to its session.
    Connection(String),
    /// A single push could not be delivered. The session keeps running.
    Transient(String),
    /// The HTTP request could not be promoted to a WebSocket connection.
    UpgradeFailed,
}

impl Error {
    pub fn conflict() -> Self {
        Error {
            source: None,
            error_kind: LiveErrorKind::Conflict,
        }
    }

    pub fn upgrade_failed<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            source: Some(Box::new(err)),
            error_kind: LiveErrorKind::UpgradeFailed,
        }
    }

    pub(crate) fn connection(detail: impl fmt::Display) -> Self {
        Error {
            source: None,
            error_kind: LiveErrorKind::Connection(detail.to_string()),
        }
    }

    pub(crate) fn transient(detail: impl fmt::Display) -> Self {
        Error {
            source: None,
            error_kind: LiveErrorKind::Transient(detail.to_string()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Live Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// Translates live delivery errors into the `domain` tree so `web` maps every
// error to a status code in one place.
impl From<Error> for DomainError {
    fn from(err: Error) -> Self {
        let internal_error_kind = match &err.error_kind {
            LiveErrorKind::Conflict => InternalErrorKind::Entity(EntityErrorKind::Conflict),
            LiveErrorKind::UpgradeFailed => {
                InternalErrorKind::Other("WebSocket upgrade failed".to_string())
            }
            LiveErrorKind::Connection(detail) | LiveErrorKind::Transient(detail) => {
                InternalErrorKind::Other(detail.clone())
            }
        };

        DomainError {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(internal_error_kind),
        }
    }
}

/// Sessions that could not be closed cleanly during a bulk shutdown.
#[derive(Debug)]
pub struct ShutdownError {
    pub failures: Vec<(Id, Error)>,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} live session(s) failed to close cleanly:",
            self.failures.len()
        )?;
        for (sensor_id, err) in &self.failures {
            write!(f, " [sensor {sensor_id}: {err}]")?;
        }
        Ok(())
    }
}

impl StdError for ShutdownError {}
