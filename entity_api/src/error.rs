//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::{DbErr, SqlErr};

/// Errors while executing operations related to entities.
/// The intent is to categorize errors into two major types:
///  * Errors related to data. Ex DbError::RecordNotFound
///  * Errors related to interactions with the database itself. Ex DbError::Conn
#[derive(Debug, PartialEq)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Record not found
    RecordNotFound,
    // Record not updated
    RecordNotUpdated,
    // A unique column (ex. a sensor serial number) already holds this value
    RecordAlreadyExists,
    // A referenced record (ex. the sensor of an event) does not exist
    RelatedRecordMissing,
    // Errors related to interactions with the database itself. Ex DbError::Conn
    SystemError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        let error_kind = match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => EntityApiErrorKind::RecordAlreadyExists,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                EntityApiErrorKind::RelatedRecordMissing
            }
            _ => match err {
                DbErr::RecordNotFound(_) => EntityApiErrorKind::RecordNotFound,
                DbErr::RecordNotUpdated => EntityApiErrorKind::RecordNotUpdated,
                _ => EntityApiErrorKind::SystemError,
            },
        };

        Error {
            source: Some(err),
            error_kind,
        }
    }
}
