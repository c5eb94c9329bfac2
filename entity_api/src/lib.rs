//! Persistence functions over the `entity` models, one module per table.
//!
//! Every function takes a `DatabaseConnection` and returns `error::Error`, whose
//! `EntityApiErrorKind` tells the `domain` layer whether a record was missing,
//! already present, or the database itself failed.

pub use entity::{events, sensor_type, sensors, sensors_users, users, Id};

pub mod error;
pub mod event;
pub mod sensor;
pub mod sensors_user;
pub mod user;

pub(crate) fn record_not_found() -> error::Error {
    error::Error {
        source: None,
        error_kind: error::EntityApiErrorKind::RecordNotFound,
    }
}
