//! This module holds typed parameters for various endpoint inputs.
//!
//! The purpose of this module is to define and manage the parameters that are used as inputs
//! for different endpoints in the web application. By using typed parameters, we can ensure
//! that the inputs are validated (by type) and correctly formatted before they are processed by the
//! application logic.
use crate::Error;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use domain::error::Error as DomainError;
use domain::Id;

pub(crate) mod event;
pub(crate) mod sensor;
pub(crate) mod user;

/// Parses a numeric path id, rejecting anything else as invalid input.
pub(crate) fn parse_id(raw: &str) -> Result<Id, Error> {
    raw.parse::<Id>()
        .map_err(|_| DomainError::invalid(format!("'{raw}' is not a valid id")).into())
}

/// Unwraps a JSON body, turning a malformed or incomplete body into invalid input.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| DomainError::invalid(rejection.body_text()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_integers_only() {
        assert_eq!(parse_id("42").ok(), Some(42));
        assert!(parse_id("forty-two").is_err());
        assert!(parse_id("4.2").is_err());
    }
}
