//! Use cases of the sensor platform and the storage seams they depend on.
//!
//! Models are re-exported from `entity_api` so that consumers of the `domain`
//! crate never depend on the persistence crates directly.
pub use entity_api::{events, sensor_type, sensors, sensors_users, users, Id};

pub mod context;
pub mod error;
pub mod event;
pub mod repository;
pub mod sensor;
pub mod services;
pub mod user;

pub use services::Services;
