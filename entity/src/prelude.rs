pub use super::events::Entity as Events;
pub use super::sensors::Entity as Sensors;
pub use super::sensors_users::Entity as SensorsUsers;
pub use super::users::Entity as Users;
