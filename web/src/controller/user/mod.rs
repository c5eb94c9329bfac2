pub(crate) mod sensor_controller;
