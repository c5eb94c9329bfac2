//! WebSocket entry point for live sensor streams.
//!
//! Only the HTTP side of the upgrade lives here. Session lifecycle, the
//! registry and the wire frames belong to the `live` crate.

pub(crate) mod handler;
