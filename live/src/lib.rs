//! Live delivery of sensor events over WebSocket connections.
//!
//! # Architecture
//!
//! - **One session per sensor**: a subscriber connection is bound to exactly
//!   one sensor id. A second subscriber for the same sensor is rejected with
//!   a `Conflict` while the first is active.
//! - **Two activities per session**: a disconnect watcher owning the read half
//!   of the socket and a pusher owning the write half. Both share one
//!   `CancellationToken`; whichever exits first cancels the other.
//! - **Polling, not fan-out**: the pusher reads the latest event of its sensor
//!   from the `EventRepository` on a fixed cadence and writes it as one JSON
//!   text frame. Nothing is sent while the sensor has no events.
//! - **Registry**: a `DashMap` keyed by sensor id holding non-owning
//!   `SessionHandle`s, used for conflict detection and bulk shutdown.
//!
//! # Session lifecycle
//!
//! `Starting → Running → Closing → Closed`. The socket is closed only after
//! both activities were joined, and the registry entry is removed exactly once
//! regardless of whether the client, a shutdown or a write failure ended it.
//!
//! # Modules
//!
//! - `registry`: `SessionRegistry` and the `SessionHandle` stored in it
//! - `session`: the watcher and pusher activities of one connection
//! - `manager`: starts sessions and shuts all of them down
//! - `message`: WebSocket frames written to subscribers

pub mod error;
pub mod manager;
pub mod message;
pub mod registry;
pub mod session;

pub use manager::{Config, Manager};
