//! Frames written to live subscribers.
use axum::extract::ws::{CloseFrame, Message};
use domain::events;

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Policy violation, used when a sensor already has a subscriber.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

pub const REASON_CLIENT_DISCONNECTED: &str = "client disconnected";
pub const REASON_SHUTTING_DOWN: &str = "server shutting down";
pub const REASON_CLOSED: &str = "closed";
pub const REASON_ALREADY_STREAMING: &str = "sensor already streaming";

/// One event as a single JSON text frame.
pub fn event_frame(event: &events::Model) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(event)?.into()))
}

pub fn close_frame(code: u16, reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}

pub fn ping_frame() -> Message {
    Message::Ping(Default::default())
}
