use crate::error::{Error, ShutdownError};
use crate::message::{CLOSE_POLICY_VIOLATION, REASON_ALREADY_STREAMING};
use crate::registry::SessionRegistry;
use crate::session::{Ending, Session, Settings};
use axum::extract::ws::Message;
use domain::repository::EventRepository;
use domain::Id;
use futures_util::future::join_all;
use futures_util::{Sink, Stream};
use log::*;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Default cadence at which a session pushes the latest event.
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct Config {
    pub push_interval: Duration,
    /// Consecutive failed writes after which a session is closed. `None`
    /// keeps a session open no matter how many writes fail.
    pub max_consecutive_write_failures: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            push_interval: DEFAULT_PUSH_INTERVAL,
            max_consecutive_write_failures: None,
        }
    }
}

/// Starts live sessions and tears all of them down on shutdown.
pub struct Manager {
    registry: Arc<SessionRegistry>,
    events: Arc<dyn EventRepository>,
    config: Config,
}

impl Manager {
    pub fn new(events: Arc<dyn EventRepository>, config: Config) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            events,
            config,
        }
    }

    /// Whether `sensor_id` currently has a subscriber.
    pub fn is_active(&self, sensor_id: Id) -> bool {
        self.registry.contains(sensor_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Runs a session for `sensor_id` over an upgraded connection until it
    /// closes. When the sensor already has a session the new connection is
    /// closed with a policy violation and `Conflict` is returned.
    pub async fn run<W, R, E>(&self, sensor_id: Id, writer: W, reader: R) -> Result<Ending, Error>
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display,
        R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let session = Session::new(
            sensor_id,
            self.registry.clone(),
            self.events.clone(),
            Settings {
                push_interval: self.config.push_interval,
                max_consecutive_write_failures: self.config.max_consecutive_write_failures,
            },
            writer,
            reader,
        );

        if let Err(err) = self.registry.register(session.handle().clone()) {
            warn!("Rejecting second live session for sensor {sensor_id}");
            session
                .reject(CLOSE_POLICY_VIOLATION, REASON_ALREADY_STREAMING)
                .await;
            return Err(err);
        }

        Ok(session.run().await)
    }

    /// Sends every registered session a shutdown notice and waits for all of
    /// them to close. Sessions that end on their own meanwhile are skipped;
    /// failures of the others are reported together.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let handles = self.registry.handles();
        info!("Shutting down {} live session(s)", handles.len());

        let results = join_all(
            handles
                .iter()
                .map(|handle| async move { (handle.sensor_id, handle.shutdown().await) }),
        )
        .await;

        join_all(handles.iter().map(|handle| handle.wait_closed())).await;

        let failures: Vec<(Id, Error)> = results
            .into_iter()
            .filter_map(|(sensor_id, result)| result.err().map(|err| (sensor_id, err)))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}
