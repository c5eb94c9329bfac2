//! One subscriber connection bound to one sensor.
//!
//! A session runs two activities on the runtime: the disconnect watcher reads
//! the socket until the client goes away, the pusher writes the sensor's
//! latest event on a fixed cadence. They share a `CancellationToken` and each
//! holds a drop guard on it, so the session starts closing as soon as either
//! one exits for any reason.
use crate::error::Error;
use crate::message::{self, CLOSE_NORMAL};
use crate::registry::{SessionHandle, SessionId, SessionRegistry};
use axum::extract::ws::Message;
use domain::context::Context;
use domain::repository::EventRepository;
use domain::Id;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Running,
    Closing,
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// The client closed the socket, the stream ended or a read failed.
    Disconnected,
    /// A bulk shutdown closed the session.
    Shutdown,
    /// Too many consecutive pushes could not be written.
    WriteFailures,
    /// The session was canceled from outside.
    Canceled,
}

#[derive(Debug)]
pub(crate) enum Control {
    Shutdown {
        reply: oneshot::Sender<Result<(), Error>>,
    },
}

/// Tunables of a single session.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub push_interval: Duration,
    pub max_consecutive_write_failures: Option<u32>,
}

/// Write half of the socket. Sends at most one close frame.
///
/// Every write is bounded by `write_timeout` so that a subscriber that stops
/// reading cannot hold the session open. Pushes additionally give up as soon
/// as the session is canceled.
struct Outbound<W> {
    sink: W,
    closed: bool,
    cancel: CancellationToken,
    write_timeout: Duration,
}

impl<W> Outbound<W>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    fn new(sink: W, cancel: CancellationToken, write_timeout: Duration) -> Self {
        Self {
            sink,
            closed: false,
            cancel,
            write_timeout,
        }
    }

    /// Writes one frame unless the session is canceled first.
    async fn send(&mut self, frame: Message) -> Result<(), Error> {
        let written = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::transient("session canceled during write")),
            written = timeout(self.write_timeout, self.sink.send(frame)) => written,
        };

        match written {
            Ok(sent) => sent.map_err(Error::transient),
            Err(_) => Err(Error::transient("write timed out")),
        }
    }

    /// Sends a close frame and closes the sink. Runs after cancellation too, so
    /// it is bounded only by the write timeout.
    async fn close(&mut self, code: u16, reason: &'static str) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let sink = &mut self.sink;
        let closing = async move {
            let sent = sink
                .send(message::close_frame(code, reason))
                .await
                .map_err(Error::connection);
            let _ = sink.close().await;
            sent
        };

        match timeout(self.write_timeout, closing).await {
            Ok(sent) => sent,
            Err(_) => Err(Error::connection("close frame timed out")),
        }
    }

    /// Probes the subscriber with a ping, then closes with "server shutting down".
    async fn shutdown(&mut self) -> Result<(), Error> {
        let probed = match timeout(self.write_timeout, self.sink.send(message::ping_frame())).await
        {
            Ok(sent) => sent.map_err(Error::connection),
            Err(_) => Err(Error::connection("ping timed out")),
        };
        let closed = self.close(CLOSE_NORMAL, message::REASON_SHUTTING_DOWN).await;

        probed.and(closed)
    }
}

/// A session that has been created but not started. Registering its handle
/// is left to the caller so that a conflict can be answered before `run`.
pub(crate) struct Session<W, R> {
    handle: SessionHandle,
    registry: Arc<SessionRegistry>,
    events: Arc<dyn EventRepository>,
    settings: Settings,
    control: mpsc::Receiver<Control>,
    state: watch::Sender<SessionState>,
    writer: W,
    reader: R,
}

impl<W, R, E> Session<W, R>
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display,
{
    pub(crate) fn new(
        sensor_id: Id,
        registry: Arc<SessionRegistry>,
        events: Arc<dyn EventRepository>,
        settings: Settings,
        writer: W,
        reader: R,
    ) -> Self {
        let (control_tx, control) = mpsc::channel(1);
        let (state, state_rx) = watch::channel(SessionState::Starting);
        let handle =
            SessionHandle::new(sensor_id, CancellationToken::new(), control_tx, state_rx);

        Self {
            handle,
            registry,
            events,
            settings,
            control,
            state,
            writer,
            reader,
        }
    }

    pub(crate) fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Closes the socket of a session that never got registered.
    pub(crate) async fn reject(self, code: u16, reason: &'static str) {
        let mut outbound = Outbound::new(
            self.writer,
            self.handle.cancellation_token(),
            self.settings.push_interval,
        );
        if let Err(err) = outbound.close(code, reason).await {
            debug!("Failed to close rejected live session: {err}");
        }
        self.state.send_replace(SessionState::Closed);
    }

    /// Drives the session until it is closed. The handle must already be registered.
    pub(crate) async fn run(self) -> Ending
    where
        E: Send + 'static,
    {
        let Session {
            handle,
            registry,
            events,
            settings,
            control,
            state,
            writer,
            reader,
        } = self;
        let sensor_id = handle.sensor_id;
        let session_id = handle.session_id.clone();
        let cancel = handle.cancellation_token();

        state.send_replace(SessionState::Running);
        info!(
            "Live session {} for sensor {sensor_id} running",
            session_id.as_str()
        );

        let watcher = tokio::spawn(watch_disconnect(
            reader,
            cancel.clone(),
            registry.clone(),
            sensor_id,
            session_id.clone(),
        ));

        let pusher = tokio::spawn(
            Pusher {
                outbound: Outbound::new(writer, cancel.clone(), settings.push_interval),
                events,
                sensor_id,
                settings,
                cancel: cancel.clone(),
            }
            .run(control),
        );

        cancel.cancelled().await;
        state.send_replace(SessionState::Closing);

        let disconnected = match watcher.await {
            Ok(ending) => ending == Ending::Disconnected,
            Err(err) => {
                error!("Disconnect watcher of sensor {sensor_id} failed: {err}");
                false
            }
        };

        let ending = match pusher.await {
            Ok((mut outbound, pushed)) => {
                let ending = if disconnected {
                    Ending::Disconnected
                } else {
                    pushed
                };
                let reason = match ending {
                    Ending::Disconnected => message::REASON_CLIENT_DISCONNECTED,
                    Ending::Shutdown => message::REASON_SHUTTING_DOWN,
                    Ending::WriteFailures | Ending::Canceled => message::REASON_CLOSED,
                };
                if let Err(err) = outbound.close(CLOSE_NORMAL, reason).await {
                    debug!("Closing live session of sensor {sensor_id}: {err}");
                }
                ending
            }
            Err(err) => {
                error!("Pusher of sensor {sensor_id} failed: {err}");
                Ending::Canceled
            }
        };

        registry.deregister(sensor_id, &session_id);
        state.send_replace(SessionState::Closed);
        info!(
            "Live session {} for sensor {sensor_id} closed: {ending:?}",
            session_id.as_str()
        );

        ending
    }
}

/// Reads until the client goes away. Inbound frames other than close are ignored.
async fn watch_disconnect<R, E>(
    mut reader: R,
    cancel: CancellationToken,
    registry: Arc<SessionRegistry>,
    sensor_id: Id,
    session_id: SessionId,
) -> Ending
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let _guard = cancel.clone().drop_guard();

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ending::Canceled,
            frame = reader.next() => frame,
        };

        match frame {
            Some(Ok(Message::Close(_))) | None => {
                debug!("Subscriber of sensor {sensor_id} disconnected");
                break;
            }
            Some(Err(err)) => {
                warn!("Reading from subscriber of sensor {sensor_id} failed: {err}");
                break;
            }
            Some(Ok(_)) => {}
        }
    }

    registry.deregister(sensor_id, &session_id);
    cancel.cancel();

    Ending::Disconnected
}

struct Pusher<W> {
    outbound: Outbound<W>,
    events: Arc<dyn EventRepository>,
    sensor_id: Id,
    settings: Settings,
    cancel: CancellationToken,
}

impl<W> Pusher<W>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    /// Pushes on every tick until canceled, shut down, or escalated. Hands the
    /// write half back so the session can close it after both activities ended.
    async fn run(mut self, mut control: mpsc::Receiver<Control>) -> (Outbound<W>, Ending) {
        let _guard = self.cancel.clone().drop_guard();

        let period = self.settings.push_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        let ending = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Ending::Canceled,
                Some(command) = control.recv() => match command {
                    Control::Shutdown { reply } => {
                        let result = self.outbound.shutdown().await;
                        let _ = reply.send(result);
                        break Ending::Shutdown;
                    }
                },
                _ = ticker.tick() => {
                    match self.push_latest().await {
                        Ok(()) => consecutive_failures = 0,
                        Err(_) if self.cancel.is_cancelled() => break Ending::Canceled,
                        Err(err) => {
                            consecutive_failures += 1;
                            warn!(
                                "Push to subscriber of sensor {} failed ({consecutive_failures} in a row): {err}",
                                self.sensor_id
                            );

                            if self
                                .settings
                                .max_consecutive_write_failures
                                .is_some_and(|max| consecutive_failures >= max)
                            {
                                error!(
                                    "Closing live session of sensor {} after {consecutive_failures} failed writes",
                                    self.sensor_id
                                );
                                break Ending::WriteFailures;
                            }
                        }
                    }
                }
            }
        };

        (self.outbound, ending)
    }

    /// Writes the latest event, if any. Only write and serialization failures
    /// are errors; a sensor without events or an aborted query sends nothing.
    async fn push_latest(&mut self) -> Result<(), Error> {
        let ctx = Context::with_cancellation(self.cancel.clone())
            .with_timeout(self.settings.push_interval);

        let event = match ctx
            .run(self.events.get_last_event_by_sensor_id(&ctx, self.sensor_id))
            .await
        {
            Ok(event) => event,
            Err(err) if err.is_not_found() => {
                trace!("No events yet for sensor {}", self.sensor_id);
                return Ok(());
            }
            Err(err) => {
                debug!("Latest event query for sensor {} ended: {err}", self.sensor_id);
                return Ok(());
            }
        };

        let frame = message::event_frame(&event).map_err(Error::transient)?;
        self.outbound.send(frame).await
    }
}
