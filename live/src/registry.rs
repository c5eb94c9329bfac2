use crate::error::Error;
use crate::session::{Control, SessionState};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domain::Id;
use log::*;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Unique identifier for a session (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning view of a running session: enough to look it up, observe its
/// state and ask it to stop. The socket itself stays with the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub sensor_id: Id,
    cancel: CancellationToken,
    control: mpsc::Sender<Control>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub(crate) fn new(
        sensor_id: Id,
        cancel: CancellationToken,
        control: mpsc::Sender<Control>,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            sensor_id,
            cancel,
            control,
            state,
        }
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Stops the session without a shutdown notice to the subscriber.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Asks the session to ping its subscriber and close with "server
    /// shutting down". A session that is already gone is not an error.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let (reply, response) = oneshot::channel();

        if self.control.send(Control::Shutdown { reply }).await.is_err() {
            debug!(
                "Live session {} for sensor {} already ended",
                self.session_id.as_str(),
                self.sensor_id
            );
            return Ok(());
        }

        // A dropped reply means the session ended on its own before it got to the command.
        response.await.unwrap_or(Ok(()))
    }

    pub async fn wait_closed(&self) {
        let mut state = self.state.clone();
        // An error means the session is gone, which is as closed as it gets.
        let _ = state
            .wait_for(|state| *state == SessionState::Closed)
            .await;
    }
}

/// Process-wide table of active sessions, at most one per sensor.
pub struct SessionRegistry {
    sessions: DashMap<Id, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Registers `handle` under its sensor id, failing with `Conflict` while
    /// another session holds that sensor.
    pub fn register(&self, handle: SessionHandle) -> Result<(), Error> {
        match self.sessions.entry(handle.sensor_id) {
            Entry::Occupied(_) => Err(Error::conflict()),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    /// Removes the entry for `sensor_id` if it still belongs to `session_id`.
    /// Returns whether anything was removed.
    pub fn deregister(&self, sensor_id: Id, session_id: &SessionId) -> bool {
        self.sessions
            .remove_if(&sensor_id, |_, handle| handle.session_id == *session_id)
            .is_some()
    }

    /// Visits every registered handle while other tasks keep registering and
    /// deregistering. `f` must not call back into the registry.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&SessionHandle),
    {
        for entry in self.sessions.iter() {
            f(entry.value());
        }
    }

    /// Point-in-time copy of all handles, for work that awaits per session.
    pub fn handles(&self) -> Vec<SessionHandle> {
        let mut handles = Vec::with_capacity(self.sessions.len());
        self.for_each(|handle| handles.push(handle.clone()));
        handles
    }

    pub fn contains(&self, sensor_id: Id) -> bool {
        self.sessions.contains_key(&sensor_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
