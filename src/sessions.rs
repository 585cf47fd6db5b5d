use crate::mcp::types::Outgoing;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use uuid::Uuid;

pub(crate) const SESSION_BUFFER: usize = 32;

/// Open SSE streams keyed by session id.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<Uuid, mpsc::Sender<Outgoing>>>>,
}

/// Removes its session from the table when the stream is dropped.
pub struct SessionGuard {
    id: Uuid,
    sessions: Sessions,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid { self.id }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.lock().remove(&self.id);
        tracing::debug!(session_id = %self.id, "sse session closed");
    }
}

impl Sessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, mpsc::Sender<Outgoing>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self) -> (SessionGuard, mpsc::Receiver<Outgoing>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.lock().insert(id, tx);
        tracing::debug!(session_id = %id, "sse session opened");
        (SessionGuard { id, sessions: self.clone() }, rx)
    }

    pub fn sender(&self, id: &Uuid) -> Option<mpsc::Sender<Outgoing>> { self.lock().get(id).cloned() }

    pub fn len(&self) -> usize { self.lock().len() }
}
