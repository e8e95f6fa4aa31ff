//! Session registry for the streaming transport
//!
//! Each SSE subscriber owns one session. The registry maps session ids to
//! their event sinks, detaches sinks on disconnect while retaining the
//! entry for a reconnect grace window, and sweeps abandoned entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::response::sse::Event;
use tokio::sync::mpsc;
use uuid::Uuid;

/// How long a detached session entry is retained before the sweeper
/// removes it.
pub const DETACHED_GRACE: Duration = Duration::from_secs(300);

/// Sweeper wakeup interval
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A registered client session
struct Session {
    /// Creation timestamp (Unix seconds)
    created: u64,

    /// Live event sink; None once the SSE connection is gone
    sink: Option<mpsc::UnboundedSender<Event>>,

    /// Serializes message handling so posts for one session are processed
    /// in arrival order
    dispatch_lock: Arc<tokio::sync::Mutex<()>>,

    /// When the sink was detached; drives the sweeper
    detached_at: Option<Instant>,
}

/// In-memory table of active sessions.
///
/// Session ids are minted once and never reused for a different sink; a
/// message addressed to an unknown id is rejected, never auto-created.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session with an attached sink. Returns the session id
    /// and the receiving end the SSE response streams from.
    pub fn open(&self) -> (String, mpsc::UnboundedReceiver<Event>) {
        let session_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        let session = Session {
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            sink: Some(tx),
            dispatch_lock: Arc::new(tokio::sync::Mutex::new(())),
            detached_at: None,
        };

        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(session_id.clone(), session);

        (session_id, rx)
    }

    /// Whether a session id is registered
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .contains_key(session_id)
    }

    /// Per-session dispatch lock, if the session exists
    pub fn dispatch_lock(&self, session_id: &str) -> Option<Arc<tokio::sync::Mutex<()>>> {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .get(session_id)
            .map(|s| s.dispatch_lock.clone())
    }

    /// Write one event to the session's sink. Returns false when the
    /// session is unknown or its sink is detached; detached sessions drop
    /// events rather than queueing them.
    pub fn send(&self, session_id: &str, event: Event) -> bool {
        let mut sessions = self
            .sessions
            .lock()
            .expect("session registry lock poisoned");

        let Some(session) = sessions.get_mut(session_id) else {
            return false;
        };

        match &session.sink {
            Some(sink) => {
                if sink.send(event).is_ok() {
                    true
                } else {
                    // Receiver gone without the drop guard firing yet
                    session.sink = None;
                    session.detached_at = Some(Instant::now());
                    false
                }
            }
            None => false,
        }
    }

    /// Clear the session's sink on client disconnect; the entry is kept
    /// so late-arriving posts do not 404 during the grace window.
    pub fn detach(&self, session_id: &str) {
        let mut sessions = self
            .sessions
            .lock()
            .expect("session registry lock poisoned");

        if let Some(session) = sessions.get_mut(session_id) {
            session.sink = None;
            session.detached_at = Some(Instant::now());
        }
    }

    /// Destroy a session entirely
    pub fn remove(&self, session_id: &str) {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .remove(session_id);
    }

    /// Currently registered session ids
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creation timestamp of a session (Unix seconds)
    pub fn created_at(&self, session_id: &str) -> Option<u64> {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .get(session_id)
            .map(|s| s.created)
    }

    /// Remove sessions that have been detached longer than `grace`
    pub fn sweep(&self, grace: Duration) {
        let mut sessions = self
            .sessions
            .lock()
            .expect("session registry lock poisoned");

        sessions.retain(|session_id, session| {
            let expired = session
                .detached_at
                .map(|t| t.elapsed() >= grace)
                .unwrap_or(false);
            if expired {
                tracing::debug!("sweeping detached session {}", session_id);
            }
            !expired
        });
    }

    /// Spawn the background task that periodically sweeps detached
    /// sessions.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                registry.sweep(DETACHED_GRACE);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_registers_session() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.open();

        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
        assert!(registry.created_at(&id).is_some());
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = registry.open();
        let (b, _rx_b) = registry.open();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_send_to_attached_sink() {
        let registry = SessionRegistry::new();
        let (id, mut rx) = registry.open();

        assert!(registry.send(&id, Event::default().data("hello")));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_send_to_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(!registry.send("no-such-session", Event::default().data("x")));
    }

    #[tokio::test]
    async fn test_detach_keeps_entry_and_drops_events() {
        let registry = SessionRegistry::new();
        let (id, rx) = registry.open();
        drop(rx);

        registry.detach(&id);

        // Entry survives for the grace window, events are dropped
        assert!(registry.contains(&id));
        assert!(!registry.send(&id, Event::default().data("dropped")));
    }

    #[tokio::test]
    async fn test_send_detects_dropped_receiver() {
        let registry = SessionRegistry::new();
        let (id, rx) = registry.open();
        drop(rx);

        assert!(!registry.send(&id, Event::default().data("x")));
        // Subsequent sends treat it as detached
        assert!(!registry.send(&id, Event::default().data("y")));
        assert!(registry.contains(&id));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_detached() {
        let registry = SessionRegistry::new();
        let (detached, rx) = registry.open();
        let (attached, _rx_live) = registry.open();
        drop(rx);
        registry.detach(&detached);

        registry.sweep(Duration::from_secs(0));

        assert!(!registry.contains(&detached));
        assert!(registry.contains(&attached));
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.open();
        registry.remove(&id);
        assert!(!registry.contains(&id));
        assert!(registry.is_empty());
    }
}
