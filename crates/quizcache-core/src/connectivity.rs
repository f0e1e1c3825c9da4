//! Online/offline state with change notifications.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::info;

/// Subscribers that fall this far behind miss older transitions; only the
/// latest state matters to them.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// Source of the current network state.
pub trait ConnectivityProvider: Send + Sync {
    /// Current state, read fresh on every call.
    fn is_online(&self) -> bool;

    /// Receive future transitions. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent>;
}

/// Process-wide connectivity flag fed by platform signals.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    online: AtomicBool,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            online: AtomicBool::new(initially_online),
            events,
        }
    }

    /// Record a platform signal. Subscribers are notified only when the
    /// state actually changes. Returns whether it changed.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }
        let event = if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };
        info!(online = online, "Connectivity changed");
        // No receivers is fine
        let _ = self.events.send(event);
        true
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProvider for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }
}
