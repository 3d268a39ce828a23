//! Event bus for decoupled communication

use std::path::PathBuf;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Integration events
#[derive(Debug, Clone)]
pub enum Event {
    /// Core has started
    CoreStarted,

    /// Core is shutting down
    CoreShutdown,

    /// A file finished being written through the staging accessor
    FileWritten {
        path: PathBuf,
        resource_identifier: String,
    },

    /// The asset-tracking platform registered a component at a location.
    /// This is the trigger the coordinator consumes.
    ComponentAdded {
        component_id: Uuid,
        location_id: Uuid,
    },

    /// The coordinator queued transfer work for a component
    SyncQueued {
        job_id: String,
        job_code: String,
        /// Whether the job was created by this invocation (as opposed to
        /// a task being appended to an existing one)
        created: bool,
    },
}

/// Event bus for broadcasting events
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event
    pub fn emit(&self, event: Event) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
