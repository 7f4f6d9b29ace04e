use crate::engine::DiscoveryOutcome;
use crate::model::DiscoveredApplication;
use std::sync::mpsc::Sender;

/// Everything a discovery run reports to its consumer, in emission order.
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// Free-text status, advisory only.
    Progress(String),
    Discovered(DiscoveredApplication),
    /// A phase or item failed and was skipped; the run continues.
    Error(String),
    Finished(DiscoveryOutcome),
}

/// Receives discovery events on the producer's thread.
///
/// Implementations must not block: the crawl waits on nothing but the disk.
pub trait DiscoverySink: Send {
    fn send(&self, event: DiscoveryEvent);

    fn progress(&self, message: String) {
        self.send(DiscoveryEvent::Progress(message));
    }
}

/// Unbounded channel hand-off. A consumer that hung up is ignored.
impl DiscoverySink for Sender<DiscoveryEvent> {
    fn send(&self, event: DiscoveryEvent) {
        let _ = Sender::send(self, event);
    }
}

/// No-op sink for silent operation.
pub struct SilentSink;

impl DiscoverySink for SilentSink {
    fn send(&self, _event: DiscoveryEvent) {}
}
