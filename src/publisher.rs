use std::sync::Arc;

use parking_lot::RwLock;

use crate::snapshot::Snapshot;

/// Hands out the latest complete [`Snapshot`].
///
/// Publishing swaps a pointer, readers clone it. A reader holding an older snapshot keeps it alive and unchanged
/// while newer ones get published.
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotPublisher {
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// `None` until the first snapshot got published.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }
}
