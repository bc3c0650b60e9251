use parking_lot::Mutex;
use tracing::debug;

use crate::protocol::messages::{MetadataResponse, MetadataResponseTopic};

/// Look-aside cache of the last full [`MetadataResponse`].
///
/// Topic listing fetches fresh metadata and the per-topic lookups that follow it read from here, so one cycle costs a
/// single metadata round trip.
#[derive(Debug, Default)]
pub(crate) struct MetadataCache {
    cache: Mutex<Option<MetadataResponse>>,
}

impl MetadataCache {
    /// Grab a copy of the cached entry for `topic`, if any.
    pub(crate) fn topic(&self, topic: &str) -> Option<MetadataResponseTopic> {
        let guard = self.cache.lock();
        let t = guard.as_ref()?.topics.iter().find(|t| t.name == topic)?;
        debug!(topic, "using cached metadata");
        Some(t.clone())
    }

    pub(crate) fn invalidate(&self) {
        *self.cache.lock() = None;
        debug!("invalidated metadata cache");
    }

    pub(crate) fn update(&self, m: MetadataResponse) {
        *self.cache.lock() = Some(m);
        debug!("updated metadata cache");
    }
}
