//! Derived per-topic figures.

use super::topics::{OffsetState, TopicRegistry};

/// Marks a next offset that could not be determined.
pub const UNKNOWN_OFFSET: i64 = -1;

/// Total number of records ever produced to a topic.
pub fn logsize(available_offsets: &[i64]) -> i64 {
    available_offsets.iter().sum()
}

/// How far a group got through a topic.
///
/// Unknown samples are skipped. Without a single known sample the count is `0` and the state
/// [`OffsetState::Unknown`].
pub fn consumed(next_offsets: &[i64]) -> (i64, OffsetState) {
    let mut known = next_offsets
        .iter()
        .filter(|&&o| o != UNKNOWN_OFFSET)
        .peekable();
    let state = if known.peek().is_some() {
        OffsetState::Known
    } else {
        OffsetState::Unknown
    };
    (known.sum(), state)
}

/// Fills in `logsize` of every topic and `offset` of every topic subscriber.
pub fn summarize(topics: &mut TopicRegistry) {
    for topic in topics.iter_mut() {
        topic.logsize = logsize(&topic.available_offsets);
        for subscriber in &mut topic.subscribers {
            let (offset, state) = consumed(&subscriber.next_offsets);
            subscriber.offset = offset;
            subscriber.offset_state = state;
        }
    }
}
