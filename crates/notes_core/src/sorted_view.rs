use futures::StreamExt;
use shared::order::{sort_notes, SortSpec};

use crate::gateway::NoteFeed;

/// Ordered snapshots, one per upstream emission.
pub type SortedFeed = NoteFeed;

/// Re-sorts every collection the feed emits. Errors pass through unchanged and
/// dropping the returned stream drops the upstream subscription with it.
pub fn sorted_view(feed: NoteFeed, sort: SortSpec) -> SortedFeed {
    feed.map(move |batch| batch.map(|notes| sort_notes(sort, notes)))
        .boxed()
}
