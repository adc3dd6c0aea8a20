/// One delivery from a live feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent<T> {
    /// The full current state of the feed.
    Snapshot(T),
    /// The feed could not be refreshed; earlier snapshots are still the latest known data.
    Failed(String),
}
