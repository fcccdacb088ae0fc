//! Thread allocation trait for stable (session, route) integer ids.

use anyhow::Result;
use async_trait::async_trait;

/// Assigns integer thread ids to (session, route) pairs.
///
/// Repeated calls with the same pair return the same id. Distinct pairs
/// receive strictly increasing ids in global first-insertion order, from a
/// single counter: no gaps, no reuse. Implementations must serialize the
/// read-counter/compute/write step so concurrent callers for the same new
/// pair observe one id, never two.
#[async_trait]
pub trait ThreadAllocator: Send + Sync {
    /// Return the thread id for the pair, allocating on first sight.
    async fn allocate(&self, session_id: &str, route: &str) -> Result<i64>;

    /// The name of this allocator implementation.
    fn name(&self) -> &str;
}
