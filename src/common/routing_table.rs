//! Kademlia routing table as seen by the refresh worker, and a simple thread safe implementation.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::common::{Id, Node, ID_BITS};

/// K = the default maximum size of a k-bucket.
pub const MAX_BUCKET_SIZE_K: usize = 20;

/// Snapshot of a single k-bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketInfo {
    /// Last time a lookup targeting this bucket completed, `None` if never.
    pub refreshed_at: Option<Instant>,
    /// Number of nodes in this bucket.
    pub len: usize,
}

impl BucketInfo {
    /// Returns `true` if this bucket was never refreshed, or if more than `period`
    /// has passed between its last refresh and `now`.
    pub fn is_stale(&self, now: Instant, period: Duration) -> bool {
        match self.refreshed_at {
            Some(refreshed_at) => now.saturating_duration_since(refreshed_at) > period,
            None => true,
        }
    }
}

/// The parts of a routing table the refresh worker reads.
///
/// Implementations are shared with the rest of the node, so every method
/// must be safe to call concurrently with insertions and removals.
pub trait RoutingTable: Send + Sync {
    /// Returns the [Id] of this node.
    fn local_id(&self) -> Id;

    /// Return the number of nodes in this routing table.
    fn size(&self) -> usize;

    /// Snapshot of all buckets, ordered by increasing common prefix length with [Self::local_id].
    fn buckets(&self) -> Vec<BucketInfo>;

    /// Generate a random [Id] that falls within the bucket at `index`.
    fn random_id_in_bucket(&self, index: usize) -> Id;
}

#[derive(Debug, Clone)]
/// Simplified Kademlia routing table, cheap to clone and safe to share between threads.
///
/// Buckets are indexed by the common prefix length of their nodes with the local [Id],
/// and the bucket list extends to the deepest occupied bucket.
pub struct SharedRoutingTable(Arc<RwLock<Table>>);

#[derive(Debug)]
struct Table {
    id: Id,
    buckets: Vec<KBucket>,
}

impl SharedRoutingTable {
    /// Create a new [SharedRoutingTable] with a given id.
    pub fn new(id: Id) -> Self {
        SharedRoutingTable(Arc::new(RwLock::new(Table {
            id,
            buckets: vec![KBucket::new()],
        })))
    }

    /// Returns the [Id] of this node, where the distance is measured from.
    pub fn id(&self) -> Id {
        self.read().id
    }

    // === Public Methods ===

    /// Attempts to add a node to this routing table, and return `true` if it did.
    pub fn add(&self, node: Node) -> bool {
        let mut table = self.write();
        let prefix_len = table.id.common_prefix_len(node.id());

        if prefix_len == ID_BITS {
            // Do not add self to the routing_table
            return false;
        }

        if table.buckets.len() <= prefix_len {
            table.buckets.resize_with(prefix_len + 1, KBucket::new);
        }

        table.buckets[prefix_len].add(node)
    }

    /// Remove a node from this routing table.
    pub fn remove(&self, node_id: &Id) {
        let mut table = self.write();
        let prefix_len = table.id.common_prefix_len(node_id);

        if let Some(bucket) = table.buckets.get_mut(prefix_len) {
            bucket.remove(node_id)
        }
    }

    /// Record that a lookup toward `target` completed, refreshing the bucket it falls in.
    ///
    /// Targets deeper than the last bucket refresh the last bucket.
    pub fn mark_refreshed(&self, target: &Id) {
        self.mark_refreshed_at(target, Instant::now())
    }

    /// Same as [Self::mark_refreshed] with an explicit timestamp.
    pub fn mark_refreshed_at(&self, target: &Id, at: Instant) {
        let mut table = self.write();
        let last = table.buckets.len() - 1;
        let index = table.id.common_prefix_len(target).min(last);

        table.buckets[index].refreshed_at = Some(at);
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.read().buckets.iter().all(|bucket| bucket.nodes.is_empty())
    }

    /// Export an owned vector of nodes from this routing table.
    pub fn nodes(&self) -> Vec<Node> {
        self.read()
            .buckets
            .iter()
            .flat_map(|bucket| bucket.nodes.iter().cloned())
            .collect()
    }

    // === Private Methods ===

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoutingTable for SharedRoutingTable {
    fn local_id(&self) -> Id {
        self.id()
    }

    fn size(&self) -> usize {
        self.read()
            .buckets
            .iter()
            .fold(0, |acc, bucket| acc + bucket.nodes.len())
    }

    fn buckets(&self) -> Vec<BucketInfo> {
        self.read()
            .buckets
            .iter()
            .map(|bucket| BucketInfo {
                refreshed_at: bucket.refreshed_at,
                len: bucket.nodes.len(),
            })
            .collect()
    }

    fn random_id_in_bucket(&self, index: usize) -> Id {
        self.id().random_with_common_prefix(index)
    }
}

/// Kbuckets keep up to [MAX_BUCKET_SIZE_K] nodes, sorted by the least recently seen.
#[derive(Debug, Clone)]
struct KBucket {
    nodes: Vec<Node>,
    refreshed_at: Option<Instant>,
}

impl KBucket {
    fn new() -> Self {
        KBucket {
            nodes: Vec::with_capacity(MAX_BUCKET_SIZE_K),
            refreshed_at: None,
        }
    }

    fn add(&mut self, incoming: Node) -> bool {
        if let Some(index) = self.nodes.iter().position(|n| n.id() == incoming.id()) {
            // Seen again, possibly on a new address; move to the tail.
            self.nodes.remove(index);
            self.nodes.push(incoming);

            true
        } else if self.nodes.len() < MAX_BUCKET_SIZE_K {
            self.nodes.push(incoming);
            true
        } else {
            false
        }
    }

    fn remove(&mut self, node_id: &Id) {
        self.nodes.retain(|node| node.id() != node_id);
    }
}
