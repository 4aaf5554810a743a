// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! A peer's local pool of shareable nodes
//!
//! Every node in the pool is either free or leased. Leasing is an atomic
//! test-and-set on the node's own state flag, so any number of concurrent
//! inbound request messages can race on the pool without a coarse lock and
//! each free node is handed out exactly once.
//!
//! A successful lease is returned as a [NodeLease] RAII guard: dropping the
//! guard returns the node to the pool. This is what makes the compensating
//! release on a lost delivery race (and on a panicking handler) automatic,
//! preserving the pool-conservation invariant that free + leased is
//! constant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::node::{NodeId, NodeInfo, NodeTags};

struct PoolEntry {
    info: NodeInfo,
    leased: AtomicBool,
}

struct PoolInner {
    nodes: DashMap<NodeId, PoolEntry>,
}

/// A concurrent pool of local nodes, each free or leased
///
/// Cheaply clonable; all clones share the same underlying node table.
#[derive(Clone)]
pub struct ResourcePool {
    inner: Arc<PoolInner>,
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourcePool {
    /// Create a new, empty pool
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                nodes: DashMap::new(),
            }),
        }
    }

    /// Add a node to the pool, initially free
    ///
    /// * `info` - The descriptor of the node joining this peer's pool
    pub fn add_node(&self, info: NodeInfo) {
        self.inner.nodes.insert(
            info.id(),
            PoolEntry {
                info,
                leased: AtomicBool::new(false),
            },
        );
    }

    /// Decommission a node from the pool. Only free nodes may be removed;
    /// a leased node stays in the table until its lease is returned.
    ///
    /// Returns [true] if the node was removed, [false] if it was unknown
    /// or currently leased
    pub fn remove_node(&self, id: NodeId) -> bool {
        self.inner
            .nodes
            .remove_if(&id, |_, entry| !entry.leased.load(Ordering::Acquire))
            .is_some()
    }

    /// Atomically lease one free node, if any is available
    ///
    /// The pool decides which node is handed back; callers get no say
    /// beyond [ResourcePool::lease_matching]'s filter.
    ///
    /// Returns [Some(NodeLease)] holding the leased node, [None] when
    /// every node is currently leased (or the pool is empty)
    pub fn lease(&self) -> Option<NodeLease> {
        self.lease_matching(|_| true)
    }

    /// Atomically lease one free node whose descriptor satisfies `filter`
    ///
    /// * `filter` - A predicate over candidate [NodeInfo]s
    pub fn lease_matching<F>(&self, filter: F) -> Option<NodeLease>
    where
        F: Fn(&NodeInfo) -> bool,
    {
        for entry in self.inner.nodes.iter() {
            if filter(&entry.info)
                && entry
                    .leased
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                return Some(NodeLease {
                    info: entry.info.clone(),
                    tags: None,
                    pool: Arc::downgrade(&self.inner),
                });
            }
        }
        None
    }

    /// Return a previously leased node to the pool, marking it free again.
    /// Equivalent to dropping the lease; provided for call-site clarity.
    pub fn release(&self, lease: NodeLease) {
        drop(lease);
    }

    /// Count of currently free nodes
    pub fn free_count(&self) -> usize {
        self.inner
            .nodes
            .iter()
            .filter(|entry| !entry.leased.load(Ordering::Acquire))
            .count()
    }

    /// Count of currently leased nodes
    pub fn leased_count(&self) -> usize {
        self.len() - self.free_count()
    }

    /// Total number of nodes (free + leased) in the pool
    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    /// Is the pool devoid of any nodes (free or leased)?
    pub fn is_empty(&self) -> bool {
        self.inner.nodes.is_empty()
    }
}

impl std::fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ResourcePool ({} free / {} total)",
            self.free_count(),
            self.len()
        )
    }
}

/// An exclusive lease on one node from a [ResourcePool]
///
/// Dropping the lease returns the node to its pool. A lease outliving its
/// pool simply evaporates.
pub struct NodeLease {
    info: NodeInfo,
    tags: Option<NodeTags>,
    pool: Weak<PoolInner>,
}

impl NodeLease {
    /// The descriptor of the leased node
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// Stamp routing tags onto this lease. Applied strictly post-lease so
    /// a node which loses the delivery race is returned untagged.
    pub fn stamp(&mut self, tags: NodeTags) {
        self.tags = Some(tags);
    }

    /// The routing tags stamped on this lease, if any
    pub fn tags(&self) -> Option<&NodeTags> {
        self.tags.as_ref()
    }

    /// Return the node to its pool, marking it free again
    pub fn release(self) {
        // the Drop impl does the work
    }
}

impl Drop for NodeLease {
    fn drop(&mut self) {
        if let Some(inner) = self.pool.upgrade() {
            if let Some(entry) = inner.nodes.get(&self.info.id()) {
                entry.leased.store(false, Ordering::Release);
            }
        }
    }
}

impl std::fmt::Debug for NodeLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lease of {}", self.info)
    }
}
