// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Node descriptors and their routing tags
//!
//! A "node" here is a unit of spare compute capacity a peer is willing to
//! share: a slot where the embedding application can deploy work. The
//! overlay never inspects nodes beyond their identity; it only moves
//! descriptors between pools and callers.

use std::fmt::Display;
use std::sync::atomic::AtomicU64;

/// A node's unique identifier within this process
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(u64);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The local id allocator for nodes
static NODE_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(0u64);

fn get_new_node_id() -> NodeId {
    NodeId(NODE_ID_ALLOCATOR.fetch_add(1, std::sync::atomic::Ordering::AcqRel))
}

/// Descriptor of a shareable compute node
#[derive(Debug, Clone)]
pub struct NodeInfo {
    id: NodeId,
    url: String,
}

impl NodeInfo {
    /// Create a new node descriptor, allocating a fresh [NodeId]
    ///
    /// * `url` - Where the node can be reached by the embedding application
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self {
            id: get_new_node_id(),
            url: url.into(),
        }
    }

    /// Retrieve the node's unique identifier
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Retrieve the node's url
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node {} at '{}'", self.id, self.url)
    }
}

/// Opaque pass-through tags stamped on a leased node so the caller can
/// route it to the right logical group. The overlay core never interprets
/// them; they exist for the embedding application (e.g. a deployment
/// runtime grouping nodes by virtual node and job).
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct NodeTags {
    /// The target virtual-node (partition) name, if any
    pub virtual_node: Option<String>,
    /// The target job/workload identifier, if any
    pub job_id: Option<String>,
}

impl NodeTags {
    /// Tags routing a node to the given virtual node and job
    pub fn new<V: Into<String>, J: Into<String>>(virtual_node: V, job_id: J) -> Self {
        Self {
            virtual_node: Some(virtual_node.into()),
            job_id: Some(job_id.into()),
        }
    }
}
