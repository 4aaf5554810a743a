// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! The acquaintance set: the neighbors a peer knows about and will
//! forward overlay traffic to

use std::sync::Arc;

use dashmap::DashSet;

use crate::peer::PeerCell;
use crate::propagation::choose_uniform;

/// A concurrently-mutable set of neighboring peers. Cloning is cheap and
/// all clones view the same underlying set.
#[derive(Clone, Default)]
pub struct AcquaintanceSet {
    inner: Arc<DashSet<PeerCell>>,
}

impl AcquaintanceSet {
    /// Construct a new, empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Returns [false] if the peer was already known.
    pub fn insert(&self, peer: PeerCell) -> bool {
        self.inner.insert(peer)
    }

    /// Remove a peer. Returns [true] if the peer was known.
    pub fn remove(&self, peer: &PeerCell) -> bool {
        self.inner.remove(peer).is_some()
    }

    /// Check if a specific peer is known
    pub fn contains(&self, peer: &PeerCell) -> bool {
        self.inner.contains(peer)
    }

    /// The number of known peers
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// A point-in-time copy of the membership
    pub fn snapshot(&self) -> Vec<PeerCell> {
        self.inner.iter().map(|member| member.key().clone()).collect()
    }

    /// A uniformly-random member, if any
    pub fn random(&self) -> Option<PeerCell> {
        choose_uniform(&self.snapshot())
    }
}

impl std::fmt::Debug for AcquaintanceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquaintanceSet")
            .field("len", &self.len())
            .finish()
    }
}
