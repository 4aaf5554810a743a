// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! [SingleNodeRequest]: the discovery message of the overlay
//!
//! It random-walks the acquaintance graph; at each peer it tries to lease
//! one free node from the local pool and deliver it back to the requester
//! through the [RequestHandle]. Once a delivery settles (accepted, beaten
//! by a concurrent copy, or the requester is gone) the message deactivates
//! itself so no later hop executes or forwards it again.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::errors::PeerProcessingErr;
use crate::handle::{DeliverErr, RequestHandle};
use crate::node::NodeTags;
use crate::peer::{Peer, PeerCell};
use crate::propagation::RandomWalk;

use super::{Header, OverlayMessage};

/// A walking request for a single free node
pub struct SingleNodeRequest {
    header: Header,
    handle: RequestHandle,
    tags: NodeTags,
    active: AtomicBool,
}

impl SingleNodeRequest {
    /// Build a request ready to inject into a peer
    ///
    /// * `ttl` - The hop budget for the walk
    /// * `sender` - The requesting peer, recorded in the header
    /// * `handle` - The delivery side of a [crate::handle::pending_node] pair
    /// * `tags` - Tags stamped onto the leased node upon delivery
    pub fn new(ttl: u32, sender: PeerCell, handle: RequestHandle, tags: NodeTags) -> Self {
        Self {
            header: Header::new(ttl, sender),
            handle,
            tags,
            active: AtomicBool::new(true),
        }
    }

    /// The tags this request will stamp onto a found node
    pub fn tags(&self) -> &NodeTags {
        &self.tags
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[async_trait]
impl OverlayMessage for SingleNodeRequest {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn should_execute(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn should_transmit(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    async fn execute(&self, peer: &Peer) -> Result<(), PeerProcessingErr> {
        let mut lease = match peer.pool().lease() {
            Some(lease) => lease,
            None => {
                tracing::trace!(
                    "{:?} has no free node for message {}",
                    peer.cell(),
                    self.header.id()
                );
                return Ok(());
            }
        };
        lease.stamp(self.tags.clone());

        match self.handle.deliver(lease) {
            Ok(()) => {
                self.deactivate();
                tracing::info!(
                    "{:?} fulfilled message {}",
                    peer.cell(),
                    self.header.id()
                );
            }
            Err(DeliverErr::AlreadyFulfilled(lease)) => {
                // another copy of the walk won the race; give the node back
                tracing::debug!(
                    "Message {} was already fulfilled, releasing node {}",
                    self.header.id(),
                    lease.info()
                );
                lease.release();
                self.deactivate();
            }
            Err(DeliverErr::Abandoned(lease)) => {
                // requester stopped waiting; give the node back
                tracing::debug!(
                    "Requester of message {} is gone, releasing node {}",
                    self.header.id(),
                    lease.info()
                );
                lease.release();
                self.deactivate();
            }
        }
        Ok(())
    }

    fn transmit(self: Box<Self>, peer: &Peer) {
        RandomWalk.transmit(self, peer.acquaintances());
    }
}
