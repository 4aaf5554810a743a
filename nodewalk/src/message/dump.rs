// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! [AcquaintanceDump]: a flooded diagnostic which makes every reached
//! peer log its current acquaintance membership

use async_trait::async_trait;

use crate::errors::PeerProcessingErr;
use crate::peer::{Peer, PeerCell};
use crate::propagation::Flood;

use super::{Header, OverlayMessage};

/// Ask every reachable peer to report who it knows
#[derive(Clone)]
pub struct AcquaintanceDump {
    header: Header,
}

impl AcquaintanceDump {
    /// Build a dump request ready to inject into a peer
    ///
    /// * `ttl` - How many hops deep the flood reaches
    /// * `sender` - The peer originating the dump
    pub fn new(ttl: u32, sender: PeerCell) -> Self {
        Self {
            header: Header::new(ttl, sender),
        }
    }
}

#[async_trait]
impl OverlayMessage for AcquaintanceDump {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    async fn execute(&self, peer: &Peer) -> Result<(), PeerProcessingErr> {
        let known = peer
            .acquaintances()
            .snapshot()
            .iter()
            .map(|acquaintance| format!("{:?}", acquaintance))
            .collect::<Vec<_>>();
        tracing::info!(
            "{:?} knows {} peer(s): [{}]",
            peer.cell(),
            known.len(),
            known.join(", ")
        );
        Ok(())
    }

    fn transmit(self: Box<Self>, peer: &Peer) {
        let fanout = Flood.transmit(&*self, peer.acquaintances());
        tracing::trace!(
            "Message {} flooded to {} peer(s)",
            self.header.id(),
            fanout
        );
    }
}
