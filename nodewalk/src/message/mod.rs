// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! The overlay's message taxonomy
//!
//! Every message carries a [Header] (identity, hop budget, originating
//! peer) and two polymorphic behaviors: `execute`, its local side effect on
//! the peer currently holding it, and `transmit`, its forwarding policy.
//! Two guards, [OverlayMessage::should_execute] and
//! [OverlayMessage::should_transmit], let a message declare that its goal
//! is already satisfied so neither behavior fires again.
//!
//! The taxonomy is closed: [SingleNodeRequest] implements the discovery
//! protocol and [AcquaintanceDump] is a flooded diagnostic. There is no
//! open-ended subclassing; a new message kind is a new type in this module.

use std::fmt::Display;

use async_trait::async_trait;

use crate::errors::PeerProcessingErr;
use crate::peer::{Peer, PeerCell};

pub mod dump;
pub mod request_node;

pub use dump::AcquaintanceDump;
pub use request_node::SingleNodeRequest;


/// A message identifier, unique across the whole overlay's lifetime
///
/// Copies of a message produced by forwarding or flooding share the id;
/// it is the key for duplicate suppression at each peer.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct MessageId(u128);

impl MessageId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(rand::random())
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// The state every overlay message carries
#[derive(Clone)]
pub struct Header {
    id: MessageId,
    ttl: u32,
    sender: PeerCell,
}

impl Header {
    /// Build a header with a freshly generated [MessageId]
    ///
    /// * `ttl` - The hop budget for this message
    /// * `sender` - The peer originating the message
    pub fn new(ttl: u32, sender: PeerCell) -> Self {
        Self {
            id: MessageId::generate(),
            ttl,
            sender,
        }
    }

    /// The message's unique identifier
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The remaining hop budget
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// The peer which originated the message
    pub fn sender(&self) -> &PeerCell {
        &self.sender
    }

    /// Burn one hop off the budget. Saturates at zero; a zero-budget
    /// message is never forwarded.
    pub(crate) fn decrement_ttl(&mut self) {
        self.ttl = self.ttl.saturating_sub(1);
    }
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Message #{} (ttl: {}, from: {:?})",
            self.id, self.ttl, self.sender
        )
    }
}

/// The behavior definition of an overlay message
///
/// A peer receiving a message calls, in order: [OverlayMessage::should_execute]
/// and if true [OverlayMessage::execute], then [OverlayMessage::should_transmit]
/// (combined with the hop budget) and if true [OverlayMessage::transmit].
///
/// There are no failure semantics at this level: concrete messages translate
/// local failures (a dead next hop, an empty pool) into "do not propagate
/// further" rather than raising to the dispatch loop: overlay traffic is
/// fire-and-forget. The only [Err] expected out of `execute` is an internal
/// fault of a collaborator (pool or handle), which the dispatch loop logs
/// and treats as "no node available for this hop".
#[async_trait]
pub trait OverlayMessage: Send + Sync + 'static {
    /// The message's [Header]
    fn header(&self) -> &Header;

    /// Mutable access to the [Header], used by the propagation policies to
    /// burn hop budget when forwarding
    fn header_mut(&mut self) -> &mut Header;

    /// Guard for [OverlayMessage::execute]. Defaults to [true]; a message
    /// whose goal is already satisfied returns [false] and is never
    /// executed again.
    fn should_execute(&self) -> bool {
        true
    }

    /// Guard for [OverlayMessage::transmit]. Defaults to [true]; same
    /// purpose as [OverlayMessage::should_execute] for propagation.
    fn should_transmit(&self) -> bool {
        true
    }

    /// Perform this message's local side effect on the peer currently
    /// holding it
    ///
    /// * `peer` - The local peer (pool + acquaintances) to act upon
    async fn execute(&self, peer: &Peer) -> Result<(), PeerProcessingErr>;

    /// Decide the next hop(s) and forward the message. Consumes the
    /// message; a message which does not forward simply dies here.
    ///
    /// * `peer` - The local peer whose acquaintances are the candidate
    ///   next hops
    fn transmit(self: Box<Self>, peer: &Peer);
}

/// A type-erased overlay message traveling between peers
pub type Envelope = Box<dyn OverlayMessage>;
