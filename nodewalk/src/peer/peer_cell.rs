// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! [PeerCell] is a reference-counted handle to a peer and its communication
//! channels. It is the unit stored in acquaintance sets and the address a
//! message travels to on each hop of a walk.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::concurrency::{MpscReceiver, MpscUnboundedReceiver};
use crate::errors::{MessagingErr, SpawnErr};
use crate::message::{Envelope, OverlayMessage};
use crate::peer::acquaintances::AcquaintanceSet;
use crate::peer::messages::StopMessage;
use crate::peer::peer_properties::PeerProperties;
use crate::{PeerId, PeerName};

/// The status of a peer's lifecycle
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum PeerStatus {
    /// Created, but its dispatch loop hasn't started yet
    Starting = 0u8,
    /// Processing messages
    Running = 1u8,
    /// Winding down
    Stopping = 2u8,
    /// Dead
    Stopped = 3u8,
}

/// Peer states where the peer can still be contacted
pub const ACTIVE_STATES: [PeerStatus; 2] = [PeerStatus::Starting, PeerStatus::Running];

/// The collection of ports a peer's dispatch loop listens on
pub(crate) struct PeerPortSet {
    pub(crate) stop_rx: MpscReceiver<StopMessage>,
    pub(crate) message_rx: MpscUnboundedReceiver<Envelope>,
}

/// A message retrieved from the peer's ports, in priority order
pub(crate) enum PeerPortMessage {
    Stop(StopMessage),
    Message(Envelope),
}

impl PeerPortSet {
    /// Listen to the ports, with a stop request taking priority
    /// over any queued overlay traffic
    pub(crate) async fn listen_in_priority(&mut self) -> Result<PeerPortMessage, MessagingErr> {
        crate::concurrency::select! {
            stop = self.stop_rx.recv() => {
                stop.map(PeerPortMessage::Stop).ok_or(MessagingErr::ChannelClosed)
            }
            message = self.message_rx.recv() => {
                message.map(PeerPortMessage::Message).ok_or(MessagingErr::ChannelClosed)
            }
        }
    }
}

/// A handle to a peer, which can be sanely cloned and shared around. Two
/// cells compare equal when they address the same peer.
#[derive(Clone)]
pub struct PeerCell {
    inner: Arc<PeerProperties>,
}

impl std::fmt::Debug for PeerCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(name) = self.get_name() {
            write!(f, "Peer '{}' (id: {})", name, self.get_id())
        } else {
            write!(f, "Peer (id: {})", self.get_id())
        }
    }
}

impl PartialEq for PeerCell {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for PeerCell {}

impl Hash for PeerCell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl PeerCell {
    /// Construct a new cell along with the port set its dispatch loop
    /// will consume. Named peers are enrolled in the global registry.
    pub(crate) fn new(name: Option<PeerName>) -> Result<(Self, PeerPortSet), SpawnErr> {
        let (props, stop_rx, message_rx) = PeerProperties::new(name);
        let cell = Self {
            inner: Arc::new(props),
        };
        if let Some(r_name) = cell.get_name() {
            crate::registry::enroll(r_name, cell.clone())?;
        }
        Ok((
            cell,
            PeerPortSet {
                stop_rx,
                message_rx,
            },
        ))
    }

    /// Retrieve the peer's id
    pub fn get_id(&self) -> PeerId {
        self.inner.id
    }

    /// Retrieve the peer's name, if it has one
    pub fn get_name(&self) -> Option<PeerName> {
        self.inner.name.clone()
    }

    /// Retrieve the current status of the peer
    pub fn get_status(&self) -> PeerStatus {
        self.inner.get_status()
    }

    /// Set the status of the peer. Stopping or stopped peers
    /// are removed from the global registry.
    pub(crate) fn set_status(&self, status: PeerStatus) {
        if !ACTIVE_STATES.contains(&status) {
            if let Some(name) = self.get_name() {
                crate::registry::unenroll(&name);
            }
        }
        self.inner.set_status(status);
    }

    /// The set of peers this peer will consider as next hops
    pub fn acquaintances(&self) -> &AcquaintanceSet {
        &self.inner.acquaintances
    }

    /// Send a typed overlay message to this peer's dispatch loop
    pub fn send_message<TMessage>(&self, message: TMessage) -> Result<(), MessagingErr>
    where
        TMessage: OverlayMessage,
    {
        self.send_envelope(Box::new(message))
    }

    /// Send an already-boxed message to this peer's dispatch loop
    pub fn send_envelope(&self, message: Envelope) -> Result<(), MessagingErr> {
        self.inner.send_envelope(message)
    }

    /// Request the peer stop processing messages. Anything already in the
    /// message queue is discarded.
    pub fn stop(&self, reason: Option<String>) {
        // ignore failures, since that means the peer is already dead
        let _ = self.inner.send_stop(reason);
    }
}
