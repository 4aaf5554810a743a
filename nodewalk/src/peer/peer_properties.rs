// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! [PeerProperties] is the underlying shared state of a peer, held behind
//! the [crate::peer::PeerCell] handle

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::concurrency::{
    MpscReceiver, MpscSender, MpscUnboundedReceiver, MpscUnboundedSender,
};
use crate::errors::MessagingErr;
use crate::message::Envelope;
use crate::peer::acquaintances::AcquaintanceSet;
use crate::peer::messages::StopMessage;
use crate::peer::peer_cell::PeerStatus;
use crate::{PeerId, PeerName};

/// The global id allocator for peers
static PEER_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(0u64);

/// Retrieve a new peer id
fn get_new_peer_id() -> PeerId {
    PEER_ID_ALLOCATOR.fetch_add(1u64, Ordering::AcqRel)
}

// The inner-properties of a peer
pub(crate) struct PeerProperties {
    pub(crate) id: PeerId,
    pub(crate) name: Option<PeerName>,
    status: AtomicU8,
    pub(crate) stop: MpscSender<StopMessage>,
    pub(crate) message: MpscUnboundedSender<Envelope>,
    pub(crate) acquaintances: AcquaintanceSet,
}

impl PeerProperties {
    pub fn new(
        name: Option<PeerName>,
    ) -> (
        Self,
        MpscReceiver<StopMessage>,
        MpscUnboundedReceiver<Envelope>,
    ) {
        let (stop_tx, stop_rx) = crate::concurrency::mpsc_bounded(2);
        let (message_tx, message_rx) = crate::concurrency::mpsc_unbounded();
        (
            Self {
                id: get_new_peer_id(),
                name,
                status: AtomicU8::new(PeerStatus::Starting as u8),
                stop: stop_tx,
                message: message_tx,
                acquaintances: AcquaintanceSet::new(),
            },
            stop_rx,
            message_rx,
        )
    }

    pub fn get_status(&self) -> PeerStatus {
        match self.status.load(Ordering::SeqCst) {
            0u8 => PeerStatus::Starting,
            1u8 => PeerStatus::Running,
            2u8 => PeerStatus::Stopping,
            _ => PeerStatus::Stopped,
        }
    }

    pub fn set_status(&self, status: PeerStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    pub fn send_envelope(&self, message: Envelope) -> Result<(), MessagingErr> {
        self.message.send(message).map_err(|_| MessagingErr::SendErr)
    }

    pub fn send_stop(&self, reason: Option<String>) -> Result<(), MessagingErr> {
        let msg = reason.map(StopMessage::Reason).unwrap_or(StopMessage::Stop);
        self.stop.try_send(msg).map_err(|_| MessagingErr::SendErr)
    }
}
