// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Overlay error types

use std::fmt::Display;

use crate::PeerName;

/// Represents an error raised from within a message's local side effect
/// (e.g. the resource pool or the request handle failing internally). This
/// is the only error class which surfaces out of `execute`; it is caught at
/// the peer's dispatch loop, logged, and treated as "no node available for
/// this hop" to preserve the fire-and-forget contract of the overlay.
pub type PeerProcessingErr = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Spawn errors starting a peer
#[derive(Debug)]
pub enum SpawnErr {
    /// The named peer is already registered in the registry
    PeerAlreadyRegistered(PeerName),
}

impl std::error::Error for SpawnErr {}

impl Display for SpawnErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeerAlreadyRegistered(peer_name) => {
                write!(
                    f,
                    "Peer '{peer_name}' is already registered in the peer registry"
                )
            }
        }
    }
}

impl From<crate::registry::PeerRegistryErr> for SpawnErr {
    fn from(value: crate::registry::PeerRegistryErr) -> Self {
        match value {
            crate::registry::PeerRegistryErr::AlreadyRegistered(peer_name) => {
                SpawnErr::PeerAlreadyRegistered(peer_name)
            }
        }
    }
}

/// A messaging error has occurred
#[derive(Debug)]
pub enum MessagingErr {
    /// The inbound port you're trying to send a message to has been
    /// dropped/closed. If you're sending to a [crate::PeerCell] then that
    /// means the peer has stopped.
    SendErr,

    /// The channel you're trying to receive from has had all the senders
    /// dropped and is therefore closed
    ChannelClosed,
}

impl std::error::Error for MessagingErr {}

impl Display for MessagingErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SendErr => {
                write!(
                    f,
                    "Messaging failed to enqueue the message to the specified peer, the peer is likely stopped"
                )
            }
            Self::ChannelClosed => {
                write!(f, "Messaging failed because channel is closed")
            }
        }
    }
}
