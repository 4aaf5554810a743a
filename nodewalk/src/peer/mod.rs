// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Peer runtime and the message dispatch loop
//!
//! A [Peer] owns a [crate::pool::ResourcePool] and processes [Envelope]s
//! one at a time off its message port. For every received message the loop
//!
//! 1. drops the message if it was already witnessed recently,
//! 2. executes it locally when the message still wants execution, and
//! 3. hands it back to the message's own propagation step while hop budget
//!    remains. Forwarding is what spends a hop (see [crate::propagation]);
//!    the initial local injection is free.
//!
//! Execution failures and panics are contained to the message that caused
//! them; the peer itself keeps running.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::concurrency::JoinHandle;
use crate::config::OverlayConfig;
use crate::message::{Envelope, MessageId};
use crate::pool::ResourcePool;
use crate::PeerName;

pub mod acquaintances;
pub mod messages;
pub mod peer_cell;
mod peer_properties;

pub use acquaintances::AcquaintanceSet;
pub use peer_cell::{PeerCell, PeerStatus, ACTIVE_STATES};

use messages::StopMessage;
use peer_cell::{PeerPortMessage, PeerPortSet};

#[cfg(test)]
mod tests;

/// Convert a panic payload to a printable string, if possible
pub(crate) fn get_panic_string(e: Box<dyn Any + Send>) -> String {
    match e.downcast::<String>() {
        Ok(v) => *v,
        Err(e) => match e.downcast::<&str>() {
            Ok(v) => v.to_string(),
            _ => "Unknown panic payload".to_string(),
        },
    }
}

/// A running peer in the overlay. This is the receiving side of a
/// [PeerCell]; messages execute against it and read its state.
pub struct Peer {
    myself: PeerCell,
    pool: ResourcePool,
    config: OverlayConfig,
}

impl Peer {
    /// Spawn a peer and start its dispatch loop on the runtime
    ///
    /// * `name`: An optional name for the peer. Named peers are enrolled in
    ///   the global [crate::registry] and must be unique.
    /// * `pool`: The pool of nodes this peer offers to the overlay
    /// * `config`: Protocol tunables for this peer
    ///
    /// Returns the peer's [PeerCell] handle along with the [JoinHandle] of
    /// its dispatch loop, or [crate::errors::SpawnErr] if the name was taken.
    pub fn spawn(
        name: Option<PeerName>,
        pool: ResourcePool,
        config: OverlayConfig,
    ) -> Result<(PeerCell, JoinHandle<()>), crate::errors::SpawnErr> {
        let (cell, ports) = PeerCell::new(name)?;
        cell.set_status(PeerStatus::Running);
        let peer = Self {
            myself: cell.clone(),
            pool,
            config,
        };
        let handle = crate::concurrency::spawn(async move { peer.processing_loop(ports).await });
        Ok((cell, handle))
    }

    /// Build a peer without starting a dispatch loop, for exercising
    /// message side effects directly
    #[cfg(test)]
    pub(crate) fn detached(pool: ResourcePool, config: OverlayConfig) -> Self {
        let (cell, _ports) = PeerCell::new(None).expect("Unnamed peers cannot collide");
        Self {
            myself: cell,
            pool,
            config,
        }
    }

    /// The handle addressing this peer
    pub fn cell(&self) -> &PeerCell {
        &self.myself
    }

    /// The pool of nodes this peer manages
    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// This peer's protocol configuration
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// The neighbors this peer forwards traffic to
    pub fn acquaintances(&self) -> &AcquaintanceSet {
        self.myself.acquaintances()
    }

    async fn processing_loop(self, mut ports: PeerPortSet) {
        tracing::debug!("{:?} started", self.myself);
        let mut seen = SeenMessages::new(self.config.message_memory);
        loop {
            match ports.listen_in_priority().await {
                Ok(PeerPortMessage::Stop(StopMessage::Stop)) => {
                    tracing::debug!("{:?} stopping", self.myself);
                    self.myself.set_status(PeerStatus::Stopping);
                    break;
                }
                Ok(PeerPortMessage::Stop(StopMessage::Reason(reason))) => {
                    tracing::debug!("{:?} stopping, reason: {}", self.myself, reason);
                    self.myself.set_status(PeerStatus::Stopping);
                    break;
                }
                Ok(PeerPortMessage::Message(envelope)) => {
                    self.dispatch(envelope, &mut seen).await;
                }
                Err(_) => {
                    // all senders dropped, nothing left to do
                    break;
                }
            }
        }
        self.myself.set_status(PeerStatus::Stopped);
        tracing::debug!("{:?} stopped", self.myself);
    }

    /// Process a single received message. This is the heart of the
    /// protocol: drop duplicates, execute, then forward while hop
    /// budget remains.
    async fn dispatch(&self, envelope: Envelope, seen: &mut SeenMessages) {
        let id = envelope.header().id();
        if seen.witness(id) {
            tracing::debug!("{:?} dropping already-seen message {}", self.myself, id);
            return;
        }
        tracing::trace!(
            "{:?} received message {} (ttl {})",
            self.myself,
            id,
            envelope.header().ttl()
        );

        if envelope.should_execute() {
            match AssertUnwindSafe(envelope.execute(self)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(
                        "{:?} failed executing message {}: {}",
                        self.myself,
                        id,
                        err
                    );
                }
                Err(panic_payload) => {
                    tracing::warn!(
                        "{:?} panicked executing message {}: {}",
                        self.myself,
                        id,
                        get_panic_string(panic_payload)
                    );
                }
            }
        }

        if envelope.header().ttl() > 0 && envelope.should_transmit() {
            envelope.transmit(self);
        } else {
            tracing::trace!("Message {} died at {:?}", id, self.myself);
        }
    }
}

/// A bounded memory of recently witnessed message ids, for dropping
/// duplicates a walk or flood delivers more than once. A memory of 0
/// disables duplicate detection entirely.
pub(crate) struct SeenMessages {
    memory: usize,
    ids: VecDeque<MessageId>,
}

impl SeenMessages {
    pub(crate) fn new(memory: usize) -> Self {
        Self {
            memory,
            ids: VecDeque::with_capacity(memory),
        }
    }

    /// Record a message id. Returns [true] if the id was already
    /// in memory (i.e. the message is an old one).
    pub(crate) fn witness(&mut self, id: MessageId) -> bool {
        if self.memory == 0 {
            return false;
        }
        if self.ids.contains(&id) {
            return true;
        }
        if self.ids.len() >= self.memory {
            self.ids.pop_front();
        }
        self.ids.push_back(id);
        false
    }
}
