// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Propagation policies: how an in-flight message picks its next hop(s)
//!
//! The policies take the acquaintance set explicitly rather than reaching
//! into any ambient registry, so they are testable in isolation.
//!
//! [RandomWalk] is the workhorse of the discovery protocol: probabilistic
//! coverage of the network with no topology knowledge at any peer, at the
//! cost of no delivery guarantee. That trade is acceptable because every
//! node request is wrapped by the caller in its own retry loop
//! ([crate::NodeLookup]).

use rand::seq::SliceRandom;

use crate::message::{Envelope, OverlayMessage};
use crate::peer::AcquaintanceSet;

/// Forward a message to one acquaintance chosen uniformly at random
pub struct RandomWalk;

impl RandomWalk {
    /// Transmit `message` to a uniformly chosen member of `acquaintances`,
    /// spending one hop of its budget.
    ///
    /// An empty acquaintance set is not an error: a disconnected or lonely
    /// peer simply lets the message die. A send failure (the chosen peer
    /// stopped between selection and send) is likewise swallowed; the
    /// overlay never retries a hop.
    ///
    /// * `message` - The envelope to forward, consumed
    /// * `acquaintances` - The candidate next hops
    pub fn transmit(&self, mut message: Envelope, acquaintances: &AcquaintanceSet) {
        match acquaintances.random() {
            Some(next_hop) => {
                message.header_mut().decrement_ttl();
                let id = message.header().id();
                if next_hop.send_envelope(message).is_err() {
                    tracing::debug!("Next hop {next_hop:?} is stopped, dropping message #{id}");
                }
            }
            None => {
                tracing::debug!(
                    "No acquaintance to forward message #{} to, dropping it",
                    message.header().id()
                );
            }
        }
    }
}

/// Forward a copy of a message to every acquaintance
///
/// Loop-safe only because each peer's dispatch loop suppresses duplicate
/// message ids; do not flood with duplicate suppression disabled.
pub struct Flood;

impl Flood {
    /// Transmit a clone of `message` to every member of `acquaintances`,
    /// each copy one hop poorer than the original
    ///
    /// Returns the number of peers the message was successfully enqueued to
    pub fn transmit<TMessage>(&self, message: &TMessage, acquaintances: &AcquaintanceSet) -> usize
    where
        TMessage: OverlayMessage + Clone,
    {
        let mut reached = 0;
        for next_hop in acquaintances.snapshot() {
            let mut copy = message.clone();
            copy.header_mut().decrement_ttl();
            if next_hop.send_message(copy).is_ok() {
                reached += 1;
            }
        }
        reached
    }
}

/// Choose one element of `candidates` uniformly at random
pub(crate) fn choose_uniform<T: Clone>(candidates: &[T]) -> Option<T> {
    candidates.choose(&mut rand::thread_rng()).cloned()
}
