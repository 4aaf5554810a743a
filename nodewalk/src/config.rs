// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Tunables for the overlay protocol
//!
//! Every peer and every caller-side [crate::NodeLookup] carries an
//! [OverlayConfig]. The defaults are sensible for a small overlay; large
//! deployments typically raise the hop budget and the message memory.

use crate::concurrency::Duration;

/// Configuration of a peer's protocol behavior
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    /// Hop budget (TTL) stamped on every new message. Spent once per
    /// forward, so a budget of n lets a message reach peers up to n hops
    /// from the point of injection; at zero it is never forwarded again
    pub ttl: u32,

    /// Number of recently-seen message ids each peer remembers for
    /// duplicate suppression. `0` disables the seen-cache entirely
    pub message_memory: usize,

    /// How long a [crate::NodeLookup] waits on one request before
    /// re-injecting a fresh one
    pub lookup_frequency: Duration,

    /// Overall deadline for [crate::NodeLookup::acquire]
    pub acquisition_timeout: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            ttl: 5,
            message_memory: 100,
            lookup_frequency: Duration::from_secs(30),
            acquisition_timeout: Duration::from_secs(300),
        }
    }
}

impl OverlayConfig {
    /// Set the hop budget stamped on new messages
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the number of message ids remembered for duplicate suppression
    pub fn with_message_memory(mut self, message_memory: usize) -> Self {
        self.message_memory = message_memory;
        self
    }

    /// Set the re-injection period of the caller-side lookup loop
    pub fn with_lookup_frequency(mut self, lookup_frequency: Duration) -> Self {
        self.lookup_frequency = lookup_frequency;
        self
    }

    /// Set the overall node-acquisition deadline
    pub fn with_acquisition_timeout(mut self, acquisition_timeout: Duration) -> Self {
        self.acquisition_timeout = acquisition_timeout;
        self
    }
}
