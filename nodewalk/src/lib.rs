// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! `nodewalk`: a peer-to-peer node-discovery overlay for dynamic,
//! centrally-unregistered networks.
//!
//! Peers hold a local [ResourcePool] of compute nodes and a set of
//! acquaintances (other peers they happen to know). A caller who needs a
//! spare node does not consult a directory service; instead it injects a
//! [SingleNodeRequest] message into its local peer. The message is executed
//! against the local pool and, when no node is free, forwarded to one
//! acquaintance chosen uniformly at random. Every hop repeats the same
//! decision until either a node is leased and delivered back to the caller,
//! or the message's hop budget runs out and it dies silently. The protocol
//! is deliberately best-effort: correctness lives in the single-acceptance
//! [RequestHandle], not in the overlay, and callers wrap every request in
//! their own retry loop ([NodeLookup]).
//!
//! ## Getting started
//!
//! Install `nodewalk` by adding the following to your Cargo.toml dependencies
//!
//! ```toml
//! [dependencies]
//! nodewalk = "0.2"
//! ```
//!
//! ## Example
//!
//! A two peer overlay where one peer holds the only free node
//!
//! ```rust
//! use nodewalk::concurrency::Duration;
//! use nodewalk::{
//!     LookupResult, NodeInfo, NodeLookup, NodeTags, OverlayConfig, Peer, ResourcePool,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OverlayConfig::default();
//!
//!     // a peer holding one free node
//!     let pool = ResourcePool::new();
//!     pool.add_node(NodeInfo::new("rmi://provider.example:1099/node0"));
//!     let (provider, provider_handle) =
//!         Peer::spawn(Some("provider".to_string()), pool, config.clone())
//!             .expect("Failed to start provider peer");
//!
//!     // a peer with nothing to offer, acquainted with the provider
//!     let (seeker, seeker_handle) =
//!         Peer::spawn(Some("seeker".to_string()), ResourcePool::new(), config.clone())
//!             .expect("Failed to start seeker peer");
//!     seeker.acquaintances().insert(provider.clone());
//!
//!     // discover a node via the overlay
//!     let lookup = NodeLookup::new(seeker.clone(), NodeTags::default(), config);
//!     match lookup.acquire_within(Duration::from_secs(5)).await {
//!         LookupResult::Found(lease) => println!("leased {}", lease.info().url()),
//!         other => println!("no node found: {other:?}"),
//!     }
//!
//!     seeker.stop(None);
//!     provider.stop(None);
//!     let _ = tokio::join!(seeker_handle, provider_handle);
//! }
//! ```
//!
//! ## Guarantees
//!
//! The overlay makes no delivery guarantee and no hop-count guarantee.
//! What it does guarantee:
//!
//! 1. At most one delivery ever succeeds per [RequestHandle], no matter how
//!    many copies of the request race in from different walk paths. Losers
//!    get their lease back and return it to the pool.
//! 2. A message whose hop budget reaches zero is dropped, bounding the work
//!    wasted on abandoned requests.
//! 3. Pool conservation: leases are RAII guards, so a node is never lost to
//!    a dropped reply channel or a panicking handler.

#![warn(unused_imports)]
#![warn(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

/// A peer's globally unique identifier
pub type PeerId = u64;

/// A peer's friendly name, used in the process-wide [registry]
pub type PeerName = String;

pub mod concurrency;
pub mod config;
pub mod errors;
pub mod handle;
pub mod lookup;
pub mod message;
pub mod node;
pub mod peer;
pub mod pool;
pub mod propagation;
pub mod registry;

#[cfg(test)]
mod common_test;

// re-exports
pub use config::OverlayConfig;
pub use errors::{MessagingErr, PeerProcessingErr, SpawnErr};
pub use handle::{pending_node, DeliverErr, LookupResult, NodeReceipt, RequestHandle};
pub use lookup::NodeLookup;
pub use message::{
    AcquaintanceDump, Envelope, Header, MessageId, OverlayMessage, SingleNodeRequest,
};
pub use node::{NodeInfo, NodeTags};
pub use peer::{AcquaintanceSet, Peer, PeerCell, PeerStatus, ACTIVE_STATES};
pub use pool::{NodeLease, ResourcePool};
pub use propagation::{Flood, RandomWalk};
