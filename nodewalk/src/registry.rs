// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Represents a global registry of named [PeerCell]s
//!
//! Peers can be spawned with a name, in which case they are enrolled here
//! and retrievable from anywhere in the process via [where_is]. Name
//! enrollment and removal is handled automatically by the peer lifecycle.
//!
//! ## Example
//!
//! ```rust
//! let maybe_peer = nodewalk::registry::where_is("macedonia".to_string());
//! if let Some(peer) = maybe_peer {
//!     peer.stop(None);
//! }
//! ```

use std::sync::Arc;

use dashmap::mapref::entry::Entry::{Occupied, Vacant};
use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::peer::PeerCell;
use crate::PeerName;

/// Errors involving the global peer registry
#[derive(Debug)]
pub enum PeerRegistryErr {
    /// The peer's name is already enrolled
    AlreadyRegistered(PeerName),
}

impl std::fmt::Display for PeerRegistryErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRegistered(name) => {
                write!(f, "Peer '{}' is already registered", name)
            }
        }
    }
}

impl std::error::Error for PeerRegistryErr {}

static PEER_REGISTRY: OnceCell<Arc<DashMap<PeerName, PeerCell>>> = OnceCell::new();

fn get_peer_registry<'a>() -> &'a Arc<DashMap<PeerName, PeerCell>> {
    PEER_REGISTRY.get_or_init(|| Arc::new(DashMap::new()))
}

/// Put a peer into the registry
pub(crate) fn enroll(name: PeerName, peer: PeerCell) -> Result<(), PeerRegistryErr> {
    match get_peer_registry().entry(name.clone()) {
        Occupied(_) => Err(PeerRegistryErr::AlreadyRegistered(name)),
        Vacant(vacancy) => {
            vacancy.insert(peer);
            Ok(())
        }
    }
}

/// Remove a peer from the registry given its name
pub(crate) fn unenroll(name: &str) {
    let _ = get_peer_registry().remove(name);
}

/// Try and retrieve a peer from the registry
///
/// * `name`: The name of the peer to retrieve
///
/// Returns [Some(_)] if the peer exists in the registry, [None] otherwise
pub fn where_is(name: PeerName) -> Option<PeerCell> {
    get_peer_registry()
        .get(&name)
        .map(|peer| peer.value().clone())
}

/// Returns a list of names of all registered peers
pub fn registered() -> Vec<PeerName> {
    get_peer_registry()
        .iter()
        .map(|entry| entry.key().clone())
        .collect()
}
