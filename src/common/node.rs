//! Struct and implementation of the Node entry in the Kademlia routing table
use std::{
    fmt::{self, Display, Formatter},
    net::SocketAddr,
};

use crate::common::Id;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Node entry in Kademlia routing table, and the result of a successful peer lookup.
pub struct Node {
    id: Id,
    address: SocketAddr,
}

impl Node {
    /// Creates a new Node from an id and socket address.
    pub fn new(id: Id, address: SocketAddr) -> Node {
        Node { id, address }
    }

    /// Creates a node with a random Id, useful for testing.
    pub fn random() -> Node {
        Node {
            id: Id::random(),
            address: SocketAddr::from(([127, 0, 0, 1], rand::random::<u16>())),
        }
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}
