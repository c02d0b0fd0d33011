//! Peer lookup, the query that resolves an [Id] to a [Node] through the overlay.

use crate::common::{Id, Node};
use crate::token::{Token, TokenError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Peer lookup errors.
pub enum LookupError {
    /// No peer with the target [Id] could be reached.
    #[error("peer not found")]
    NotFound,

    #[error("lookup deadline exceeded")]
    DeadlineExceeded,

    #[error("lookup was cancelled")]
    Cancelled,

    /// Any other failure, transport errors included.
    #[error("{0}")]
    Other(String),
}

impl From<TokenError> for LookupError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Cancelled => LookupError::Cancelled,
            TokenError::DeadlineExceeded => LookupError::DeadlineExceeded,
        }
    }
}

/// Finds a peer in the overlay.
///
/// Implementations must return promptly once `token` is done, with the
/// matching [LookupError::Cancelled] or [LookupError::DeadlineExceeded].
pub trait PeerLookup: Send + Sync {
    fn find_peer(&self, token: &Token, target: Id) -> Result<Node, LookupError>;
}

impl<F> PeerLookup for F
where
    F: Fn(&Token, Id) -> Result<Node, LookupError> + Send + Sync,
{
    fn find_peer(&self, token: &Token, target: Id) -> Result<Node, LookupError> {
        self(token, target)
    }
}
