#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

mod common;
mod error;
mod lookup;
pub mod refresh;
mod token;

pub use crate::common::{BucketInfo, Id, Node, RoutingTable, SharedRoutingTable, ID_SIZE};
pub use crate::lookup::{LookupError, PeerLookup};
pub use crate::refresh::{
    parse_bootstrap_nodes, Config, RefreshReport, Refresher, SeedAddr, DEFAULT_BOOTSTRAP_NODES,
    MAX_REFRESH_BUCKETS,
};
pub use crate::token::{Canceller, Token, TokenError};
pub use error::{Error, Result};
