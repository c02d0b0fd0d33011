//! Miscellaneous common structs used throughout the library.

mod id;
mod node;
mod routing_table;

pub use id::*;
pub use node::*;
pub use routing_table::*;
