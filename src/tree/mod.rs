//! Branching move history.

mod error;
mod node;
mod store;

pub use error::TreeError;
pub use node::{Node, NodeId};
pub use store::PositionTree;
