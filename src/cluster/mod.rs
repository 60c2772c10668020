//! Cluster module - Plans changes to the replica groups of the quorum-based
//! search cluster.
//!
//! Every pass is computed fresh from the live and desired snapshots; nothing
//! is carried between passes.

mod group;
mod guard;
mod mapping;
mod plan;


pub use group::*;
pub use guard::*;
pub use mapping::*;
pub use plan::*;
