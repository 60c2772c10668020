//! Diff module - Decides whether a live object really differs from its
//! desired counterpart.
//!
//! A structural differ lowers the pair into marked lines, and a filter keeps
//! only the changes that are not explained by platform defaults or by fields
//! the desired object intentionally leaves unset.

mod compare;
mod differ;
mod filter;
mod line;


pub use compare::*;
pub use differ::*;
pub use filter::*;
pub use line::*;
