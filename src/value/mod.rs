//! Value module - In-memory representation of live and desired objects.
//!
//! This module also decides when a leaf value is logically empty.

mod value;

pub use value::*;
