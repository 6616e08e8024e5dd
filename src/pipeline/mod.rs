//! Pipeline module - the sequential collection loop.

mod collect;

pub use collect::*;
