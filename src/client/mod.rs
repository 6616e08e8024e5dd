//! Data source module: Census API client and synthetic fallback.

mod census;
mod mock;
mod source;

pub use census::*;
pub use mock::*;
pub use source::*;
