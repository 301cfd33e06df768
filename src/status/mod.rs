//! Status vocabulary, path keys and the status cache
//!
//! - `StatusFlags` - Named status flags and classification predicates
//! - `Relativizer` - Absolute path to repository-relative key conversion
//! - `StatusCache` - Last known status per path with change detection

mod bits;
mod cache;
mod path;

pub use bits::*;
pub use cache::*;
pub use path::*;
