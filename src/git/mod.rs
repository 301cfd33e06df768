//! Version-control backend
//!
//! - `Backend` / `BackendOpener` - What the status layer needs from git
//! - `GitBackend` - gitoxide for open and HEAD, the git CLI for status and checkout
//! - `GitExecutor` - Bounded, timed git subprocesses

mod backend;
mod executor;
mod gateway;
mod porcelain;

pub use backend::*;
pub use executor::*;
pub use gateway::*;
pub use porcelain::*;
