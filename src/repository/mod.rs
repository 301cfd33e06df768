//! Repository status facade
//!
//! - `Repository` - Public API composing backend, cache and notifications
//! - `RefreshCoordinator` - Full and per-path refreshes with change detection
//! - `StatusEvents` - Observer registration and disposal
//! - `TriggerWiring` - Host buffer and focus events to refreshes

mod capability;
mod coordinator;
mod events;
mod facade;
mod sync;
mod triggers;

#[cfg(test)]
mod testing;

pub use capability::*;
pub use coordinator::*;
pub use events::*;
pub use facade::*;
pub use triggers::*;
