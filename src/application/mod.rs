//! Application layer - the client state container and synchronization
//! engine.

mod client;
mod errors;
mod observer;
mod state;
mod sync;

pub use client::EstimationClient;
pub use errors::CommandError;
pub use observer::{StateChange, StateObserver};
pub use sync::SyncStatus;
