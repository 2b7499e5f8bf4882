//! Ports - Interfaces to the external durable store.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the estimation core and the outside world. Adapters implement these
//! ports.
//!
//! - `EstimationStore` - persistence capability of the durable store
//! - `StoreChangeFeed` - row-level change notification streams

mod change_feed;
mod estimation_store;

pub use change_feed::{
    ChangeEvent, ChangeKind, ChangeScope, ChangeStream, StoreChangeFeed, SubscriptionError,
};
pub use estimation_store::EstimationStore;
