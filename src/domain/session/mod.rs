//! Session entity and lifecycle rules.

mod model;

pub use model::{Session, DEFAULT_SESSION_NAME};
