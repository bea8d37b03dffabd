//! Network layer - transports and the dispatch pipeline
//!
//! The Network actor receives dispatch commands and sends back settled
//! artifacts. Transports hide which backend carries the request.

pub mod actor;
pub mod client;
pub mod dispatch;
pub mod native;
pub mod sandboxed;
pub mod transport;

pub use actor::NetworkActor;
pub use transport::{Transport, Transports};
