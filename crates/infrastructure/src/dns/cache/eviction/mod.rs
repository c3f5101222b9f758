pub mod index;
pub mod scheduler;
pub mod ticket;

pub use index::EvictionIndex;
pub use scheduler::{sweep, EvictionScheduler, EvictionSettings};
pub use ticket::EvictionTicket;
