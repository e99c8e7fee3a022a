//! GGRS session management
//!
//! [`RollbackSession`] wraps local and sync-test sessions around a
//! [`Simulation`](crate::Simulation); [`RollbackDriver`] turns GGRS requests
//! into snapshot saves, rollbacks and frame advances.

mod builder;
mod driver;
mod session;
mod types;


pub use driver::RollbackDriver;
pub use session::RollbackSession;
pub use types::SessionType;
