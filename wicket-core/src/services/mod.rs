//! Services that combine the storage contracts into sign-in operations.
pub mod session;

pub use session::{SessionManager, SessionManagerConfig};
