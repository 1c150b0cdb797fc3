//! Cross-cutting support: shutdown coordination and input validation

pub mod shutdown;
pub mod validation;

pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
