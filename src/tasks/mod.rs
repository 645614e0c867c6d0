//! Background tasks module
//! 
//! This module contains the display ticker that runs alongside the HTTP server.

pub mod ticker;

// Re-export main types
pub use ticker::{arm, TickHandle};
