//! Workout Timer - a single-screen workout stopwatch
//! 
//! This library provides the stopwatch engine, the transient and durable
//! persistence of the timer screen, and an HTTP surface for its controls.

pub mod config;
pub mod state;
pub mod api;
pub mod persistence;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
