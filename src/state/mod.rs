//! State management module
//! 
//! This module contains the stopwatch engine, the workout label and the
//! screen controller that ties them to the display and persistence.

pub mod app_state;
pub mod clock;
pub mod screen;
pub mod stopwatch;
pub mod workout_label;

// Re-export main types
pub use app_state::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use screen::{DisplayState, PressedButton, ScreenState};
pub use stopwatch::{Phase, StopwatchState};
pub use workout_label::WorkoutLabel;
