//! Screen state: stopwatch, workout label and the widgets around them

use serde::{Deserialize, Serialize};

use super::{Phase, StopwatchState, WorkoutLabel};
use crate::{persistence::ScreenSnapshot, utils::time_format::format_elapsed};

/// Which control was pressed last, for the dimmed-button indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressedButton {
    #[default]
    None,
    Start,
    Pause,
    Stop,
}

impl PressedButton {
    pub fn code(self) -> i32 {
        match self {
            PressedButton::None => 0,
            PressedButton::Start => 1,
            PressedButton::Pause => 2,
            PressedButton::Stop => 3,
        }
    }

    /// Unknown codes map to `None`
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PressedButton::Start,
            2 => PressedButton::Pause,
            3 => PressedButton::Stop,
            _ => PressedButton::None,
        }
    }
}

/// What the display surface shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Elapsed time as `HH:MM:SS`
    pub elapsed: String,
    pub elapsed_millis: u64,
    pub phase: Phase,
    pub last_workout_summary: String,
    pub summary_visible: bool,
    pub workout_input: String,
    pub pressed_button: PressedButton,
}

impl Default for DisplayState {
    fn default() -> Self {
        ScreenState::new().display(0)
    }
}

/// All state owned by the timer screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenState {
    pub stopwatch: StopwatchState,
    pub label: WorkoutLabel,
    /// Current contents of the workout-type input field
    pub workout_input: String,
    pub pressed_button: PressedButton,
    /// Counter value last shown on the display
    pub rendered_millis: u64,
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the display without touching state
    pub fn display(&self, now: i64) -> DisplayState {
        let elapsed_millis = self.stopwatch.elapsed(now);
        DisplayState {
            elapsed: format_elapsed(elapsed_millis),
            elapsed_millis,
            phase: self.stopwatch.phase(),
            last_workout_summary: self.label.last_workout_summary.clone(),
            summary_visible: self.label.has_summary(),
            workout_input: self.workout_input.clone(),
            pressed_button: self.pressed_button,
        }
    }

    /// Derive the display and remember the rendered counter
    pub fn render(&mut self, now: i64) -> DisplayState {
        let display = self.display(now);
        self.rendered_millis = display.elapsed_millis;
        display
    }

    /// Capture every field.
    ///
    /// A running stopwatch is captured at its last rendered counter, not
    /// re-derived from the current time.
    pub fn capture(&self) -> ScreenSnapshot {
        let accumulated = if self.stopwatch.is_running() {
            self.rendered_millis.max(self.stopwatch.accumulated_millis())
        } else {
            self.stopwatch.accumulated_millis()
        };

        ScreenSnapshot {
            accumulated_millis: Some(accumulated),
            is_running: Some(self.stopwatch.is_running()),
            has_started: Some(self.stopwatch.has_started()),
            workout_type: Some(self.label.workout_type.clone()),
            last_workout_summary: Some(self.label.last_workout_summary.clone()),
            pressed_button: Some(self.pressed_button),
            workout_input: Some(self.workout_input.clone()),
        }
    }

    /// Rebuild screen state from a snapshot; absent fields take their zero value
    pub fn from_snapshot(snapshot: ScreenSnapshot, now: i64) -> Self {
        let stopwatch = StopwatchState::restored(
            snapshot.accumulated_millis.unwrap_or(0),
            snapshot.is_running.unwrap_or(false),
            snapshot.has_started.unwrap_or(false),
            now,
        );
        let workout_type = snapshot.workout_type.unwrap_or_default();
        let workout_input = snapshot
            .workout_input
            .unwrap_or_else(|| workout_type.clone());
        let rendered_millis = stopwatch.elapsed(now);

        Self {
            stopwatch,
            label: WorkoutLabel {
                workout_type,
                last_workout_summary: snapshot.last_workout_summary.unwrap_or_default(),
            },
            workout_input,
            pressed_button: snapshot.pressed_button.unwrap_or_default(),
            rendered_millis,
        }
    }
}
