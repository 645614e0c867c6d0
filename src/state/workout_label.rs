//! Workout label and last-session summary

use serde::{Deserialize, Serialize};

use crate::utils::time_format::format_session;

const UNNAMED_WORKOUT: &str = "*some workout*";

/// Label of the activity being timed and the summary of the previous session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutLabel {
    pub workout_type: String,
    pub last_workout_summary: String,
}

impl WorkoutLabel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished session of `total_millis` under `workout_type`
    pub fn complete_session(&mut self, workout_type: &str, total_millis: u64) {
        self.workout_type = workout_type.to_string();
        self.last_workout_summary = summary_sentence(workout_type, total_millis);
    }

    /// Whether there is a previous session to show
    pub fn has_summary(&self) -> bool {
        !self.last_workout_summary.is_empty()
    }
}

/// Build the "You spent MM:SS on ... last time." sentence
pub fn summary_sentence(workout_type: &str, total_millis: u64) -> String {
    let name = if workout_type.is_empty() {
        UNNAMED_WORKOUT
    } else {
        workout_type
    };
    format!("You spent {} on {} last time.", format_session(total_millis), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_summary() {
        assert_eq!(
            summary_sentence("push-ups", 105_000),
            "You spent 01:45 on push-ups last time."
        );
    }

    #[test]
    fn unnamed_summary() {
        assert_eq!(
            summary_sentence("", 4_000),
            "You spent 00:04 on *some workout* last time."
        );
    }

    #[test]
    fn complete_session_updates_both_fields() {
        let mut label = WorkoutLabel::new();
        assert!(!label.has_summary());

        label.complete_session("rowing", 61_000);
        assert_eq!(label.workout_type, "rowing");
        assert_eq!(label.last_workout_summary, "You spent 01:01 on rowing last time.");
        assert!(label.has_summary());
    }
}
