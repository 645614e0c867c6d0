//! Duration formatting for the timer display and workout summaries

const MSEC_HOUR: u64 = 3_600_000;
const MSEC_MINUTE: u64 = 60_000;
const MSEC_SECOND: u64 = 1_000;

/// Format elapsed milliseconds as `HH:MM:SS`.
///
/// Fields truncate toward zero. Hours are not wrapped and grow past two digits.
pub fn format_elapsed(millis: u64) -> String {
    let hours = millis / MSEC_HOUR;
    let minutes = (millis / MSEC_MINUTE) % 60;
    let seconds = (millis / MSEC_SECOND) % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a finished session as `MM:SS` with total (unwrapped) minutes
pub fn format_session(millis: u64) -> String {
    let minutes = millis / MSEC_MINUTE;
    let seconds = (millis / MSEC_SECOND) % 60;
    format!("{:02}:{:02}", minutes, seconds)
}
