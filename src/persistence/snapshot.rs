//! Screen snapshot contract shared by the transient and durable tiers
//!
//! Both tiers serialize the same [`ScreenSnapshot`]; which fields each tier
//! carries, and under which key, is decided by [`Field::key`] alone.

use tracing::debug;

use super::{bundle::Bundle, store::KeyValueStore};
use crate::state::PressedButton;

/// Persistence lifetime of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Survives a screen rebuild inside the process
    Transient,
    /// Survives a process restart
    Durable,
}

/// A snapshot field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AccumulatedMillis,
    IsRunning,
    HasStarted,
    WorkoutType,
    LastWorkoutSummary,
    PressedButton,
    WorkoutInput,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::AccumulatedMillis,
        Field::IsRunning,
        Field::HasStarted,
        Field::WorkoutType,
        Field::LastWorkoutSummary,
        Field::PressedButton,
        Field::WorkoutInput,
    ];

    /// Storage key of this field in `tier`, or `None` if the tier does not carry it
    pub fn key(self, tier: Tier) -> Option<&'static str> {
        match (tier, self) {
            (Tier::Transient, Field::AccumulatedMillis) => Some("state_accumulated_millis"),
            (Tier::Transient, Field::IsRunning) => Some("state_is_timer_running"),
            (Tier::Transient, Field::HasStarted) => Some("state_has_timer_started"),
            (Tier::Transient, Field::WorkoutType) => Some("state_workout_type"),
            (Tier::Transient, Field::LastWorkoutSummary) => Some("state_last_workout_info"),
            (Tier::Transient, Field::PressedButton) => Some("state_pressed_button"),
            (Tier::Transient, Field::WorkoutInput) => Some("state_workout_input"),
            (Tier::Durable, Field::WorkoutType) => Some("workout_type"),
            (Tier::Durable, Field::LastWorkoutSummary) => Some("last_workout_info"),
            (Tier::Durable, _) => None,
        }
    }
}

impl Tier {
    /// Fields carried by this tier
    pub fn fields(self) -> impl Iterator<Item = Field> {
        Field::ALL
            .into_iter()
            .filter(move |field| field.key(self).is_some())
    }
}

/// Write side of a snapshot backend
pub trait SnapshotSink {
    fn put_long(&mut self, key: &str, value: i64);
    fn put_int(&mut self, key: &str, value: i32);
    fn put_bool(&mut self, key: &str, value: bool);
    fn put_string(&mut self, key: &str, value: &str);
}

/// Read side of a snapshot backend; `None` means the key is absent
pub trait SnapshotSource {
    fn get_long(&self, key: &str) -> Option<i64>;
    fn get_int(&self, key: &str) -> Option<i32>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_string(&self, key: &str) -> Option<String>;
}

impl SnapshotSink for Bundle {
    fn put_long(&mut self, key: &str, value: i64) {
        Bundle::put_long(self, key, value);
    }

    fn put_int(&mut self, key: &str, value: i32) {
        Bundle::put_int(self, key, value);
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        Bundle::put_bool(self, key, value);
    }

    fn put_string(&mut self, key: &str, value: &str) {
        Bundle::put_string(self, key, value);
    }
}

impl SnapshotSource for Bundle {
    fn get_long(&self, key: &str) -> Option<i64> {
        self.long(key)
    }

    fn get_int(&self, key: &str) -> Option<i32> {
        self.int(key)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.bool(key)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.string(key)
    }
}

/// Adapts a string-only [`KeyValueStore`] to the snapshot traits
pub struct StringEntries<'a, S: KeyValueStore + ?Sized>(pub &'a mut S);

impl<S: KeyValueStore + ?Sized> SnapshotSink for StringEntries<'_, S> {
    fn put_long(&mut self, key: &str, value: i64) {
        self.0.put(key, value.to_string());
    }

    fn put_int(&mut self, key: &str, value: i32) {
        self.0.put(key, value.to_string());
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.0.put(key, value.to_string());
    }

    fn put_string(&mut self, key: &str, value: &str) {
        self.0.put(key, value.to_string());
    }
}

impl<S: KeyValueStore + ?Sized> SnapshotSource for StringEntries<'_, S> {
    fn get_long(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(|v| v.parse().ok())
    }

    fn get_int(&self, key: &str) -> Option<i32> {
        self.0.get(key).and_then(|v| v.parse().ok())
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(|v| v.parse().ok())
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.0.get(key)
    }
}

/// Serializable view of the screen state.
///
/// Every field is optional so that a partial read (one tier, or missing keys)
/// can be layered over another with [`ScreenSnapshot::overlay`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenSnapshot {
    pub accumulated_millis: Option<u64>,
    pub is_running: Option<bool>,
    pub has_started: Option<bool>,
    pub workout_type: Option<String>,
    pub last_workout_summary: Option<String>,
    pub pressed_button: Option<PressedButton>,
    pub workout_input: Option<String>,
}

impl ScreenSnapshot {
    /// Write the fields carried by `tier`; absent values are skipped
    pub fn write(&self, tier: Tier, sink: &mut dyn SnapshotSink) {
        for field in tier.fields() {
            let Some(key) = field.key(tier) else { continue };
            match field {
                Field::AccumulatedMillis => {
                    if let Some(v) = self.accumulated_millis {
                        sink.put_long(key, i64::try_from(v).unwrap_or(i64::MAX));
                    }
                }
                Field::IsRunning => {
                    if let Some(v) = self.is_running {
                        sink.put_bool(key, v);
                    }
                }
                Field::HasStarted => {
                    if let Some(v) = self.has_started {
                        sink.put_bool(key, v);
                    }
                }
                Field::WorkoutType => {
                    if let Some(v) = &self.workout_type {
                        sink.put_string(key, v);
                    }
                }
                Field::LastWorkoutSummary => {
                    if let Some(v) = &self.last_workout_summary {
                        sink.put_string(key, v);
                    }
                }
                Field::PressedButton => {
                    if let Some(v) = self.pressed_button {
                        sink.put_int(key, v.code());
                    }
                }
                Field::WorkoutInput => {
                    if let Some(v) = &self.workout_input {
                        sink.put_string(key, v);
                    }
                }
            }
        }
        debug!("Wrote {:?} snapshot", tier);
    }

    /// Read the fields carried by `tier`
    pub fn read(tier: Tier, source: &dyn SnapshotSource) -> Self {
        let mut snapshot = Self::default();
        for field in tier.fields() {
            let Some(key) = field.key(tier) else { continue };
            match field {
                Field::AccumulatedMillis => {
                    snapshot.accumulated_millis = source
                        .get_long(key)
                        .map(|v| u64::try_from(v).unwrap_or(0));
                }
                Field::IsRunning => snapshot.is_running = source.get_bool(key),
                Field::HasStarted => snapshot.has_started = source.get_bool(key),
                Field::WorkoutType => snapshot.workout_type = source.get_string(key),
                Field::LastWorkoutSummary => {
                    snapshot.last_workout_summary = source.get_string(key);
                }
                Field::PressedButton => {
                    snapshot.pressed_button = source.get_int(key).map(PressedButton::from_code);
                }
                Field::WorkoutInput => snapshot.workout_input = source.get_string(key),
            }
        }
        snapshot
    }

    /// Layer `top` over `self`; fields present in `top` win
    pub fn overlay(self, top: Self) -> Self {
        Self {
            accumulated_millis: top.accumulated_millis.or(self.accumulated_millis),
            is_running: top.is_running.or(self.is_running),
            has_started: top.has_started.or(self.has_started),
            workout_type: top.workout_type.or(self.workout_type),
            last_workout_summary: top.last_workout_summary.or(self.last_workout_summary),
            pressed_button: top.pressed_button.or(self.pressed_button),
            workout_input: top.workout_input.or(self.workout_input),
        }
    }
}
