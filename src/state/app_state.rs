//! Timer screen controller and host lifecycle

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{Clock, DisplayState, PressedButton, ScreenState};
use crate::{
    persistence::{Bundle, KeyValueStore, ScreenSnapshot, StringEntries, Tier},
    tasks::ticker::{self, TickHandle},
};

/// Display ticker slot and the visibility it depends on.
///
/// Every transition that may arm or cancel the ticker holds this lock for its
/// whole duration, so a state change and its ticker change are never split.
#[derive(Debug)]
struct TickerSlot {
    handle: Option<TickHandle>,
    foreground: bool,
}

impl TickerSlot {
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Cancelling ticker");
            handle.cancel();
        }
    }
}

/// Owns the timer screen, its display ticker and both persistence tiers
pub struct AppState {
    /// Current screen state (stopwatch, label, input widgets)
    pub screen: Arc<Mutex<ScreenState>>,
    clock: Arc<dyn Clock>,
    /// Display refresh interval while running
    pub tick_interval: Duration,
    ticker: Mutex<TickerSlot>,
    durable: Mutex<Box<dyn KeyValueStore>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Display surface; every render is published here
    pub display_tx: Arc<watch::Sender<DisplayState>>,
    /// Keep the receiver alive to prevent channel closure
    pub _display_rx: watch::Receiver<DisplayState>,
}

impl AppState {
    /// Create the controller and build the screen from the durable store
    pub fn new(
        port: u16,
        host: String,
        tick_interval: Duration,
        clock: Arc<dyn Clock>,
        durable: Box<dyn KeyValueStore>,
    ) -> Self {
        let (display_tx, display_rx) = watch::channel(DisplayState::default());

        let state = Self {
            screen: Arc::new(Mutex::new(ScreenState::new())),
            clock,
            tick_interval,
            ticker: Mutex::new(TickerSlot {
                handle: None,
                foreground: true,
            }),
            durable: Mutex::new(durable),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            display_tx: Arc::new(display_tx),
            _display_rx: display_rx,
        };

        if let Err(e) = state.create_screen(None) {
            error!("Failed to create timer screen: {}", e);
        }
        state
    }

    /// Build the screen from durable state, then from `saved` if given.
    ///
    /// Transient fields take precedence over durable ones.
    pub fn create_screen(&self, saved: Option<&Bundle>) -> Result<DisplayState, String> {
        let mut ticker = self.lock_ticker()?;
        self.build_screen(&mut ticker, saved)
    }

    /// Apply an update to the screen, render it, and publish the result
    pub fn update_screen<F, R>(&self, action: &str, updater: F) -> Result<(DisplayState, R), String>
    where
        F: FnOnce(&mut ScreenState, i64) -> R,
    {
        let now = self.clock.now_millis();
        let mut screen = self.lock_screen()?;

        let result = updater(&mut *screen, now);
        let view = screen.render(now);
        drop(screen); // Release the lock early

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        self.publish(view.clone());
        Ok((view, result))
    }

    /// Start or resume the stopwatch
    pub fn start(&self) -> Result<DisplayState, String> {
        let mut ticker = self.lock_ticker()?;
        let (view, started) = self.update_screen("start", |screen, now| {
            screen.pressed_button = PressedButton::Start;
            screen.stopwatch.start(now)
        })?;

        if started {
            info!("Stopwatch running from {}", view.elapsed);
            if ticker.foreground {
                self.arm_ticker(&mut ticker);
            }
        } else {
            debug!("Start ignored, stopwatch already running");
        }
        Ok(view)
    }

    /// Pause a running stopwatch
    pub fn pause(&self) -> Result<DisplayState, String> {
        let mut ticker = self.lock_ticker()?;
        let (view, paused) = self.update_screen("pause", |screen, now| {
            screen.pressed_button = PressedButton::Pause;
            screen.stopwatch.pause(now)
        })?;

        if paused {
            ticker.cancel();
            info!("Stopwatch paused at {}", view.elapsed);
        } else {
            debug!("Pause ignored, stopwatch not running");
        }
        Ok(view)
    }

    /// Stop the stopwatch and record the finished session
    pub fn stop(&self) -> Result<DisplayState, String> {
        let mut ticker = self.lock_ticker()?;
        let (view, finished) = self.update_screen("stop", |screen, now| {
            screen.pressed_button = PressedButton::Stop;
            let total = screen.stopwatch.stop(now)?;
            let workout_type = screen.workout_input.clone();
            screen.label.complete_session(&workout_type, total);
            Some(total)
        })?;

        match finished {
            Some(total) => {
                ticker.cancel();
                info!("Workout finished after {} ms: {}", total, view.last_workout_summary);
            }
            None => debug!("Stop ignored, stopwatch idle"),
        }
        Ok(view)
    }

    /// Replace the contents of the workout-type input field
    pub fn set_workout_input(&self, text: &str) -> Result<DisplayState, String> {
        let (view, ()) = self.update_screen("workout-type", |screen, _| {
            screen.workout_input = text.to_string();
        })?;
        debug!("Workout input set to {:?}", text);
        Ok(view)
    }

    /// Current display, derived at the current instant
    pub fn display(&self) -> Result<DisplayState, String> {
        let now = self.clock.now_millis();
        self.lock_screen().map(|screen| screen.display(now))
    }

    /// Snapshot the screen into a fresh transient bundle.
    ///
    /// The display counter is brought up to date first, the way a tick would,
    /// and the bundle stores that counter value.
    pub fn save_instance_state(&self) -> Result<Bundle, String> {
        let now = self.clock.now_millis();
        let mut screen = self.lock_screen()?;
        screen.render(now);
        let snapshot = screen.capture();
        drop(screen);

        let mut bundle = Bundle::new();
        snapshot.write(Tier::Transient, &mut bundle);
        Ok(bundle)
    }

    /// Tear the screen down and rebuild it across a configuration change
    pub fn recreate(&self) -> Result<DisplayState, String> {
        info!("Configuration change, recreating timer screen");
        let mut ticker = self.lock_ticker()?;
        let bundle = self.save_instance_state()?;
        ticker.cancel();
        self.build_screen(&mut ticker, Some(&bundle))
    }

    /// The screen is no longer visible: stop refreshing and persist labels
    pub fn leave_foreground(&self) -> Result<(), String> {
        info!("Timer screen left the foreground");
        {
            let mut ticker = self.lock_ticker()?;
            ticker.foreground = false;
            let now = self.clock.now_millis();
            self.lock_screen()?.render(now);
            ticker.cancel();
        }
        self.persist_durable()
    }

    /// The screen is visible again: resume refreshing if running
    pub fn enter_foreground(&self) -> Result<DisplayState, String> {
        info!("Timer screen entered the foreground");
        let mut ticker = self.lock_ticker()?;
        ticker.foreground = true;
        let running = self.lock_screen()?.stopwatch.is_running();

        if running {
            self.arm_ticker(&mut ticker);
        }
        self.display()
    }

    /// Write the durable subset of the screen to the durable store
    pub fn persist_durable(&self) -> Result<(), String> {
        let snapshot = self.lock_screen()?.capture();

        let mut store = self.durable.lock()
            .map_err(|e| format!("Failed to lock durable store: {}", e))?;
        snapshot.write(Tier::Durable, &mut StringEntries(&mut **store));
        store.flush()
            .map_err(|e| format!("Failed to persist durable state: {:#}", e))
    }

    /// Whether a display ticker is currently armed
    pub fn is_ticking(&self) -> bool {
        self.ticker.lock()
            .map(|ticker| ticker.handle.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// Whether the screen is currently visible
    pub fn is_foreground(&self) -> bool {
        self.ticker.lock()
            .map(|ticker| ticker.foreground)
            .unwrap_or(false)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn build_screen(&self, ticker: &mut TickerSlot, saved: Option<&Bundle>) -> Result<DisplayState, String> {
        let durable = {
            let mut store = self.durable.lock()
                .map_err(|e| format!("Failed to lock durable store: {}", e))?;
            ScreenSnapshot::read(Tier::Durable, &StringEntries(&mut **store))
        };

        let snapshot = match saved {
            Some(bundle) => {
                debug!("Restoring screen from saved instance state ({} entries)", bundle.len());
                durable.overlay(ScreenSnapshot::read(Tier::Transient, bundle))
            }
            None => durable,
        };

        let now = self.clock.now_millis();
        let mut screen = self.lock_screen()?;
        *screen = ScreenState::from_snapshot(snapshot, now);
        let running = screen.stopwatch.is_running();
        let view = screen.render(now);
        drop(screen);

        info!(
            "Timer screen created: phase={:?}, elapsed={}",
            view.phase, view.elapsed
        );

        if running && ticker.foreground {
            self.arm_ticker(ticker);
        } else {
            self.publish(view.clone());
        }
        Ok(view)
    }

    // At most one ticker is armed; arming replaces any previous one
    fn arm_ticker(&self, slot: &mut TickerSlot) {
        let screen = Arc::clone(&self.screen);
        let clock = Arc::clone(&self.clock);
        let display_tx = Arc::clone(&self.display_tx);

        let handle = ticker::arm(self.tick_interval, move || {
            let now = clock.now_millis();
            let view = match screen.lock() {
                Ok(mut screen) if screen.stopwatch.is_running() => screen.render(now),
                Ok(_) => return,
                Err(e) => {
                    warn!("Tick skipped, failed to lock screen state: {}", e);
                    return;
                }
            };
            if let Err(e) = display_tx.send(view) {
                warn!("Failed to publish display update: {}", e);
            }
        });

        if let Some(previous) = slot.handle.replace(handle) {
            debug!("Replacing armed ticker");
            previous.cancel();
        }
    }

    fn lock_ticker(&self) -> Result<MutexGuard<'_, TickerSlot>, String> {
        self.ticker.lock()
            .map_err(|e| format!("Failed to lock ticker: {}", e))
    }

    fn lock_screen(&self) -> Result<MutexGuard<'_, ScreenState>, String> {
        self.screen.lock()
            .map_err(|e| format!("Failed to lock screen state: {}", e))
    }

    fn publish(&self, view: DisplayState) {
        if let Err(e) = self.display_tx.send(view) {
            warn!("Failed to publish display update: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        persistence::{FileStore, MemoryStore},
        state::{ManualClock, Phase},
    };

    fn controller(clock: &Arc<ManualClock>, durable: Box<dyn KeyValueStore>) -> AppState {
        let clock: Arc<dyn Clock> = Arc::clone(clock) as Arc<dyn Clock>;
        AppState::new(0, "127.0.0.1".to_string(), Duration::from_millis(500), clock, durable)
    }

    #[tokio::test]
    async fn first_launch_is_empty() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));

        let display = state.display().unwrap();
        assert_eq!(display.elapsed, "00:00:00");
        assert_eq!(display.phase, Phase::Idle);
        assert_eq!(display.last_workout_summary, "");
        assert!(!display.summary_visible);
        assert_eq!(display.workout_input, "");
    }

    #[tokio::test]
    async fn pause_resume_stop_example() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        state.set_workout_input("burpees").unwrap();

        state.start().unwrap();
        assert!(state.is_ticking());

        clock.advance(90_000);
        let paused = state.pause().unwrap();
        assert_eq!(paused.elapsed, "00:01:30");
        assert!(!state.is_ticking());

        clock.advance(600_000);
        assert_eq!(state.display().unwrap().elapsed, "00:01:30");

        state.start().unwrap();
        clock.advance(15_000);
        let stopped = state.stop().unwrap();

        assert_eq!(stopped.phase, Phase::Idle);
        assert_eq!(stopped.elapsed, "00:00:00");
        assert_eq!(stopped.last_workout_summary, "You spent 01:45 on burpees last time.");
        assert!(stopped.summary_visible);
        assert_eq!(stopped.pressed_button, PressedButton::Stop);
        assert!(!state.is_ticking());
    }

    #[tokio::test]
    async fn pause_while_idle_changes_nothing() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));

        let before = state.screen.lock().unwrap().stopwatch.clone();
        state.pause().unwrap();
        assert_eq!(state.screen.lock().unwrap().stopwatch, before);
        assert!(!state.is_ticking());
    }

    #[tokio::test]
    async fn stop_while_idle_keeps_previous_summary() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(
            &clock,
            Box::new(MemoryStore::with_entries([
                ("workout_type", "yoga"),
                ("last_workout_info", "You spent 10:00 on yoga last time."),
            ])),
        );

        let display = state.stop().unwrap();
        assert_eq!(display.last_workout_summary, "You spent 10:00 on yoga last time.");
    }

    #[tokio::test]
    async fn recreate_while_paused_keeps_frozen_value() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        state.set_workout_input("plank").unwrap();
        state.start().unwrap();
        clock.advance(42_000);
        state.pause().unwrap();

        clock.advance(5_000);
        let display = state.recreate().unwrap();
        assert_eq!(display.phase, Phase::Paused);
        assert_eq!(display.elapsed, "00:00:42");
        assert_eq!(display.workout_input, "plank");
        assert_eq!(display.pressed_button, PressedButton::Pause);
        assert!(!state.is_ticking());
    }

    #[tokio::test]
    async fn recreate_while_running_keeps_counting() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        state.start().unwrap();
        clock.advance(20_000);
        // render the counter the way a tick would
        state.update_screen("tick", |_, _| ()).unwrap();

        let restored = state.recreate().unwrap();
        assert_eq!(restored.phase, Phase::Running);
        assert_eq!(restored.elapsed_millis, 20_000);
        assert!(state.is_ticking());

        clock.advance(3_000);
        assert_eq!(state.display().unwrap().elapsed_millis, 23_000);
    }

    #[tokio::test]
    async fn transient_state_wins_over_durable() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(
            &clock,
            Box::new(MemoryStore::with_entries([("workout_type", "durable")])),
        );
        assert_eq!(state.display().unwrap().workout_input, "durable");

        let mut bundle = Bundle::new();
        bundle.put_string("state_workout_type", "transient");
        bundle.put_string("state_workout_input", "typing");
        let display = state.create_screen(Some(&bundle)).unwrap();

        assert_eq!(state.screen.lock().unwrap().label.workout_type, "transient");
        assert_eq!(display.workout_input, "typing");
    }

    #[tokio::test]
    async fn restart_keeps_labels_but_not_running_timer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let clock = Arc::new(ManualClock::new(0));

        {
            let state = controller(&clock, Box::new(FileStore::open(&path).unwrap()));
            state.set_workout_input("squats").unwrap();
            state.start().unwrap();
            clock.advance(30_000);
            state.stop().unwrap();

            // a new session is left running at teardown
            state.start().unwrap();
            clock.advance(10_000);
            state.leave_foreground().unwrap();
            assert!(!state.is_ticking());
        }

        let state = controller(&clock, Box::new(FileStore::open(&path).unwrap()));
        let display = state.display().unwrap();
        assert_eq!(display.phase, Phase::Idle);
        assert_eq!(display.elapsed_millis, 0);
        assert_eq!(display.workout_input, "squats");
        assert_eq!(display.last_workout_summary, "You spent 00:30 on squats last time.");
        assert!(display.summary_visible);
    }

    #[tokio::test]
    async fn foreground_rearms_only_when_running() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));

        state.enter_foreground().unwrap();
        assert!(!state.is_ticking());

        state.start().unwrap();
        state.leave_foreground().unwrap();
        assert!(!state.is_ticking());

        clock.advance(8_000);
        let display = state.enter_foreground().unwrap();
        assert!(state.is_ticking());
        assert_eq!(display.elapsed_millis, 8_000);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_publishes_while_running() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        let mut display_rx = state.display_tx.subscribe();

        state.start().unwrap();
        clock.advance(2_000);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(display_rx.borrow_and_update().elapsed, "00:00:02");

        state.pause().unwrap();
        clock.advance(10_000);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(display_rx.borrow_and_update().elapsed, "00:00:02");
    }

    #[tokio::test]
    async fn recreate_without_tick_keeps_running_time() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        state.start().unwrap();
        clock.advance(5_000);

        let restored = state.recreate().unwrap();
        assert_eq!(restored.elapsed_millis, 5_000);

        clock.advance(1_000);
        assert_eq!(state.display().unwrap().elapsed_millis, 6_000);
    }

    #[tokio::test]
    async fn recreate_in_background_keeps_time_and_stays_quiet() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        state.start().unwrap();
        clock.advance(20_000);
        state.leave_foreground().unwrap();
        assert!(!state.is_foreground());

        clock.advance(60_000);
        let before = state.display().unwrap().elapsed_millis;
        let restored = state.recreate().unwrap();
        assert_eq!(before, 80_000);
        assert_eq!(restored.phase, Phase::Running);
        assert_eq!(restored.elapsed_millis, 80_000);
        assert!(!state.is_ticking());

        clock.advance(10_000);
        let view = state.enter_foreground().unwrap();
        assert!(state.is_ticking());
        assert_eq!(view.elapsed_millis, 90_000);
    }

    #[tokio::test]
    async fn start_in_background_does_not_tick() {
        let clock = Arc::new(ManualClock::new(0));
        let state = controller(&clock, Box::new(MemoryStore::new()));
        state.leave_foreground().unwrap();

        state.start().unwrap();
        assert!(!state.is_ticking());
        assert!(state.enter_foreground().is_ok());
        assert!(state.is_ticking());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_start_and_pause_leave_ticker_consistent() {
        let clock = Arc::new(ManualClock::new(0));
        let state = Arc::new(controller(&clock, Box::new(MemoryStore::new())));

        for _ in 0..500 {
            let starter = Arc::clone(&state);
            let pauser = Arc::clone(&state);
            let start = tokio::spawn(async move { starter.start().map(|_| ()) });
            let pause = tokio::spawn(async move { pauser.pause().map(|_| ()) });
            start.await.unwrap().unwrap();
            pause.await.unwrap().unwrap();

            let running = state.screen.lock().unwrap().stopwatch.is_running();
            assert_eq!(state.is_ticking(), running);
            state.stop().unwrap();
            assert!(!state.is_ticking());
        }
    }
}
