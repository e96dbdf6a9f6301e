//! # Gamepad Session Module
//!
//! One observation loop per controller slot.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──(task scheduled)──> Polling ──(stop requested)──> Stopped
//! ```
//!
//! Each loop iteration:
//! 1. Queries the source for the slot's state
//! 2. On failure, keeps the last known state and goes to sleep
//! 3. On a new packet number, rebuilds the normalized state with the current
//!    [`FilterConfig`]
//! 4. Drains the keystroke queue (when enabled) and dispatches each key
//!    transition, whether or not the packet changed
//! 5. Sends one state-changed notification if step 3 applied a packet
//! 6. Sleeps for the poll interval
//!
//! A panicking handler is logged and skipped; it does not end the loop.
//!
//! The loop is the only writer of the normalized state. Readers go through
//! [`Gamepad`], which can be cloned freely and handed to other tasks.

use std::fmt;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::normalizer::FilterConfig;
use super::state::{
    BatteryInfo, BatteryLevel, BatteryType, DeviceCapabilities, GamepadSnapshot, GamepadState,
    KeyEvent, VibrationMotorSpeed,
};
use super::subscription::{SubscriptionId, Subscribers};
use crate::config::Config;
use crate::error::{PadwatchError, Result};
use crate::source::{RawState, SourceError, StateSource, KEYSTROKE_REPEAT};

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Upper bound on keystrokes drained in one poll.
pub const MAX_KEYSTROKES_PER_POLL: usize = 64;

/// State-changed handler. Receives the session that changed; read fields from it.
pub type StateChangedHandler = dyn Fn(&Gamepad) + Send + Sync;

/// Key transition handler.
pub type KeyEventHandler = dyn Fn(&Gamepad, &KeyEvent) + Send + Sync;

/// Runtime options for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    /// Drain the keystroke queue and dispatch [`KeyEvent`]s
    pub keystrokes: bool,
    /// Initial deadzones and thresholds
    pub filter: FilterConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            keystrokes: false,
            filter: FilterConfig::default(),
        }
    }
}

impl SessionOptions {
    /// Session options from the `[controller]` and `[polling]` sections.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let controller = &config.controller;
        Self {
            poll_interval: Duration::from_millis(config.polling.interval_ms),
            keystrokes: config.polling.keystrokes,
            filter: FilterConfig::new(
                controller.left_thumb_deadzone,
                controller.right_thumb_deadzone,
                controller.left_trigger_threshold,
                controller.right_trigger_threshold,
            ),
        }
    }
}

/// Lifecycle of a session's observation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, loop not yet running
    Idle,
    /// Loop active
    Polling,
    /// Loop exited; terminal
    Stopped,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Polling,
            _ => SessionState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SessionState::Idle => 0,
            SessionState::Polling => 1,
            SessionState::Stopped => 2,
        }
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PollOutcome {
    /// New packet applied and notified
    Updated,
    /// Same packet as last time
    Unchanged,
    /// Query failed; state kept
    Failed(SourceError),
}

#[derive(Debug, Default)]
struct Observed {
    sequence: u32,
    connected: bool,
    state: GamepadState,
}

struct Shared {
    slot: u8,
    source: Arc<dyn StateSource>,
    observed: RwLock<Observed>,
    filter: RwLock<FilterConfig>,
    running: AtomicBool,
    lifecycle: AtomicU8,
    keystrokes: bool,
    poll_interval: Duration,
    state_changed: Subscribers<StateChangedHandler>,
    key_events: Subscribers<KeyEventHandler>,
}

/// Shared handle to one controller slot.
///
/// Cloning is cheap; every clone observes the same session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use padwatch::controller::{enumerate, SessionOptions};
/// use padwatch::source::evdev::EvdevSource;
///
/// # async fn run() -> padwatch::error::Result<()> {
/// let source = Arc::new(EvdevSource::open()?);
/// let sessions = enumerate(source, &SessionOptions::default())?;
/// for session in &sessions {
///     session.subscribe(|pad| println!("slot {}: {:?}", pad.slot(), pad.state().pressed_buttons()));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Gamepad {
    shared: Arc<Shared>,
}

impl fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gamepad")
            .field("slot", &self.shared.slot)
            .field("connected", &self.is_connected())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl Gamepad {
    fn new(slot: u8, source: Arc<dyn StateSource>, options: &SessionOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot,
                source,
                observed: RwLock::new(Observed::default()),
                filter: RwLock::new(options.filter),
                running: AtomicBool::new(true),
                lifecycle: AtomicU8::new(SessionState::Idle.as_u8()),
                keystrokes: options.keystrokes,
                poll_interval: options.poll_interval,
                state_changed: Subscribers::new(),
                key_events: Subscribers::new(),
            }),
        }
    }

    fn observed(&self) -> RwLockReadGuard<'_, Observed> {
        self.shared
            .observed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn observed_mut(&self) -> RwLockWriteGuard<'_, Observed> {
        self.shared
            .observed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn filter_mut(&self) -> RwLockWriteGuard<'_, FilterConfig> {
        self.shared
            .filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn slot(&self) -> u8 {
        self.shared.slot
    }

    /// Current normalized state.
    #[must_use]
    pub fn state(&self) -> GamepadState {
        self.observed().state
    }

    /// Last packet number applied.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.observed().sequence
    }

    /// Whether the latest poll reached the device.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.observed().connected
    }

    /// Copies every field in one step.
    ///
    /// Unlike separate calls to [`Gamepad::state`] and [`Gamepad::sequence`],
    /// the result can't straddle an update.
    #[must_use]
    pub fn snapshot(&self) -> GamepadSnapshot {
        let observed = self.observed();
        GamepadSnapshot {
            slot: self.shared.slot,
            sequence: observed.sequence,
            connected: observed.connected,
            state: observed.state,
        }
    }

    // ==================== Filter Configuration ====================

    #[must_use]
    pub fn filter(&self) -> FilterConfig {
        *self
            .shared
            .filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces all deadzones and thresholds. Applies from the next update.
    pub fn set_filter(&self, filter: FilterConfig) {
        *self.filter_mut() = filter;
    }

    pub fn set_left_thumb_deadzone(&self, value: f32) {
        self.filter_mut().set_left_thumb_deadzone(value);
    }

    pub fn set_right_thumb_deadzone(&self, value: f32) {
        self.filter_mut().set_right_thumb_deadzone(value);
    }

    pub fn set_left_trigger_threshold(&self, value: f32) {
        self.filter_mut().set_left_trigger_threshold(value);
    }

    pub fn set_right_trigger_threshold(&self, value: f32) {
        self.filter_mut().set_right_trigger_threshold(value);
    }

    // ==================== Subscriptions ====================

    /// Calls `handler` after every state update.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Gamepad) + Send + Sync + 'static,
    {
        self.shared.state_changed.subscribe(Arc::new(handler))
    }

    /// Detaches a state-changed handler. Notifications already being
    /// dispatched still reach it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.state_changed.unsubscribe(id)
    }

    /// Calls `handler` for every key transition.
    ///
    /// Only fires for sessions started with [`SessionOptions::keystrokes`].
    pub fn subscribe_keys<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Gamepad, &KeyEvent) + Send + Sync + 'static,
    {
        self.shared.key_events.subscribe(Arc::new(handler))
    }

    pub fn unsubscribe_keys(&self, id: SubscriptionId) -> bool {
        self.shared.key_events.unsubscribe(id)
    }

    // ==================== Device Queries ====================

    /// Sets both motor speeds. Failures are logged, not returned.
    pub fn set_vibration(&self, speed: VibrationMotorSpeed) {
        if let Err(e) = self.shared.source.set_vibration(self.shared.slot, speed.to_raw()) {
            warn!(slot = self.shared.slot, "Failed to set vibration: {}", e);
        }
    }

    /// Battery type and level.
    ///
    /// # Errors
    ///
    /// Returns [`PadwatchError::Source`] if the query fails, or an unknown-code
    /// error if the device reports a value outside the known tables.
    pub fn battery(&self) -> Result<BatteryInfo> {
        let raw = self.shared.source.query_battery(self.shared.slot)?;
        BatteryInfo::try_from(raw)
    }

    /// Battery charge from 0.0 (empty) to 1.0 (full).
    ///
    /// # Errors
    ///
    /// Same as [`Gamepad::battery`], restricted to the level code.
    pub fn battery_charge_level(&self) -> Result<f32> {
        let raw = self.shared.source.query_battery(self.shared.slot)?;
        Ok(BatteryLevel::try_from(raw.battery_level)?.charge())
    }

    /// # Errors
    ///
    /// Same as [`Gamepad::battery`], restricted to the type code.
    pub fn battery_type(&self) -> Result<BatteryType> {
        let raw = self.shared.source.query_battery(self.shared.slot)?;
        BatteryType::try_from(raw.battery_type)
    }

    /// # Errors
    ///
    /// Returns [`PadwatchError::Source`] if the query fails or
    /// [`PadwatchError::UnknownDeviceSubtype`] for an unknown subtype code.
    pub fn capabilities(&self) -> Result<DeviceCapabilities> {
        let raw = self.shared.source.query_capabilities(self.shared.slot)?;
        DeviceCapabilities::try_from(raw)
    }

    // ==================== Observation Loop ====================

    /// Records the connection flag. Must be called with the `observed` write lock held.
    fn set_connected(&self, observed: &mut Observed, connected: bool) {
        if observed.connected == connected {
            return;
        }
        observed.connected = connected;
        if connected {
            info!(slot = self.shared.slot, "Gamepad connected");
        } else {
            info!(slot = self.shared.slot, "Gamepad disconnected");
        }
    }

    /// Runs one loop iteration without the sleep.
    pub(crate) fn poll_once(&self) -> PollOutcome {
        let slot = self.shared.slot;

        let raw = match self.shared.source.query_state(slot) {
            Ok(raw) => raw,
            Err(SourceError::NotConnected) => {
                let mut observed = self.observed_mut();
                self.set_connected(&mut observed, false);
                return PollOutcome::Failed(SourceError::NotConnected);
            }
            Err(e) => {
                debug!(slot, "State query failed: {}", e);
                return PollOutcome::Failed(e);
            }
        };
        let updated = self.apply(&raw);

        if self.shared.keystrokes {
            self.drain_keystrokes();
        }

        if !updated {
            return PollOutcome::Unchanged;
        }

        for handler in self.shared.state_changed.snapshot() {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(self))).is_err() {
                warn!(slot, "State-changed handler panicked");
            }
        }
        PollOutcome::Updated
    }

    /// Applies `raw` if its packet differs from the last one. Returns whether it did.
    ///
    /// This is intentionally looser than "strictly greater": a lower packet
    /// number means the device was reset or the counter wrapped, and is
    /// applied like a new one. Equal packets are still skipped, so two
    /// readings with `s1 <= s2` notify exactly when `s2 > s1`.
    ///
    /// Marks the slot connected under the same lock, so a snapshot never pairs
    /// a fresh connection flag with a stale packet.
    fn apply(&self, raw: &RawState) -> bool {
        let filter = self.filter();
        let mut observed = self.observed_mut();
        self.set_connected(&mut observed, true);

        if raw.packet == observed.sequence {
            return false;
        }
        if raw.packet < observed.sequence {
            debug!(
                slot = self.shared.slot,
                previous = observed.sequence,
                packet = raw.packet,
                "Packet number went backwards, treating as device reset"
            );
        }

        observed.sequence = raw.packet;
        observed.state = GamepadState::from_raw(&raw.gamepad, &filter);
        trace!(slot = self.shared.slot, packet = raw.packet, "State updated");
        true
    }

    fn drain_keystrokes(&self) {
        let slot = self.shared.slot;

        for _ in 0..MAX_KEYSTROKES_PER_POLL {
            let keystroke = match self.shared.source.query_keystroke(slot) {
                Ok(Some(keystroke)) => keystroke,
                Ok(None) => return,
                Err(e) => {
                    debug!(slot, "Keystroke query failed: {}", e);
                    return;
                }
            };

            if keystroke.flags & KEYSTROKE_REPEAT != 0 {
                trace!(slot, "Ignoring auto-repeat of {:#06x}", keystroke.virtual_key);
                continue;
            }

            let Some(event) = KeyEvent::from_raw(&keystroke) else {
                debug!(
                    slot,
                    "Skipping keystroke {:#06x} (flags {:#06x})",
                    keystroke.virtual_key,
                    keystroke.flags
                );
                continue;
            };

            trace!(slot, "Key event: {}", event);
            for handler in self.shared.key_events.snapshot() {
                if panic::catch_unwind(AssertUnwindSafe(|| handler(self, &event))).is_err() {
                    warn!(slot, "Key event handler panicked");
                }
            }
        }
    }

    async fn observe(self) {
        let slot = self.shared.slot;
        self.shared
            .lifecycle
            .store(SessionState::Polling.as_u8(), Ordering::Release);
        info!(slot, "Observation loop started");

        // Stores `Stopped` however the loop ends, unwinding included
        let _exit = LoopExit(&self.shared);

        while self.shared.running.load(Ordering::Acquire) {
            self.poll_once();
            tokio::time::sleep(self.shared.poll_interval).await;
        }
    }
}

struct LoopExit<'a>(&'a Shared);

impl Drop for LoopExit<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        self.0
            .lifecycle
            .store(SessionState::Stopped.as_u8(), Ordering::Release);
        if std::thread::panicking() {
            warn!(slot = self.0.slot, "Observation loop aborted by a panic");
        } else {
            info!(slot = self.0.slot, "Observation loop stopped");
        }
    }
}

/// Owning handle for a running session.
///
/// Dereferences to [`Gamepad`]. Dropping it asks the loop to stop.
pub struct GamepadSession {
    gamepad: Gamepad,
    task: Option<JoinHandle<()>>,
}

impl GamepadSession {
    /// Starts observing `slot` on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PadwatchError::NoRuntime`] when called outside a runtime.
    pub fn start(slot: u8, source: Arc<dyn StateSource>, options: SessionOptions) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| PadwatchError::NoRuntime)?;
        let gamepad = Gamepad::new(slot, source, &options);
        let task = handle.spawn(gamepad.clone().observe());

        debug!(
            slot,
            interval_ms = options.poll_interval.as_millis() as u64,
            keystrokes = options.keystrokes,
            "Session spawned"
        );

        Ok(Self {
            gamepad,
            task: Some(task),
        })
    }

    #[must_use]
    pub fn gamepad(&self) -> &Gamepad {
        &self.gamepad
    }

    #[must_use]
    pub fn lifecycle(&self) -> SessionState {
        SessionState::from_u8(self.gamepad.shared.lifecycle.load(Ordering::Acquire))
    }

    /// Asks the loop to exit before its next iteration.
    ///
    /// Returns immediately; a notification in flight may still be delivered.
    pub fn stop(&self) {
        if self.gamepad.shared.running.swap(false, Ordering::AcqRel) {
            debug!(slot = self.gamepad.slot(), "Stop requested");
        }
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(slot = self.gamepad.slot(), "Observation task failed: {}", e);
            }
        }
    }
}

impl Deref for GamepadSession {
    type Target = Gamepad;

    fn deref(&self) -> &Gamepad {
        &self.gamepad
    }
}

impl Drop for GamepadSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for GamepadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GamepadSession")
            .field("gamepad", &self.gamepad)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
