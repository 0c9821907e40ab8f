use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use serde::Serialize;

use crate::clock::{Clock, SystemClock};

/// Milliseconds per second, used for the duration computation.
const MILLIS_PER_SEC: i64 = 1_000;

/// Value of a timestamp that has not been set.
const UNSET_TIME: i64 = 0;

/// Coarse lifecycle status of a snapshot, derived from the individual flags of a
/// [`SnapshotStateMachine`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// No snapshot was ever started.
    Idle,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Lifecycle of the snapshot phase: `Idle -> Running -> Completed | Aborted`, restartable by
/// starting again.
///
/// Every field is an independent atomic. A transition is a sequence of single-field stores, not a
/// transaction, so a concurrent reader may observe a half-applied transition, e.g. `running` already
/// cleared while `stop_time` is still unset. Readers must tolerate this.
#[derive(Debug)]
pub struct SnapshotStateMachine<C = SystemClock> {
    clock: C,
    running: AtomicBool,
    completed: AtomicBool,
    aborted: AtomicBool,
    start_time: AtomicI64,
    stop_time: AtomicI64,
}

impl SnapshotStateMachine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SnapshotStateMachine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SnapshotStateMachine<C>
where
    C: Clock,
{
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            running: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            start_time: AtomicI64::new(UNSET_TIME),
            stop_time: AtomicI64::new(UNSET_TIME),
        }
    }

    /// Enters `Running`, clearing any terminal outcome of a previous run.
    ///
    /// Calling it while already running re-arms the run with a new start time.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.completed.store(false, Ordering::SeqCst);
        self.aborted.store(false, Ordering::SeqCst);
        self.start_time
            .store(self.clock.current_time_millis(), Ordering::SeqCst);
        self.stop_time.store(UNSET_TIME, Ordering::SeqCst);
    }

    pub fn complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
        self.aborted.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.stop_time
            .store(self.clock.current_time_millis(), Ordering::SeqCst);
    }

    pub fn abort(&self) {
        self.completed.store(false, Ordering::SeqCst);
        self.aborted.store(true, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.stop_time
            .store(self.clock.current_time_millis(), Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Start time in ms since the epoch, `0` if no snapshot was started.
    pub fn start_time_millis(&self) -> i64 {
        self.start_time.load(Ordering::SeqCst)
    }

    /// Stop time in ms since the epoch, `0` while running or before the first run ended.
    pub fn stop_time_millis(&self) -> i64 {
        self.stop_time.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SnapshotStatus {
        if self.is_running() {
            SnapshotStatus::Running
        } else if self.is_completed() {
            SnapshotStatus::Completed
        } else if self.is_aborted() {
            SnapshotStatus::Aborted
        } else {
            SnapshotStatus::Idle
        }
    }

    /// Whole seconds elapsed between the start and the stop of the snapshot, or between the start
    /// and now if it is still running. Returns `0` if no snapshot was started.
    ///
    /// The division truncates, and a clock that went backwards yields `0`.
    pub fn duration_secs(&self) -> u64 {
        let start_millis = self.start_time_millis();
        if start_millis <= UNSET_TIME {
            return 0;
        }

        let mut stop_millis = self.stop_time_millis();
        if stop_millis == UNSET_TIME {
            stop_millis = self.clock.current_time_millis();
        }

        let elapsed_secs = (stop_millis - start_millis) / MILLIS_PER_SEC;
        u64::try_from(elapsed_secs).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::clock::MockClock;

    fn state_machine(now_millis: i64) -> (MockClock, SnapshotStateMachine<MockClock>) {
        let clock = MockClock::new(now_millis);
        (clock.clone(), SnapshotStateMachine::with_clock(clock))
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (_, state) = state_machine(10_000);

        assert_eq!(state.status(), SnapshotStatus::Idle);
        assert!(!state.is_running());
        assert!(!state.is_completed());
        assert!(!state.is_aborted());
        assert_eq!(state.duration_secs(), 0);
    }

    #[test]
    fn test_duration_is_live_while_running() {
        let (clock, state) = state_machine(10_000);
        state.start();
        assert_eq!(state.duration_secs(), 0);

        clock.advance_millis(1_999);
        assert_eq!(state.duration_secs(), 1);

        clock.advance_millis(1);
        assert_eq!(state.duration_secs(), 2);
        assert_eq!(state.stop_time_millis(), 0);
    }

    #[test]
    fn test_duration_freezes_after_completion() {
        let (clock, state) = state_machine(10_000);
        state.start();
        clock.advance_millis(3_500);
        state.complete();

        clock.advance_millis(60_000);
        assert_eq!(state.duration_secs(), 3);
        assert_eq!(state.status(), SnapshotStatus::Completed);
        assert!(state.stop_time_millis() >= state.start_time_millis());
    }

    #[test]
    fn test_abort_sets_complementary_flags() {
        let (clock, state) = state_machine(10_000);
        state.start();
        clock.advance_millis(500);
        state.abort();

        assert!(state.is_aborted());
        assert!(!state.is_completed());
        assert!(!state.is_running());
        assert_eq!(state.status(), SnapshotStatus::Aborted);
        assert_eq!(state.stop_time_millis(), 10_500);
    }

    #[test]
    fn test_restart_clears_terminal_outcome() {
        let (clock, state) = state_machine(10_000);
        state.start();
        state.abort();

        clock.advance_millis(5_000);
        state.start();

        assert_eq!(state.status(), SnapshotStatus::Running);
        assert!(!state.is_aborted());
        assert_eq!(state.start_time_millis(), 15_000);
        assert_eq!(state.stop_time_millis(), 0);
    }

    #[test]
    fn test_start_while_running_rearms_the_run() {
        let (clock, state) = state_machine(10_000);
        state.start();
        clock.advance_millis(4_000);
        state.start();

        assert!(state.is_running());
        assert_eq!(state.start_time_millis(), 14_000);
        assert_eq!(state.duration_secs(), 0);
    }

    #[test]
    fn test_backwards_clock_reports_zero() {
        let (clock, state) = state_machine(10_000);
        state.start();
        clock.set(5_000);

        assert_eq!(state.duration_secs(), 0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SnapshotStatus::Idle.to_string(), "idle");
        assert_eq!(SnapshotStatus::Aborted.to_string(), "aborted");
    }
}
