//! Shared test infrastructure for led-behavior integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::Cell;
use led_behavior::{ChainTimer, PwmOutput, TimeDuration, TimeInstant, TimeSource};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }

    fn saturating_sub(self, other: Self) -> Self {
        TestDuration(self.0.saturating_sub(other.0))
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }

    pub fn now_millis(&self) -> u64 {
        self.current_time.get().0
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock One-Shot Timer
// ============================================================================

/// Observable state behind a mock timer. Chains own their timer by value, so
/// tests hand them a `MockTimer` holding a reference to this state.
pub struct TimerState {
    armed: Cell<Option<u64>>,
    arm_count: Cell<usize>,
    cancel_count: Cell<usize>,
}

impl TimerState {
    pub fn new() -> Self {
        Self {
            armed: Cell::new(None),
            arm_count: Cell::new(0),
            cancel_count: Cell::new(0),
        }
    }

    /// The currently pending delay, if armed
    pub fn armed(&self) -> Option<u64> {
        self.armed.get()
    }

    /// Consume the pending delay, simulating the wakeup firing
    pub fn take_armed(&self) -> Option<u64> {
        self.armed.take()
    }

    pub fn arm_count(&self) -> usize {
        self.arm_count.get()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.get()
    }
}

pub struct MockTimer<'a>(pub &'a TimerState);

impl<'a> ChainTimer<TestDuration> for MockTimer<'a> {
    fn arm(&mut self, delay: TestDuration) {
        self.0.armed.set(Some(delay.0));
        self.0.arm_count.set(self.0.arm_count.get() + 1);
    }

    fn cancel(&mut self) {
        self.0.armed.set(None);
        self.0.cancel_count.set(self.0.cancel_count.get() + 1);
    }
}

// ============================================================================
// Mock PWM Channel
// ============================================================================

/// Observable state behind a mock PWM channel
pub struct PwmState {
    last_duty: Cell<u16>,
    write_count: Cell<usize>,
    range: u16,
}

impl PwmState {
    pub fn new(range: u16) -> Self {
        Self {
            last_duty: Cell::new(0),
            write_count: Cell::new(0),
            range,
        }
    }

    pub fn last_duty(&self) -> u16 {
        self.last_duty.get()
    }

    pub fn write_count(&self) -> usize {
        self.write_count.get()
    }
}

pub struct MockPwm<'a> {
    pub state: &'a PwmState,
    pub pin: u8,
}

impl<'a> PwmOutput for MockPwm<'a> {
    fn write(&mut self, duty: u16) {
        self.state.last_duty.set(duty);
        self.state.write_count.set(self.state.write_count.get() + 1);
    }

    fn range(&self) -> u16 {
        self.state.range
    }

    fn pin(&self) -> u8 {
        self.pin
    }
}
