//! Cyclic relative-time event scheduling.
//!
//! An [`EventChain`] is an ordered sequence of [`TimedEvent`]s fired
//! round-robin by a single one-shot timer. Each event's delay is relative to
//! the completion of the event before it, so retiming one event never
//! perturbs the timing of the others. The chain owns its timer but not its
//! event handlers: events carry caller-defined action tokens, and every
//! operation that can fire events takes an `execute` dispatcher that maps a
//! token to its effect. This keeps the chain a plain data structure with no
//! stored closures, which matters on allocation-free targets.
//!
//! The platform glue is expected to call [`EventChain::tick`] whenever the
//! armed [`ChainTimer`] fires; the chain then re-arms the timer itself.

use crate::time::{ChainTimer, TimeDuration, TimeInstant, TimeSource};
use heapless::Vec;

/// Errors from event chain operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainError {
    /// The chain's fixed event capacity is exhausted.
    CapacityExceeded,
}

impl core::fmt::Display for ChainError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChainError::CapacityExceeded => write!(f, "event chain capacity exceeded"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChainError {}

/// A single scheduled step: wait `delay` after the previous event, then act.
///
/// The action is an opaque token interpreted by the dispatcher passed to the
/// chain; a delay of zero means "run immediately after the previous event".
/// An event's identity (action, label, position) is fixed once added to a
/// chain, but its delay may be changed at any time.
#[derive(Debug, Clone, Copy)]
pub struct TimedEvent<D: TimeDuration, A> {
    delay: D,
    action: A,
    label: Option<&'static str>,
}

impl<D: TimeDuration, A> TimedEvent<D, A> {
    /// Creates an event with the given relative delay and action token.
    pub fn new(delay: D, action: A) -> Self {
        Self {
            delay,
            action,
            label: None,
        }
    }

    /// Attaches a label for later lookup via
    /// [`EventChain::position_of`].
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Returns the delay relative to the preceding event.
    pub fn delay(&self) -> D {
        self.delay
    }

    /// Returns the action token.
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Returns the label, if one was attached.
    pub fn label(&self) -> Option<&'static str> {
        self.label
    }

    fn set_delay(&mut self, delay: D) {
        self.delay = delay;
    }
}

/// An ordered, cyclic sequence of timed events driven by one one-shot timer.
///
/// Insertion order is execution order; after the last event the chain wraps
/// to the first and keeps going until stopped. Exactly one driver exists per
/// chain (the armed timer), so there is no contention within a chain.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `A` - Action token type carried by events
/// * `T` - One-shot timer implementation
/// * `S` - Time source implementation
/// * `N` - Maximum number of events
pub struct EventChain<'t, I: TimeInstant, A, T: ChainTimer<I::Duration>, S: TimeSource<I>, const N: usize>
{
    events: Vec<TimedEvent<I::Duration, A>, N>,
    cursor: usize,
    running: bool,
    timer: T,
    time_source: &'t S,
}

impl<'t, I: TimeInstant, A, T: ChainTimer<I::Duration>, S: TimeSource<I>, const N: usize>
    EventChain<'t, I, A, T, S, N>
{
    /// Creates an empty, stopped chain.
    pub fn new(timer: T, time_source: &'t S) -> Self {
        Self {
            events: Vec::new(),
            cursor: 0,
            running: false,
            timer,
            time_source,
        }
    }

    /// Creates a stopped chain pre-populated with the given events.
    ///
    /// # Panics
    /// Panics if `events` holds more than `N` entries.
    pub fn with_events(events: &[TimedEvent<I::Duration, A>], timer: T, time_source: &'t S) -> Self
    where
        A: Clone,
    {
        let mut chain = Self::new(timer, time_source);
        for event in events {
            if chain.events.push(event.clone()).is_err() {
                panic!("event chain capacity exceeded ({N} events max)");
            }
        }
        chain
    }

    /// Appends an event to the end of the chain and returns its index.
    ///
    /// A running chain is stopped, extended, reset to its first event and
    /// restarted, so the addition never corrupts in-flight timing (the current
    /// cycle is abandoned rather than spliced).
    pub fn add_event<F: FnMut(&A)>(
        &mut self,
        event: TimedEvent<I::Duration, A>,
        execute: F,
    ) -> Result<usize, ChainError> {
        if self.events.is_full() {
            return Err(ChainError::CapacityExceeded);
        }

        let was_running = self.running;
        self.stop();
        // Capacity checked above.
        let _ = self.events.push(event);
        self.cursor = 0;
        if was_running {
            self.start(execute);
        }
        Ok(self.events.len() - 1)
    }

    /// Changes the delay of the event at `index` without altering chain order.
    ///
    /// The new delay applies the next time the event comes up; an already
    /// armed timer deadline is left untouched.
    ///
    /// # Panics
    /// Panics if `index >= len()`. A bad index indicates a scheduling logic
    /// defect, so it fails fast instead of clamping.
    pub fn change_delay(&mut self, index: usize, delay: I::Duration) {
        assert!(
            index < self.events.len(),
            "event index {} out of range ({} events)",
            index,
            self.events.len()
        );
        self.events[index].set_delay(delay);
    }

    /// Starts the chain from its first event.
    ///
    /// The first event executes immediately (its own delay is not waited out),
    /// then the timer is armed for the next event. Calling `start` on a
    /// running chain is a no-op.
    ///
    /// # Panics
    /// Panics if the chain is empty.
    pub fn start<F: FnMut(&A)>(&mut self, execute: F) {
        if self.running {
            return;
        }
        assert!(!self.events.is_empty(), "cannot start an empty event chain");

        self.cursor = 0;
        self.running = true;
        self.tick(execute);
    }

    /// Re-enters the running state from the current cursor position.
    ///
    /// Pause convenience: `stop()` followed by `resume()` picks up with the
    /// event the chain was about to fire. No-op if already running.
    ///
    /// # Panics
    /// Panics if the chain is empty.
    pub fn resume<F: FnMut(&A)>(&mut self, execute: F) {
        if self.running {
            return;
        }
        assert!(!self.events.is_empty(), "cannot resume an empty event chain");

        self.running = true;
        self.tick(execute);
    }

    /// Stops the chain and cancels the pending timer.
    ///
    /// Safe to call repeatedly and from drop paths. After `stop` returns, a
    /// late `tick` is ignored, so no event fires once the chain is stopped.
    /// The cursor is preserved for [`resume`](Self::resume); `start` resets it.
    pub fn stop(&mut self) {
        if self.running {
            self.timer.cancel();
            self.running = false;
        }
    }

    /// Fires the current event and schedules the next one.
    ///
    /// Called by the platform when the armed timer elapses. Executes the
    /// event under the cursor, advances cyclically and arms the timer for the
    /// next event's delay minus the time the tick has spent executing
    /// (floored at zero). Events with a zero delay are executed synchronously
    /// in the same tick without re-arming the timer; their run time counts
    /// against the armed delay too.
    ///
    /// A no-op when the chain is stopped, which is what guarantees
    /// "no event after `stop()`" even if a wakeup was already in flight.
    ///
    /// # Panics
    /// Panics if a full lap of the chain executes synchronously, i.e. every
    /// event has a zero delay. Such a chain would spin forever and is a
    /// configuration error.
    pub fn tick<F: FnMut(&A)>(&mut self, mut execute: F) {
        if !self.running || self.events.is_empty() {
            return;
        }

        let began = self.time_source.now();
        let mut fired = 0;
        loop {
            execute(self.events[self.cursor].action());
            fired += 1;

            self.cursor = (self.cursor + 1) % self.events.len();
            let next_delay = self.events[self.cursor].delay();

            if next_delay.as_millis() == 0 {
                assert!(
                    fired < self.events.len(),
                    "event chain has no nonzero delays; refusing to spin synchronously"
                );
                continue;
            }

            let elapsed = self.time_source.now().duration_since(began);
            self.timer.arm(next_delay.saturating_sub(elapsed));
            break;
        }
    }

    /// Returns the number of events in the chain.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the chain holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns true between `start()`/`resume()` and `stop()`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the index of the next event to fire.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the delay of the event at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn delay_of(&self, index: usize) -> I::Duration {
        assert!(
            index < self.events.len(),
            "event index {} out of range ({} events)",
            index,
            self.events.len()
        );
        self.events[index].delay()
    }

    /// Finds the position of the first event carrying `label`.
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.events.iter().position(|e| e.label() == Some(label))
    }

    /// Sum of the delays of the first `index` events.
    ///
    /// # Panics
    /// Panics if `index > len()`.
    pub fn total_time_before(&self, index: usize) -> I::Duration {
        assert!(
            index <= self.events.len(),
            "event index {} out of range ({} events)",
            index,
            self.events.len()
        );
        let millis: u64 = self.events[..index].iter().map(|e| e.delay().as_millis()).sum();
        I::Duration::from_millis(millis)
    }

    /// Time for one complete cycle of the chain, excluding action run time.
    pub fn total_time(&self) -> I::Duration {
        self.total_time_before(self.events.len())
    }
}

impl<'t, I: TimeInstant, A, T: ChainTimer<I::Duration>, S: TimeSource<I>, const N: usize> Drop
    for EventChain<'t, I, A, T, S, N>
{
    /// Cancels any pending wakeup so no callback outlives the chain.
    fn drop(&mut self) {
        self.stop();
    }
}
