//! Periodic on/off blinking.

use crate::behavior::{Behavior, BehaviorError};
use crate::chain::{EventChain, TimedEvent};
use crate::output::{LightOutput, PwmOutput};
use crate::time::{ChainTimer, TimeDuration, TimeInstant, TimeSource};
use heapless::Vec;

/// Default time between blink starts.
pub const DEFAULT_BLINK_INTERVAL_MS: u64 = 2000;

/// Default time the output stays lit per blink.
pub const DEFAULT_BLINK_ON_MS: u64 = 300;

/// Chain action tokens. Delays sit one position ahead of the state they
/// gate: the wait stored on `TurnOn` is the dark stretch before relighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkStep {
    TurnOn,
    TurnOff,
}

const EV_ON: usize = 0;
const EV_OFF: usize = 1;

/// Blinks every attached output in lockstep.
///
/// The underlying chain always has exactly two events: "turn on", whose delay
/// is the dark time between blinks (`interval - on_duration`), and "turn
/// off", whose delay is the lit time. Starting the first output fires "turn
/// on" immediately, so blink windows land at `[k * interval,
/// k * interval + on_duration)`.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - One-shot timer implementation
/// * `S` - Time source implementation
/// * `MAX_OUTPUTS` - Maximum number of attached outputs
pub struct Blink<'t, I: TimeInstant, T: ChainTimer<I::Duration>, S: TimeSource<I>, const MAX_OUTPUTS: usize>
{
    chain: EventChain<'t, I, BlinkStep, T, S, 2>,
    attached: Vec<u8, MAX_OUTPUTS>,
    interval: I::Duration,
    on_duration: I::Duration,
}

impl<'t, I: TimeInstant, T: ChainTimer<I::Duration>, S: TimeSource<I>, const MAX_OUTPUTS: usize>
    Blink<'t, I, T, S, MAX_OUTPUTS>
{
    /// Creates a stopped blink behavior with the default 300 ms flash every
    /// 2 seconds.
    pub fn new(timer: T, time_source: &'t S) -> Self {
        Self::with_timing(
            I::Duration::from_millis(DEFAULT_BLINK_INTERVAL_MS),
            I::Duration::from_millis(DEFAULT_BLINK_ON_MS),
            timer,
            time_source,
        )
    }

    /// Creates a stopped blink behavior with explicit timing.
    ///
    /// # Panics
    /// Panics unless `0 < on_duration < interval`.
    pub fn with_timing(
        interval: I::Duration,
        on_duration: I::Duration,
        timer: T,
        time_source: &'t S,
    ) -> Self {
        assert!(on_duration.as_millis() > 0, "blink on-duration must be nonzero");
        assert!(
            interval.as_millis() > on_duration.as_millis(),
            "blink interval must exceed the on-duration"
        );

        let chain = EventChain::with_events(
            &[
                TimedEvent::new(interval.saturating_sub(on_duration), BlinkStep::TurnOn)
                    .with_label("on"),
                TimedEvent::new(on_duration, BlinkStep::TurnOff).with_label("off"),
            ],
            timer,
            time_source,
        );

        Self {
            chain,
            attached: Vec::new(),
            interval,
            on_duration,
        }
    }

    /// Returns the time between blink starts.
    pub fn interval(&self) -> I::Duration {
        self.interval
    }

    /// Returns the lit time per blink.
    pub fn on_duration(&self) -> I::Duration {
        self.on_duration
    }

    /// Sets the time between blink starts. Takes effect on the next cycle.
    ///
    /// # Panics
    /// Panics unless `interval > on_duration()`.
    pub fn set_interval(&mut self, interval: I::Duration) {
        assert!(
            interval.as_millis() > self.on_duration.as_millis(),
            "blink interval must exceed the on-duration"
        );
        self.interval = interval;
        self.chain
            .change_delay(EV_ON, interval.saturating_sub(self.on_duration));
    }

    /// Sets the lit time per blink. Takes effect on the next cycle.
    ///
    /// # Panics
    /// Panics unless `0 < on_duration < interval()`.
    pub fn set_on_duration(&mut self, on_duration: I::Duration) {
        assert!(on_duration.as_millis() > 0, "blink on-duration must be nonzero");
        assert!(
            self.interval.as_millis() > on_duration.as_millis(),
            "blink on-duration must stay below the interval"
        );
        self.on_duration = on_duration;
        self.chain.change_delay(EV_OFF, on_duration);
        self.chain
            .change_delay(EV_ON, self.interval.saturating_sub(on_duration));
    }

    /// Suspends the chain without detaching anything.
    pub fn pause_all(&mut self) {
        self.chain.stop();
    }

    /// Returns true while the chain is running.
    pub fn is_running(&self) -> bool {
        self.chain.is_running()
    }

    /// Number of currently attached outputs.
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Returns true if `pin` is attached and the chain is running.
    pub fn drives(&self, pin: u8) -> bool {
        self.chain.is_running() && self.attached.contains(&pin)
    }
}

fn drive<P: PwmOutput>(step: &BlinkStep, attached: &[u8], outputs: &mut [LightOutput<P>]) {
    for output in outputs.iter_mut() {
        if !attached.contains(&output.pin()) {
            continue;
        }
        match step {
            BlinkStep::TurnOn => output.on(100),
            BlinkStep::TurnOff => output.off(),
        }
    }
}

impl<'t, I, T, S, P, const MAX_OUTPUTS: usize> Behavior<P> for Blink<'t, I, T, S, MAX_OUTPUTS>
where
    I: TimeInstant,
    T: ChainTimer<I::Duration>,
    S: TimeSource<I>,
    P: PwmOutput,
{
    fn start(&mut self, output: &mut LightOutput<P>) -> Result<(), BehaviorError> {
        let pin = output.pin();
        if self.attached.contains(&pin) {
            return Ok(());
        }
        if output.is_claimed() {
            return Err(BehaviorError::AlreadyDriven { pin });
        }
        self.attached
            .push(pin)
            .map_err(|_| BehaviorError::CapacityExceeded)?;
        output.claim();

        if !self.chain.is_running() {
            let Self { chain, attached, .. } = self;
            let outputs = core::slice::from_mut(output);
            chain.start(|step| drive(step, attached, outputs));
        }
        Ok(())
    }

    fn stop(&mut self, output: &mut LightOutput<P>) {
        let pin = output.pin();
        if let Some(index) = self.attached.iter().position(|p| *p == pin) {
            self.attached.remove(index);
            output.release();
        }
        if self.attached.is_empty() {
            self.chain.stop();
        }
    }

    fn stop_all(&mut self, outputs: &mut [LightOutput<P>]) {
        self.chain.stop();
        for output in outputs.iter_mut() {
            if self.attached.contains(&output.pin()) {
                output.release();
            }
        }
        self.attached.clear();
    }

    fn resume_all(&mut self, outputs: &mut [LightOutput<P>]) {
        if self.attached.is_empty() {
            return;
        }
        let Self { chain, attached, .. } = self;
        chain.resume(|step| drive(step, attached, outputs));
    }

    fn tick(&mut self, outputs: &mut [LightOutput<P>]) {
        let Self { chain, attached, .. } = self;
        chain.tick(|step| drive(step, attached, outputs));
    }
}
