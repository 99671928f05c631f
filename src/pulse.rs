//! Sinusoidal brightness pulsing ("breathing").

use crate::behavior::{Behavior, BehaviorError, hz_to_millis};
use crate::chain::{EventChain, TimedEvent};
use crate::output::{LightOutput, PwmOutput};
use crate::time::{ChainTimer, TimeDuration, TimeInstant, TimeSource};
use core::f32::consts::{FRAC_PI_2, PI, TAU};
use heapless::Vec;

/// Default brightness refresh rate in Hz.
pub const DEFAULT_PULSE_REFRESH_HZ: u32 = 30;

/// Default time for one full trough-peak-trough cycle.
pub const DEFAULT_PULSE_PERIOD_MS: u64 = 2000;

const SINE_STEPS: usize = 101;

/// Sine over one quadrant, `[0, pi/2]` in `SINE_STEPS - 1` equal steps.
const SINE_LUT: [f32; SINE_STEPS] = [
    0.000_000_0, 0.015_707_3, 0.031_410_8, 0.047_106_5, 0.062_790_5, //
    0.078_459_1, 0.094_108_3, 0.109_734_3, 0.125_333_2, 0.140_901_2, //
    0.156_434_5, 0.171_929_1, 0.187_381_3, 0.202_787_3, 0.218_143_2, //
    0.233_445_4, 0.248_689_9, 0.263_873_0, 0.278_991_1, 0.294_040_3, //
    0.309_017_0, 0.323_917_4, 0.338_737_9, 0.353_474_8, 0.368_124_6, //
    0.382_683_4, 0.397_147_9, 0.411_514_4, 0.425_779_3, 0.439_939_2, //
    0.453_990_5, 0.467_929_8, 0.481_753_7, 0.495_458_7, 0.509_041_4, //
    0.522_498_6, 0.535_826_8, 0.549_022_8, 0.562_083_4, 0.575_005_3, //
    0.587_785_3, 0.600_420_2, 0.612_907_1, 0.625_242_7, 0.637_424_0, //
    0.649_448_0, 0.661_311_9, 0.673_012_5, 0.684_547_1, 0.695_912_8, //
    0.707_106_8, 0.718_126_3, 0.728_968_6, 0.739_631_1, 0.750_111_1, //
    0.760_406_0, 0.770_513_2, 0.780_430_4, 0.790_155_0, 0.799_684_7, //
    0.809_017_0, 0.818_149_7, 0.827_080_6, 0.835_807_4, 0.844_327_9, //
    0.852_640_2, 0.860_742_0, 0.868_631_5, 0.876_306_7, 0.883_765_6, //
    0.891_006_5, 0.898_027_6, 0.904_827_1, 0.911_403_3, 0.917_754_6, //
    0.923_879_5, 0.929_776_5, 0.935_444_0, 0.940_880_8, 0.946_085_4, //
    0.951_056_5, 0.955_793_0, 0.960_293_7, 0.964_557_4, 0.968_583_2, //
    0.972_369_9, 0.975_916_8, 0.979_222_8, 0.982_287_3, 0.985_109_3, //
    0.987_688_3, 0.990_023_7, 0.992_114_7, 0.993_961_0, 0.995_562_0, //
    0.996_917_3, 0.998_026_7, 0.998_889_9, 0.999_506_6, 0.999_876_6, //
    1.000_000_0,
];

/// Wraps an angle into `[0, 2*pi)`.
fn wrap_tau(theta: f32) -> f32 {
    let wrapped = libm::fmodf(theta, TAU);
    if wrapped < 0.0 { wrapped + TAU } else { wrapped }
}

/// Sine via the quadrant table, folded by reflection and sign.
///
/// Odd quadrants read the table backwards, the lower half-circle negates.
/// Accurate to well under a percent of true sine, plenty for visual pulsing.
fn sine_lookup(theta: f32) -> f32 {
    let theta = wrap_tau(theta);
    // Quadrant and intra-quadrant offset must come from the same floor:
    // rounding in a separate fmodf can disagree with the quadrant by one
    // right at odd multiples of pi/2.
    let quarters = libm::floorf(theta / FRAC_PI_2);
    let quadrant = quarters as usize % 4;
    let within = theta - quarters * FRAC_PI_2;

    let mut index = ((SINE_STEPS - 1) as f32 * within / FRAC_PI_2) as usize;
    if quadrant % 2 == 1 {
        index = SINE_STEPS - 1 - index;
    }
    let sign = if quadrant >= 2 { -1.0 } else { 1.0 };
    sign * SINE_LUT[index]
}

/// Phase state of a pulse wave, shared by every output the behavior drives.
#[derive(Debug, Clone, Copy)]
struct PulsePhase {
    theta: f32,
    step: f32,
    current_sine: f32,
    changed: bool,
}

impl PulsePhase {
    fn new(step: f32) -> Self {
        Self {
            theta: PI,
            step,
            current_sine: 0.0,
            changed: false,
        }
    }

    /// Steps theta forward, keeping it bounded, and refreshes the cached
    /// sine. Steps too small for the table to resolve leave `changed` false
    /// so the refresh pass can skip redundant hardware writes.
    fn advance(&mut self) {
        self.theta = wrap_tau(self.theta + self.step);
        let sine = sine_lookup(self.theta);
        self.changed = sine != self.current_sine;
        self.current_sine = sine;
    }

    /// Repositions the wave. The cached sine is left stale on purpose so the
    /// next advance sees a change and refreshes the outputs.
    fn jump_to(&mut self, theta: f32) {
        self.theta = theta;
    }
}

/// Chain action tokens: advance the shared phase, then refresh the outputs.
/// The refresh event carries a zero delay, so both run in one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PulseStep {
    AdvancePhase,
    Apply,
}

const EV_ADVANCE: usize = 0;

/// Pulses every attached output through a shared sinusoidal brightness wave.
///
/// Each refresh tick advances one phase angle and drives every attached
/// output to `amplitude * sin(theta) + offset`, where the offset and
/// amplitude derive from that output's own brightness bounds, so outputs with
/// different bounds breathe over different ranges but always in phase.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - One-shot timer implementation
/// * `S` - Time source implementation
/// * `MAX_OUTPUTS` - Maximum number of attached outputs
pub struct Pulse<'t, I: TimeInstant, T: ChainTimer<I::Duration>, S: TimeSource<I>, const MAX_OUTPUTS: usize>
{
    chain: EventChain<'t, I, PulseStep, T, S, 2>,
    attached: Vec<u8, MAX_OUTPUTS>,
    phase: PulsePhase,
    refresh_hz: u32,
}

impl<'t, I: TimeInstant, T: ChainTimer<I::Duration>, S: TimeSource<I>, const MAX_OUTPUTS: usize>
    Pulse<'t, I, T, S, MAX_OUTPUTS>
{
    /// Creates a stopped pulse behavior with the default 2 s period at 30 Hz.
    pub fn new(timer: T, time_source: &'t S) -> Self {
        Self::with_timing(
            I::Duration::from_millis(DEFAULT_PULSE_PERIOD_MS),
            DEFAULT_PULSE_REFRESH_HZ,
            timer,
            time_source,
        )
    }

    /// Creates a stopped pulse behavior with explicit timing.
    ///
    /// # Panics
    /// Panics if `period` is zero or `refresh_hz` is outside `1..=1000`
    /// (the refresh interval must be at least one millisecond).
    pub fn with_timing(period: I::Duration, refresh_hz: u32, timer: T, time_source: &'t S) -> Self {
        assert!(period.as_millis() > 0, "pulse period must be nonzero");
        assert!(
            refresh_hz > 0 && refresh_hz <= 1000,
            "pulse refresh rate must be in 1..=1000 Hz"
        );

        let refresh_interval = I::Duration::from_millis(hz_to_millis(refresh_hz));
        let chain = EventChain::with_events(
            &[
                TimedEvent::new(refresh_interval, PulseStep::AdvancePhase).with_label("advance"),
                TimedEvent::new(I::Duration::ZERO, PulseStep::Apply).with_label("apply"),
            ],
            timer,
            time_source,
        );

        Self {
            chain,
            attached: Vec::new(),
            phase: PulsePhase::new(step_for(period.as_millis(), refresh_hz)),
            refresh_hz,
        }
    }

    /// Returns the time for one full brightness cycle, derived from the
    /// current phase step. Round-trips with [`set_period`](Self::set_period)
    /// to within one refresh tick.
    pub fn period(&self) -> I::Duration {
        let steps_per_period = TAU / self.phase.step;
        let millis = steps_per_period * hz_to_millis(self.refresh_hz) as f32;
        I::Duration::from_millis(libm::roundf(millis) as u64)
    }

    /// Sets the time for one full trough-peak-trough brightness cycle.
    ///
    /// # Panics
    /// Panics if `period` is zero.
    pub fn set_period(&mut self, period: I::Duration) {
        assert!(period.as_millis() > 0, "pulse period must be nonzero");
        self.phase.step = step_for(period.as_millis(), self.refresh_hz);
    }

    /// Returns the brightness refresh rate in Hz.
    pub fn refresh_rate(&self) -> u32 {
        self.refresh_hz
    }

    /// Sets the refresh rate, retiming the chain and rescaling the phase
    /// step so the configured period is preserved.
    ///
    /// # Panics
    /// Panics if `hz` is outside `1..=1000`.
    pub fn set_refresh_rate(&mut self, hz: u32) {
        assert!(
            hz > 0 && hz <= 1000,
            "pulse refresh rate must be in 1..=1000 Hz"
        );
        let period = self.period();
        self.refresh_hz = hz;
        self.chain
            .change_delay(EV_ADVANCE, I::Duration::from_millis(hz_to_millis(hz)));
        self.phase.step = step_for(period.as_millis(), hz);
    }

    /// Jumps the wave to maximum intensity. Pulsing continues uninterrupted.
    pub fn set_to_peak(&mut self) {
        self.phase.jump_to(FRAC_PI_2);
    }

    /// Jumps the wave to minimum intensity. Pulsing continues uninterrupted.
    pub fn set_to_trough(&mut self) {
        self.phase.jump_to(PI + FRAC_PI_2);
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

/// Angular step per refresh tick for a full wave every `period_ms`.
fn step_for(period_ms: u64, refresh_hz: u32) -> f32 {
    TAU / period_ms as f32 * hz_to_millis(refresh_hz) as f32
}

fn refresh<P: PwmOutput>(phase: &PulsePhase, attached: &[u8], outputs: &mut [LightOutput<P>]) {
    if !phase.changed {
        return;
    }
    for output in outputs.iter_mut() {
        if !attached.contains(&output.pin()) {
            continue;
        }
        // f(theta) = A * sin(theta) + O, with A and O from this output's
        // bounds so the wave spans exactly [min, max].
        let min = f32::from(output.min_brightness());
        let max = f32::from(output.max_brightness());
        let offset = (min + max) / 2.0;
        let amplitude = max - offset;
        let percent = libm::roundf(amplitude * phase.current_sine + offset) as u8;
        output.on(percent);
    }
}

impl<'t, I, T, S, P, const MAX_OUTPUTS: usize> Behavior<P> for Pulse<'t, I, T, S, MAX_OUTPUTS>
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
            let Self { chain, attached, phase, .. } = self;
            let outputs = core::slice::from_mut(output);
            chain.start(|step| match step {
                PulseStep::AdvancePhase => phase.advance(),
                PulseStep::Apply => refresh(phase, attached, outputs),
            });
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
        let Self { chain, attached, phase, .. } = self;
        chain.resume(|step| match step {
            PulseStep::AdvancePhase => phase.advance(),
            PulseStep::Apply => refresh(phase, attached, outputs),
        });
    }

    fn tick(&mut self, outputs: &mut [LightOutput<P>]) {
        let Self { chain, attached, phase, .. } = self;
        chain.tick(|step| match step {
            PulseStep::AdvancePhase => phase.advance(),
            PulseStep::Apply => refresh(phase, attached, outputs),
        });
    }
}
