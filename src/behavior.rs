//! The behavior strategy trait shared by [`Blink`](crate::blink::Blink) and
//! [`Pulse`](crate::pulse::Pulse).
//!
//! A behavior is a reusable timed-action pattern attachable to one or more
//! outputs. It owns one event chain and a set of attached output pins; the
//! chain runs exactly while the set is non-empty. Behaviors never own the
//! outputs they drive: the application owns its `LightOutput`s and hands
//! them to [`Behavior::tick`] when the behavior's timer fires. An output's
//! `claimed` flag enforces that at most one behavior drives it at a time;
//! switching modes is `old.stop(&mut out)` followed by `new.start(&mut out)`.
//!
//! The attached set mutates only in `start`/`stop`/`stop_all`, i.e. outside
//! the timer's critical section; under the single-driver cooperative model
//! that is what keeps registration safe against a concurrently firing tick.

use crate::output::{LightOutput, PwmOutput};

/// Errors from attaching outputs to behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BehaviorError {
    /// The output is already registered with a different behavior.
    AlreadyDriven {
        /// Pin of the contested output.
        pin: u8,
    },
    /// The behavior's attached-output capacity is exhausted.
    CapacityExceeded,
}

impl core::fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BehaviorError::AlreadyDriven { pin } => {
                write!(f, "output on pin {} is already driven by another behavior", pin)
            }
            BehaviorError::CapacityExceeded => {
                write!(f, "behavior cannot attach more outputs")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BehaviorError {}

/// A timed-action pattern driving a set of attached outputs in lockstep.
///
/// The trait covers the operations that touch outputs. Queries and pausing
/// (`is_running`, `attached_count`, `drives`, `pause_all`) are inherent on
/// [`Blink`](crate::blink::Blink) and [`Pulse`](crate::pulse::Pulse): they
/// never mention the PWM type, and a trait method that ignored `P` would make
/// every plain call ambiguous under the blanket `impl<P>` blocks.
pub trait Behavior<P: PwmOutput> {
    /// Registers `output` with this behavior.
    ///
    /// The first registration starts the behavior's chain, driving the
    /// registered output immediately; later registrations join silently and
    /// synchronize at the next tick. Registering an output that is already
    /// attached here is a no-op.
    ///
    /// # Errors
    /// * [`BehaviorError::AlreadyDriven`] - the output is claimed by another behavior
    /// * [`BehaviorError::CapacityExceeded`] - the attached set is full
    fn start(&mut self, output: &mut LightOutput<P>) -> Result<(), BehaviorError>;

    /// Deregisters `output` and releases its claim.
    ///
    /// When the last output leaves, the chain stops and its timer is
    /// cancelled. The output keeps whatever on/off state it had.
    fn stop(&mut self, output: &mut LightOutput<P>);

    /// Stops the chain and releases every attached output found in `outputs`.
    fn stop_all(&mut self, outputs: &mut [LightOutput<P>]);

    /// Resumes a paused chain from where it left off.
    fn resume_all(&mut self, outputs: &mut [LightOutput<P>]);

    /// Fires the due chain events against the attached outputs.
    ///
    /// Call this when the behavior's [`ChainTimer`](crate::time::ChainTimer)
    /// fires. Outputs in `outputs` that are not attached are left alone.
    fn tick(&mut self, outputs: &mut [LightOutput<P>]);
}

/// Converts a frequency in Hz to its period in milliseconds.
pub fn hz_to_millis(hz: u32) -> u64 {
    if hz == 0 { 0 } else { u64::from(1000 / hz) }
}

/// Converts a period in milliseconds to the nearest frequency in Hz.
///
/// Periods above two seconds round to zero; callers using the result as a
/// divisor must check for it.
pub fn millis_to_hz(ms: u64) -> u32 {
    if ms == 0 { 0 } else { ((1000 + ms / 2) / ms) as u32 }
}
