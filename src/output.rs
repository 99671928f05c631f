//! Controllable light output over an abstract PWM channel.

use crate::brightness::{BrightnessRange, percent_to_duty};

/// Trait for abstracting a PWM output channel.
///
/// Implement this for your hardware (LEDC channel, hardware timer PWM,
/// software PWM, ...). The brightness core depends only on this narrow
/// contract. Writes are assumed to always succeed; handle any hardware
/// errors internally.
pub trait PwmOutput {
    /// Drives the channel to the given duty value.
    fn write(&mut self, duty: u16);

    /// Maximum duty value representable at the current hardware resolution.
    fn range(&self) -> u16;

    /// GPIO number the channel is bound to. Used as the output's identity
    /// when registering with behaviors.
    fn pin(&self) -> u8;
}

/// Electrical orientation of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Full duty drives the light fully on.
    ActiveHigh,
    /// Inverted wiring: zero duty drives the light fully on.
    ActiveLow,
}

/// A single controllable light output.
///
/// Owns one PWM channel and tracks brightness bounds, polarity and on/off
/// state. "Off" drives the output to its *minimum* brightness, which need not
/// be electrically dark: a status LED can idle at a faint glow by setting a
/// nonzero minimum.
pub struct LightOutput<P: PwmOutput> {
    pwm: P,
    brightness: BrightnessRange,
    polarity: Polarity,
    is_on: bool,
    claimed: bool,
}

impl<P: PwmOutput> LightOutput<P> {
    /// Creates an output and drives it to its off state.
    pub fn new(pwm: P, polarity: Polarity) -> Self {
        let mut output = Self {
            pwm,
            brightness: BrightnessRange::default(),
            polarity,
            is_on: false,
            claimed: false,
        };
        output.off();
        output
    }

    /// Turns the output on at the given percent brightness.
    ///
    /// The percentage is clamped into `[min, max]` before conversion, so
    /// out-of-range requests are honored at the nearest bound rather than
    /// rejected. The output reports on only when driven above its minimum.
    pub fn on(&mut self, percent: u8) {
        let clamped = self.brightness.clamp(percent);
        self.drive(clamped);
        self.is_on = clamped > self.brightness.min();
    }

    /// Turns the output off, i.e. drives it to its minimum brightness.
    pub fn off(&mut self) {
        self.drive(self.brightness.min());
        self.is_on = false;
    }

    /// Toggles between [`off`](Self::off) and [`on`](Self::on)`(percent)`.
    pub fn toggle(&mut self, percent: u8) {
        if self.is_on {
            self.off();
        } else {
            self.on(percent);
        }
    }

    /// Returns true if the output is driven above its minimum brightness.
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the GPIO number of the underlying channel.
    pub fn pin(&self) -> u8 {
        self.pwm.pin()
    }

    /// Returns the electrical orientation.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Returns the minimum brightness percentage.
    pub fn min_brightness(&self) -> u8 {
        self.brightness.min()
    }

    /// Returns the maximum brightness percentage.
    pub fn max_brightness(&self) -> u8 {
        self.brightness.max()
    }

    /// Sets the maximum brightness; see [`BrightnessRange::set_max`] for the
    /// bound-conflict rules.
    pub fn set_max_brightness(&mut self, percent: u8) {
        self.brightness.set_max(percent);
    }

    /// Sets the minimum brightness; see [`BrightnessRange::set_min`] for the
    /// bound-conflict rules.
    pub fn set_min_brightness(&mut self, percent: u8) {
        self.brightness.set_min(percent);
    }

    /// Returns true while a behavior holds this output.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    pub(crate) fn claim(&mut self) {
        self.claimed = true;
    }

    pub(crate) fn release(&mut self) {
        self.claimed = false;
    }

    fn drive(&mut self, percent: u8) {
        let duty = percent_to_duty(percent, self.pwm.range());
        let duty = match self.polarity {
            Polarity::ActiveHigh => duty,
            Polarity::ActiveLow => self.pwm.range() - duty,
        };
        self.pwm.write(duty);
    }
}

impl<P: PwmOutput> Drop for LightOutput<P> {
    /// Leaves the wire fully dark, ignoring any configured minimum.
    ///
    /// Deregistering from a behavior is the application's responsibility;
    /// a behavior that still lists this pin simply stops finding it among the
    /// outputs handed to `tick`.
    fn drop(&mut self) {
        self.brightness.set_min(0);
        self.off();
    }
}
