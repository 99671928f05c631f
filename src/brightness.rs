//! Perceptual brightness handling.
//!
//! Human brightness perception is roughly logarithmic in emitted power, so a
//! linear sweep of PWM duty looks like it spends most of its time "bright".
//! [`percent_to_duty`] maps a perceptually linear 0–100 percentage onto a
//! hardware duty value through a gamma curve, and [`BrightnessRange`] keeps a
//! per-output min/max brightness window with a strict `min < max` invariant.

/// Gamma exponent used for the perceptual brightness curve.
pub const GAMMA: f32 = 3.0;

/// Resolution of the precomputed brightness table (10-bit scale).
const LUT_RANGE: u16 = 1023;

/// Gamma-corrected duty values on a 10-bit scale, one entry per percent.
///
/// Entry `p` is `round(1023 * (p / 100)^GAMMA)`.
const BRIGHTNESS_LUT: [u16; 101] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, //
    1, 1, 2, 2, 3, 3, 4, 5, 6, 7, //
    8, 9, 11, 12, 14, 16, 18, 20, 22, 25, //
    28, 30, 34, 37, 40, 44, 48, 52, 56, 61, //
    65, 71, 76, 81, 87, 93, 100, 106, 113, 120, //
    128, 136, 144, 152, 161, 170, 180, 189, 200, 210, //
    221, 232, 244, 256, 268, 281, 294, 308, 322, 336, //
    351, 366, 382, 398, 415, 432, 449, 467, 485, 504, //
    524, 544, 564, 585, 606, 628, 651, 674, 697, 721, //
    746, 771, 797, 823, 850, 877, 905, 934, 963, 993, //
    1023,
];

/// Maps a brightness percentage to a hardware duty value.
///
/// The conversion is gamma-compensated, deterministic and monotone:
/// `percent_to_duty(0, r) == 0` and `percent_to_duty(100, r) == r` for any
/// hardware range `r`. Inputs above 100 are clamped to 100, never rejected.
///
/// `range` is the maximum duty value representable at the hardware's current
/// PWM resolution (e.g. 1023 for 10-bit).
pub fn percent_to_duty(percent: u8, range: u16) -> u16 {
    let percent = if percent > 100 { 100 } else { percent };
    let raw = BRIGHTNESS_LUT[usize::from(percent)];

    // Rounding rescale from the table's 10-bit scale to the hardware range.
    let scaled =
        (u32::from(raw) * u32::from(range) + u32::from(LUT_RANGE) / 2) / u32::from(LUT_RANGE);
    scaled as u16
}

/// Closed-form equivalent of [`percent_to_duty`].
///
/// Computes `round(range * (percent / 100)^GAMMA)` directly. Agrees with the
/// table-based conversion to within one duty unit at the table's native
/// resolution; mainly useful for validation and for hardware ranges far from
/// 10 bits.
pub fn percent_to_duty_exact(percent: u8, range: u16) -> u16 {
    let percent = if percent > 100 { 100 } else { percent };
    let normalized = f32::from(percent) / 100.0;
    libm::roundf(libm::powf(normalized, GAMMA) * f32::from(range)) as u16
}

/// A per-output brightness window in percent.
///
/// Maintains the strict invariant `min < max <= 100` at all times. Setting one
/// bound to a value that would violate the invariant adjusts the *other* bound
/// rather than rejecting the call, so a sequence of setter calls can never
/// leave the range inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessRange {
    min: u8,
    max: u8,
}

impl BrightnessRange {
    /// Creates a range with the given bounds.
    ///
    /// # Panics
    /// Panics unless `min < max <= 100`.
    pub fn new(min: u8, max: u8) -> Self {
        assert!(
            min < max && max <= 100,
            "brightness bounds must satisfy min < max <= 100"
        );
        Self { min, max }
    }

    /// Returns the minimum brightness percentage.
    pub fn min(&self) -> u8 {
        self.min
    }

    /// Returns the maximum brightness percentage.
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Sets the maximum brightness, clamping the input to `[1, 100]`.
    ///
    /// If the new maximum does not exceed the current minimum, the minimum is
    /// pulled down to one below it.
    pub fn set_max(&mut self, percent: u8) {
        let percent = percent.clamp(1, 100);
        self.max = percent;
        if percent <= self.min {
            self.min = percent - 1;
        }
    }

    /// Sets the minimum brightness, clamping the input to `[0, 99]`.
    ///
    /// If the new minimum reaches the current maximum, the maximum is pushed
    /// up to one above it.
    pub fn set_min(&mut self, percent: u8) {
        let percent = if percent > 99 { 99 } else { percent };
        self.min = percent;
        if percent >= self.max {
            self.max = percent + 1;
        }
    }

    /// Clamps a requested percentage into this range.
    pub fn clamp(&self, percent: u8) -> u8 {
        percent.clamp(self.min, self.max)
    }
}

impl Default for BrightnessRange {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}
