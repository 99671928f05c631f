#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`LightOutput`**: one controllable light over a [`PwmOutput`] channel,
//!   with gamma-corrected brightness, min/max bounds and polarity handling
//! - **`Behavior`**: a reusable timed-action pattern ([`Blink`] or [`Pulse`])
//!   shared by any number of attached outputs
//! - **`EventChain`** / **`TimedEvent`**: the cyclic relative-time scheduler
//!   underlying every behavior, driven by one [`ChainTimer`]
//! - **`percent_to_duty`** / **`BrightnessRange`**: the perceptual
//!   brightness-mapping core
//! - **`TimeSource`** / **`TimeInstant`** / **`TimeDuration`**: traits to
//!   implement for your timing system
//!
//! Brightness is always a 0–100 percentage at the API surface; hardware duty
//! values appear only at the [`PwmOutput`] boundary.

pub mod behavior;
pub mod blink;
pub mod brightness;
pub mod chain;
pub mod output;
pub mod pulse;
pub mod time;

pub use behavior::{Behavior, BehaviorError, hz_to_millis, millis_to_hz};
pub use blink::{Blink, DEFAULT_BLINK_INTERVAL_MS, DEFAULT_BLINK_ON_MS};
pub use brightness::{BrightnessRange, GAMMA, percent_to_duty, percent_to_duty_exact};
pub use chain::{ChainError, EventChain, TimedEvent};
pub use output::{LightOutput, Polarity, PwmOutput};
pub use pulse::{DEFAULT_PULSE_PERIOD_MS, DEFAULT_PULSE_REFRESH_HZ, Pulse};
pub use time::{ChainTimer, TimeDuration, TimeInstant, TimeSource};
