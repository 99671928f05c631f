//! Time and timer abstraction traits for platform-agnostic scheduling.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;

    /// Saturating subtraction (returns ZERO on underflow).
    fn saturating_sub(self, other: Self) -> Self;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}

/// One-shot timer collaborator driving an event chain.
///
/// Implement this for your platform's alarm or wakeup primitive. The contract
/// is deliberately narrow: the chain arms a single pending deadline, and the
/// platform calls [`EventChain::tick`](crate::chain::EventChain::tick) when it
/// elapses.
pub trait ChainTimer<D: TimeDuration> {
    /// Requests a wakeup after `delay`, replacing any pending deadline.
    ///
    /// A zero delay means "fire as soon as possible"; the platform must still
    /// deliver the wakeup through its normal path rather than calling back
    /// synchronously from `arm`.
    fn arm(&mut self, delay: D);

    /// Cancels the pending wakeup, if any.
    ///
    /// After this returns, no wakeup may be delivered. On preemptive platforms
    /// the implementation must block until a concurrently firing callback has
    /// completed, not merely clear a flag.
    fn cancel(&mut self);
}
