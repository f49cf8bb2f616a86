//! Session clock types.
//!
//! The engine never reads a wall clock. Hosts pass the current [`Timestamp`]
//! into every operation; remote participants exchange relative seconds, so
//! clocks only need to advance at the same rate.

use core::fmt;
use core::ops::Add;
use core::time::Duration;

/// Milliseconds elapsed on the session clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: f32) -> Self {
        Self(secs_to_millis(secs))
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns the timestamp `secs` seconds later. Non-positive input yields `self`.
    pub fn after_secs(self, secs: f32) -> Self {
        Self(self.0.saturating_add(secs_to_millis(secs)))
    }

    /// Time left until `later`, zero once it has passed.
    pub fn until(self, later: Timestamp) -> Duration {
        Duration::from_millis(later.0.saturating_sub(self.0))
    }

    pub fn secs_until(self, later: Timestamp) -> f32 {
        later.0.saturating_sub(self.0) as f32 / 1000.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Converts fractional seconds into whole milliseconds, rounding to nearest.
///
/// Rounding keeps `secs_until` / `after_secs` exact for any millisecond value a
/// peer encodes, so a synced expiry lands on the same tick on both sides.
pub fn secs_to_millis(secs: f32) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (f64::from(secs) * 1000.0).round() as u64
    } else {
        0
    }
}

pub fn secs_to_duration(secs: f32) -> Duration {
    Duration::from_millis(secs_to_millis(secs))
}

/// When an instance stops being valid.
///
/// Ordering places `Immediate` below every concrete time and `Never` above it,
/// so expiries compare the same way the durations they encode do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expiry {
    /// Instant effects: already expired on creation.
    Immediate,
    /// Timed effects.
    At(Timestamp),
    /// Toggle effects.
    Never,
}

impl Expiry {
    pub fn has_passed(self, now: Timestamp) -> bool {
        match self {
            Self::Immediate => true,
            Self::At(end) => now >= end,
            Self::Never => false,
        }
    }

    /// Remaining time for timed instances.
    pub fn remaining(self, now: Timestamp) -> Option<Duration> {
        match self {
            Self::At(end) => Some(now.until(end)),
            Self::Immediate | Self::Never => None,
        }
    }

    pub fn deadline(self) -> Option<Timestamp> {
        match self {
            Self::At(end) => Some(end),
            Self::Immediate | Self::Never => None,
        }
    }
}
