//! File timestamps as stored in 7z headers.
//!
//! Times are Windows FILETIME values: 64-bit counts of 100-nanosecond
//! intervals since January 1, 1601 (UTC).
//!
//! # Example
//!
//! ```rust
//! use sevenz_header::Timestamp;
//!
//! let ts = Timestamp::from_filetime(116_444_736_000_000_000);
//! assert_eq!(ts.as_unix_secs(), 0);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Difference between the FILETIME epoch (1601) and the Unix epoch (1970)
/// in 100-nanosecond intervals.
const FILETIME_UNIX_DIFF: u64 = 116_444_736_000_000_000;

/// Number of 100-nanosecond intervals per second.
const INTERVALS_PER_SECOND: u64 = 10_000_000;

/// A timestamp read from a 7z header.
///
/// Keeps the raw FILETIME so no precision is lost; conversions are computed
/// on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    filetime: u64,
}

impl Timestamp {
    /// Creates a timestamp from a raw Windows FILETIME value.
    #[inline]
    pub const fn from_filetime(filetime: u64) -> Self {
        Self { filetime }
    }

    /// Returns the raw FILETIME value.
    #[inline]
    pub const fn as_filetime(&self) -> u64 {
        self.filetime
    }

    /// Returns whole seconds since the Unix epoch, rounding toward negative
    /// infinity for times before 1970.
    pub fn as_unix_secs(&self) -> i64 {
        let intervals = i128::from(self.filetime) - i128::from(FILETIME_UNIX_DIFF);
        intervals.div_euclid(i128::from(INTERVALS_PER_SECOND)) as i64
    }

    /// Converts to a `SystemTime` with full 100-nanosecond precision.
    pub fn as_system_time(&self) -> SystemTime {
        let to_duration = |intervals: u64| {
            Duration::new(
                intervals / INTERVALS_PER_SECOND,
                ((intervals % INTERVALS_PER_SECOND) * 100) as u32,
            )
        };
        if self.filetime >= FILETIME_UNIX_DIFF {
            UNIX_EPOCH + to_duration(self.filetime - FILETIME_UNIX_DIFF)
        } else {
            UNIX_EPOCH - to_duration(FILETIME_UNIX_DIFF - self.filetime)
        }
    }

    /// Returns the sub-second portion as 100-nanosecond intervals.
    #[inline]
    pub fn sub_second_100ns(&self) -> u32 {
        (self.filetime % INTERVALS_PER_SECOND) as u32
    }

    /// Returns true if this timestamp is before the Unix epoch.
    #[inline]
    pub fn is_before_unix_epoch(&self) -> bool {
        self.filetime < FILETIME_UNIX_DIFF
    }
}

impl From<u64> for Timestamp {
    fn from(filetime: u64) -> Self {
        Self::from_filetime(filetime)
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> SystemTime {
        ts.as_system_time()
    }
}
