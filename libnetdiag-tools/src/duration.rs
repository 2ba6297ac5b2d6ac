use std::fmt;
use std::ops::Sub;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

pub const MICROS_PER_SEC: u32 = 1_000_000;

/// Wall-clock timestamp in seconds and microseconds since the Unix epoch.
///
/// Partial, panic-free alternative to std::time types, matching the
/// resolution of capture providers:
///   - micros instead of nanos, no casts needed
///   - fields are exposed
///   - totally ordered, so records can be compared by capture time
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Serialize)]
pub struct Duration {
    pub secs: u32,
    pub micros: u32,
}

impl Duration {
    /// Build Duration from secs and micros
    pub fn new(secs: u32, micros: u32) -> Duration {
        Duration { secs, micros }
    }

    /// Current wall time.
    pub fn now() -> Duration {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Duration::new(d.as_secs() as u32, d.subsec_micros()),
            Err(_) => Duration::default(),
        }
    }

    /// Test if Duration object is null
    #[inline]
    pub fn is_null(self) -> bool {
        self.secs == 0 && self.micros == 0
    }
}

impl Sub for Duration {
    type Output = Duration;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, other: Duration) -> Self::Output {
        let secs = self.secs.wrapping_sub(other.secs);
        let (secs, micros) = if self.micros >= other.micros {
            (secs, self.micros - other.micros)
        } else {
            let diff = other.micros.wrapping_sub(self.micros);
            let secs_less = diff / MICROS_PER_SEC;
            let micros = MICROS_PER_SEC - diff;
            (secs.wrapping_sub(1 + secs_less), micros)
        };

        Duration { secs, micros }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}
