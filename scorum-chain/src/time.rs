use chainbase::KeyPart;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the unix epoch, as stored in records.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    /// Sentinel for "never", also marks paid out comments.
    pub const MAXIMUM: TimePointSec = TimePointSec(u32::MAX);
    pub const MINIMUM: TimePointSec = TimePointSec(0);

    pub fn secs(self) -> u32 {
        self.0
    }

    pub fn is_maximum(self) -> bool {
        self == TimePointSec::MAXIMUM
    }

    /// Saturates at `MAXIMUM`.
    pub fn add_seconds(self, seconds: u32) -> Self {
        TimePointSec(self.0.saturating_add(seconds))
    }

    pub fn sub_seconds(self, seconds: u32) -> Self {
        TimePointSec(self.0.saturating_sub(seconds))
    }

    /// Seconds elapsed since `earlier`, negative if `earlier` is later.
    pub fn since(self, earlier: TimePointSec) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_maximum() {
            f.write_str("never")
        } else {
            write!(f, "{}s", self.0)
        }
    }
}

impl From<TimePointSec> for KeyPart {
    fn from(t: TimePointSec) -> Self {
        KeyPart::from(t.0)
    }
}
