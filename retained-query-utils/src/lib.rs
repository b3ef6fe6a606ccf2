//! Small helpers shared by the retained message query crates.
//!
//! - [`Counter`]: atomic current/max counter used for index statistics
//! - [`to_duration`] / [`deserialize_duration`]: `1m30s`-style duration strings for settings
//!
//! ```
//! use retained_query_utils::{to_duration, Counter};
//!
//! let interval = to_duration("1m30s");
//! assert_eq!(interval.as_secs(), 90);
//!
//! let c = Counter::new();
//! c.inc();
//! assert_eq!(c.max(), 1);
//! ```

#![deny(unsafe_code)]

use std::time::Duration;

use serde::{Deserialize, Deserializer};

mod counter;

pub use counter::Counter;

/// Deserialize Duration from human-readable string format
#[inline]
pub fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let v = String::deserialize(deserializer)?;
    Ok(to_duration(&v))
}

/// Convert human-readable duration string to Duration
///
/// # Supported units:
/// - ms: milliseconds
/// - s: seconds
/// - m: minutes
/// - h: hours
/// - d: days
///
/// Unknown units and unparsable numbers contribute nothing.
#[inline]
pub fn to_duration(text: &str) -> Duration {
    let text = text.to_lowercase().replace("ms", "Y");
    let ms: u64 = text
        .split_inclusive(['s', 'm', 'h', 'd', 'Y'])
        .map(|x| {
            let mut chars = x.chars();
            let u = match chars.nth_back(0) {
                None => return 0,
                Some(u) => u,
            };
            let v = match chars.as_str().parse::<u64>() {
                Err(_e) => return 0,
                Ok(v) => v,
            };
            match u {
                'Y' => v,
                's' => v * 1000,
                'm' => v * 60000,
                'h' => v * 3600000,
                'd' => v * 86400000,
                _ => 0,
            }
        })
        .sum();
    Duration::from_millis(ms)
}
