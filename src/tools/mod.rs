pub mod calculator;
pub mod echo;
pub mod status;

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
