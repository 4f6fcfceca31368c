//! Shared formatting helpers.
//!
//! Output formats are part of the `/status` contract, so each helper pins its
//! exact rendering in tests.

use chrono::{Local, NaiveDateTime, TimeZone, Timelike};

/// Kilobytes per megabyte. The service reports decimal megabytes.
pub const KB_PER_MB: f64 = 1000.0;

/// Converts kilobytes to decimal megabytes.
pub fn kb_to_mb(kb: u64) -> f64 {
    kb as f64 / KB_PER_MB
}

/// Format a float with the shortest round-trip representation, always keeping
/// a fractional part: `16384.0`, `1.5`, `0.001`.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

/// Format kilobytes as a decimal megabyte string: `16384000` → `"16384.0 mb"`.
pub fn format_decimal_mb(kb: u64) -> String {
    format!("{} mb", format_float(kb_to_mb(kb)))
}

/// ISO-8601 rendering of a naive local time.
///
/// `YYYY-MM-DDTHH:MM:SS`, with `.ffffff` appended only when the microsecond
/// part is non-zero.
pub fn format_iso(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Converts seconds since the Unix epoch to local time, rounded to the
/// microsecond. Returns `None` for values outside chrono's range.
pub fn epoch_to_local(epoch_secs: f64) -> Option<NaiveDateTime> {
    if !epoch_secs.is_finite() {
        return None;
    }
    let micros = (epoch_secs * 1_000_000.0).round() as i64;
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Local
        .timestamp_opt(secs, nanos)
        .earliest()
        .map(|dt| dt.naive_local())
}

/// Current wall-clock time in the same format as [`format_iso`].
pub fn now_iso() -> String {
    format_iso(&Local::now().naive_local())
}
