use chrono::Local;

/// Format a Unix timestamp (seconds) as local `YYYY-MM-DD HH:MM:SS`.
/// Returns `None` for zero or out-of-range timestamps.
pub fn format_local_ts(timestamp_secs: u64) -> Option<String> {
    if timestamp_secs == 0 {
        return None;
    }
    let secs = i64::try_from(timestamp_secs).ok()?;
    chrono::DateTime::from_timestamp(secs, 0).map(|utc_dt| {
        utc_dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}
