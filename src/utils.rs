use chrono::Local;

/// Local-time stamp used in every file this crate writes
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Current local time as `YYYYMMDD_HHMMSS`
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Build `{prefix}_YYYYMMDD_HHMMSS.{ext}` from the current local time
pub fn stamped_filename(prefix: &str, ext: &str) -> String {
    format!("{}_{}.{}", prefix, timestamp(), ext)
}
