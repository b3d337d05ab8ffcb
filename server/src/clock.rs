use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds. The accrual watermark is
/// clamped downstream, so a clock stepping backwards cannot rewind state or
/// double-earn an interval.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
