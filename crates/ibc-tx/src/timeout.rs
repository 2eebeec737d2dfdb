//! IBC timeout timestamps

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use terpdash_core::constants::IBC_TIMEOUT_SECS;

/// `MsgTransfer.timeout_timestamp` for a transfer sent at `now`
pub fn timeout_timestamp_ns(now: SystemTime) -> u64 {
    let deadline =
        now.duration_since(UNIX_EPOCH).unwrap_or_default() + Duration::from_secs(IBC_TIMEOUT_SECS);
    deadline.as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_minutes_ahead() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(timeout_timestamp_ns(now), 1_700_000_600_000_000_000);
    }
}
