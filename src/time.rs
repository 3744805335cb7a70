use chrono::{DateTime, FixedOffset};
use hourglass_rs::SafeTimeProvider;

use crate::errors::{BillingError, Result};

/// offset of the service's local timezone (Asia/Jakarta, no daylight saving)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

pub fn offset_from_hours(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| BillingError::InvalidConfiguration {
            message: format!("utc offset of {hours} hours is out of range"),
        })
}

/// current time in the local timezone
pub fn local_now(time_provider: &SafeTimeProvider, offset: &FixedOffset) -> DateTime<FixedOffset> {
    time_provider.now().with_timezone(offset)
}
