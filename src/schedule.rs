use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::Error;

/// Computes the next run time for a cron expression, evaluated at `max(last_run, now)`.
/// Scheduled runs that were missed are never backfilled — only the next future tick
/// is returned.
pub fn next_run_time(
    expression: &str,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, Error> {
    let schedule = Schedule::from_str(expression).map_err(|source| Error::SchedParse {
        schedule: expression.to_string(),
        source,
    })?;

    let after = last_run.map(|t| t.max(now)).unwrap_or(now);

    schedule
        .after(&after)
        .next()
        .ok_or_else(|| Error::Other(format!("cron expression '{expression}' has no future occurrence")))
}

/// Minimum requeue delay the reconciler ever schedules, so that a `nextRunTime` in the
/// very near past/present does not busy-loop the controller.
pub const MIN_REQUEUE: std::time::Duration = std::time::Duration::from_secs(1);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_run_time_hourly() {
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 15, 0).unwrap();
        let next = next_run_time("0 0 * * * *", None, now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 7, 28, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_time_uses_last_run_when_later_than_now() {
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 15, 0).unwrap();
        let last_run = Utc.with_ymd_and_hms(2026, 7, 28, 23, 0, 0).unwrap();
        let next = next_run_time("0 0 * * * *", Some(last_run), now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 7, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_malformed_expression_errors() {
        let now = Utc::now();
        let result = next_run_time("not a cron expression", None, now);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_catch_up_means_single_next_tick() {
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 15, 0).unwrap();
        let stale_last_run = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let next = next_run_time("0 0 * * * *", Some(stale_last_run), now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 7, 28, 11, 0, 0).unwrap());
    }
}
