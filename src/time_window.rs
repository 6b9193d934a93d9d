use crate::policy::{PlaylistPolicy, PolicyType};
use chrono::{DateTime, TimeZone, Timelike};

/// Seconds in a civil day, used when an overnight range wraps midnight.
const SECS_PER_DAY: i64 = 86_400;

/// Resolve an integer time code (`HH * 100 + MM`) onto the civil date of
/// `reference`, in `reference`'s timezone.
///
/// Splitting the code numerically is equivalent to zero-padding it to four
/// digits first: 930 reads as 09:30, 5 as 00:05. There is no error path —
/// out-of-range components are clamped and a reference that cannot carry
/// the resolved time (DST gaps) falls back to the reference itself.
pub fn resolve<Tz: TimeZone>(time_code: u32, reference: &DateTime<Tz>) -> DateTime<Tz> {
    let hour = (time_code / 100).min(23);
    let minute = (time_code % 100).min(59);

    reference
        .with_hour(hour)
        .and_then(|t| t.with_minute(minute))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| reference.clone())
}

/// The time code for a given instant (`HH * 100 + MM`).
pub fn timecode_of<Tz: TimeZone>(instant: &DateTime<Tz>) -> u32 {
    instant.hour() * 100 + instant.minute()
}

/// Parse a time code from user input: either "HH:MM" or a bare numeric
/// code like "930" / "2200".
pub fn parse_timecode(s: &str) -> Result<u32, String> {
    let (hour, minute) = match s.split_once(':') {
        Some((h, m)) => (
            h.parse::<u32>().map_err(|_| bad_timecode(s))?,
            m.parse::<u32>().map_err(|_| bad_timecode(s))?,
        ),
        None => {
            let code = s.parse::<u32>().map_err(|_| bad_timecode(s))?;
            (code / 100, code % 100)
        }
    };
    if hour > 23 || minute > 59 {
        return Err(bad_timecode(s));
    }
    Ok(hour * 100 + minute)
}

fn bad_timecode(s: &str) -> String {
    format!("Invalid time '{}'. Expected HH:MM or a HHMM code", s)
}

/// Length of a playlist's scheduled block in seconds, measured on the
/// civil date of `reference`. Zero for anything but a Scheduled policy.
/// An overnight range (end before start) wraps across midnight.
pub fn schedule_duration<Tz: TimeZone>(policy: &PlaylistPolicy, reference: &DateTime<Tz>) -> i64 {
    if policy.policy_type != PolicyType::Scheduled {
        return 0;
    }

    let start = resolve(policy.schedule_start_time, reference).timestamp();
    let end = resolve(policy.schedule_end_time, reference).timestamp();

    if start > end {
        SECS_PER_DAY - (start - end)
    } else {
        end - start
    }
}
