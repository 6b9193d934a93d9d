//! Per-policy "should this playlist play right now" strategies.
//!
//! Every function here is a pure function of the supplied policy, runtime
//! timestamp, clock instant, and play history — no hidden clock, no state
//! mutation. Adding a policy means adding a `PolicyType` variant and its
//! strategy below; the dispatcher is a closed match.

use crate::history::{PlayHistoryEntry, played_in_recent_history, played_within_last_minutes};
use crate::policy::{PlaybackFlag, PlaylistPolicy, PolicyType};
use crate::time_window;
use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike};

/// Minutes after a target instant during which a once-style trigger
/// still fires.
const TRIGGER_WINDOW_MINUTES: i64 = 15;

/// Anti-repeat window for once-per-hour playlists.
const PER_HOUR_COOLDOWN_MINUTES: i64 = 30;

/// Anti-repeat window for play-once and single-track scheduled playlists.
const SCHEDULED_COOLDOWN_MINUTES: i64 = 720;

/// Dispatch to the strategy matching the playlist's policy type and
/// return its verdict.
pub fn should_play_now<Tz: TimeZone>(
    policy: &PlaylistPolicy,
    playlist_id: u32,
    last_played_at: i64,
    now: &DateTime<Tz>,
    history: &[PlayHistoryEntry],
) -> bool {
    match policy.policy_type {
        PolicyType::Default => true,
        // Advanced playlists are driven externally, never by us.
        PolicyType::Advanced => false,
        PolicyType::OncePerXSongs => {
            !played_in_recent_history(history, playlist_id, policy.play_per_songs as usize)
        }
        PolicyType::OncePerXMinutes => {
            !played_within_last_minutes(last_played_at, now.timestamp(), policy.play_per_minutes)
        }
        PolicyType::OncePerHour => should_play_per_hour(policy, last_played_at, now),
        PolicyType::Scheduled => {
            // Equal start and end times mean a "play once" playlist,
            // not a zero-length window.
            if policy.schedule_start_time == policy.schedule_end_time {
                should_play_once(policy, last_played_at, now)
            } else {
                should_play_scheduled(policy, last_played_at, now)
            }
        }
    }
}

/// Once-per-hour: fire within a short window after the most recent
/// occurrence of the target minute, with a 30-minute anti-repeat.
fn should_play_per_hour<Tz: TimeZone>(
    policy: &PlaylistPolicy,
    last_played_at: i64,
    now: &DateTime<Tz>,
) -> bool {
    let target_minute = policy.play_per_hour_minute();

    // Most recent occurrence of the target minute at or before now.
    let target = match now.with_minute(target_minute) {
        Some(t) => t,
        None => return false,
    };
    let target = if now.minute() < target_minute {
        target - Duration::hours(1)
    } else {
        target
    };

    let diff_minutes = now.clone().signed_duration_since(target).num_minutes();
    if diff_minutes < 0 || diff_minutes > TRIGGER_WINDOW_MINUTES {
        return false;
    }

    !played_within_last_minutes(last_played_at, now.timestamp(), PER_HOUR_COOLDOWN_MINUTES)
}

/// Scheduled range (start != end): inside the window, on an allowed day.
fn should_play_scheduled<Tz: TimeZone>(
    policy: &PlaylistPolicy,
    last_played_at: i64,
    now: &DateTime<Tz>,
) -> bool {
    let mut day_to_check = now.weekday().number_from_monday() as u8;
    let current_timecode = time_window::timecode_of(now);

    let start = policy.schedule_start_time;
    let mut end = policy.schedule_end_time;

    // An end code of 0 means the window runs to the end of the day.
    if end == 0 {
        end = 2400;
    }

    if end < start {
        // Overnight window stretching into the next day.
        if current_timecode <= end {
            // Before the end time: this is the tail of a window that
            // started yesterday, so the day check rolls back (1 -> 7).
            day_to_check = if day_to_check == 1 { 7 } else { day_to_check - 1 };
        } else if current_timecode < start {
            // After the tail but before today's start.
            return false;
        }
    } else if current_timecode < start || current_timecode > end {
        return false;
    }

    if !policy.is_scheduled_for_day(day_to_check) {
        return false;
    }

    if policy.has_flag(PlaybackFlag::SingleTrack) {
        !played_within_last_minutes(last_played_at, now.timestamp(), SCHEDULED_COOLDOWN_MINUTES)
    } else {
        true
    }
}

/// Play-once playlist (start == end): fire within a short window after
/// the start time, at most once per 12 hours.
fn should_play_once<Tz: TimeZone>(
    policy: &PlaylistPolicy,
    last_played_at: i64,
    now: &DateTime<Tz>,
) -> bool {
    if !policy.is_scheduled_for_day(now.weekday().number_from_monday() as u8) {
        return false;
    }

    // Raw time-code subtraction, not elapsed minutes: 0905 - 0850 = 55,
    // so a start minute late in the hour only matches within the same
    // HH block. Kept as-is; see the tests documenting this.
    let current_timecode = time_window::timecode_of(now) as i64;
    let diff = current_timecode - policy.schedule_start_time as i64;
    if diff < 0 || diff > TRIGGER_WINDOW_MINUTES {
        return false;
    }

    !played_within_last_minutes(last_played_at, now.timestamp(), SCHEDULED_COOLDOWN_MINUTES)
}
