use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight reported for playlists whose configured weight is below 1.
pub const DEFAULT_WEIGHT: u32 = 3;

/// Scheduling strategy a playlist is configured with. Exactly one is
/// active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    /// Always a candidate.
    Default,
    /// Plays inside a start/end time window on selected weekdays.
    /// Equal start and end times mean "play once" near the start time.
    Scheduled,
    /// Plays once every N songs.
    OncePerXSongs,
    /// Plays once every N minutes.
    OncePerXMinutes,
    /// Plays once per hour, near a target minute.
    OncePerHour,
    /// Driven entirely by an external/manual controller; never picked
    /// up by the automatic scheduler.
    Advanced,
}

impl Default for PolicyType {
    fn default() -> Self {
        PolicyType::Default
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyType::Default => write!(f, "default"),
            PolicyType::Scheduled => write!(f, "scheduled"),
            PolicyType::OncePerXSongs => write!(f, "once-per-x-songs"),
            PolicyType::OncePerXMinutes => write!(f, "once-per-x-minutes"),
            PolicyType::OncePerHour => write!(f, "once-per-hour"),
            PolicyType::Advanced => write!(f, "advanced"),
        }
    }
}

impl PolicyType {
    /// Parse a policy type from a string (case-insensitive, accepts
    /// hyphens or underscores; "custom" is an alias for advanced).
    pub fn from_str_loose(s: &str) -> Result<Self, String> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "default" => Ok(PolicyType::Default),
            "scheduled" => Ok(PolicyType::Scheduled),
            "once-per-x-songs" | "per-songs" => Ok(PolicyType::OncePerXSongs),
            "once-per-x-minutes" | "per-minutes" => Ok(PolicyType::OncePerXMinutes),
            "once-per-hour" | "per-hour" => Ok(PolicyType::OncePerHour),
            "advanced" | "custom" => Ok(PolicyType::Advanced),
            _ => Err(format!(
                "Unknown policy type '{}'. Expected: default, scheduled, once-per-x-songs, \
                 once-per-x-minutes, once-per-hour, advanced",
                s
            )),
        }
    }
}

/// Playback-mode flags, independently togglable (not an enum of states).
///
/// Interrupt, LoopOnce and Merge mark a playlist as externally/manually
/// driven — the automatic scheduler never picks it up while any of them
/// is set. SingleTrack tightens the anti-repeat window of scheduled
/// playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackFlag {
    Interrupt,
    LoopOnce,
    SingleTrack,
    Merge,
}

impl fmt::Display for PlaybackFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackFlag::Interrupt => write!(f, "interrupt"),
            PlaybackFlag::LoopOnce => write!(f, "loop-once"),
            PlaybackFlag::SingleTrack => write!(f, "single-track"),
            PlaybackFlag::Merge => write!(f, "merge"),
        }
    }
}

impl PlaybackFlag {
    /// Parse a flag from a string (case-insensitive, hyphens or underscores).
    pub fn from_str_loose(s: &str) -> Result<Self, String> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "interrupt" => Ok(PlaybackFlag::Interrupt),
            "loop-once" => Ok(PlaybackFlag::LoopOnce),
            "single-track" => Ok(PlaybackFlag::SingleTrack),
            "merge" => Ok(PlaybackFlag::Merge),
            _ => Err(format!(
                "Unknown playback flag '{}'. Expected: interrupt, loop-once, single-track, merge",
                s
            )),
        }
    }
}

/// Scheduling configuration attached to a playlist. Immutable during an
/// evaluation; all mutation happens on the configuration write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistPolicy {
    #[serde(default)]
    pub policy_type: PolicyType,
    /// Lookback depth in the song history (OncePerXSongs).
    #[serde(default)]
    pub play_per_songs: u32,
    /// Cooldown window in minutes (OncePerXMinutes).
    #[serde(default)]
    pub play_per_minutes: i64,
    /// Target minute-of-hour (OncePerHour). Kept in [0, 59] by the setter.
    #[serde(default)]
    play_per_hour_minute: u32,
    /// Window start as an HHMM time code (Scheduled).
    #[serde(default)]
    pub schedule_start_time: u32,
    /// Window end as an HHMM time code (Scheduled). 0 means end-of-day
    /// when the window is a range; equal to start means "play once".
    #[serde(default)]
    pub schedule_end_time: u32,
    /// ISO weekdays (1=Mon..7=Sun) the schedule applies to. Empty = every day.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule_days: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub playback_flags: Vec<PlaybackFlag>,
    /// Master switch; a disabled playlist is never a candidate.
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Whether the playlist's source has anything to play. Maintained by
    /// the owning station: song-sourced playlists need at least one
    /// track, remote-URL sources always count as non-empty.
    #[serde(default)]
    pub has_playable_content: bool,
    /// Relative selection weight, consumed by the external selector.
    #[serde(default)]
    weight: u32,
}

fn default_true() -> bool {
    true
}

impl PlaylistPolicy {
    pub fn new() -> Self {
        PlaylistPolicy {
            policy_type: PolicyType::Default,
            play_per_songs: 0,
            play_per_minutes: 0,
            play_per_hour_minute: 0,
            schedule_start_time: 0,
            schedule_end_time: 0,
            schedule_days: Vec::new(),
            playback_flags: Vec::new(),
            is_enabled: true,
            has_playable_content: false,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Target minute-of-hour for OncePerHour playlists.
    pub fn play_per_hour_minute(&self) -> u32 {
        self.play_per_hour_minute
    }

    /// Set the target minute-of-hour. Out-of-range values reset to 0 —
    /// downstream evaluation may rely on the field staying in [0, 59].
    pub fn set_play_per_hour_minute(&mut self, minute: u32) {
        self.play_per_hour_minute = if minute > 59 { 0 } else { minute };
    }

    /// Selection weight, substituting the default for anything below 1.
    pub fn weight(&self) -> u32 {
        if self.weight < 1 {
            DEFAULT_WEIGHT
        } else {
            self.weight
        }
    }

    pub fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    pub fn has_flag(&self, flag: PlaybackFlag) -> bool {
        self.playback_flags.contains(&flag)
    }

    /// Add or remove a playback flag. Adding twice keeps a single copy.
    pub fn set_flag(&mut self, flag: PlaybackFlag, on: bool) {
        if on {
            if !self.playback_flags.contains(&flag) {
                self.playback_flags.push(flag);
            }
        } else {
            self.playback_flags.retain(|f| *f != flag);
        }
    }

    /// Whether the schedule covers the given ISO weekday (1=Mon..7=Sun).
    /// An empty day set covers every day.
    pub fn is_scheduled_for_day(&self, day: u8) -> bool {
        self.schedule_days.is_empty() || self.schedule_days.contains(&day)
    }

    /// Static playability gate, independent of time and history: is this
    /// playlist a candidate for the automatic scheduler at all.
    ///
    /// Requires the master switch on, playable content, and none of the
    /// externally-driven flags (interrupt, merge, loop-once). SingleTrack
    /// does not gate — it only tightens scheduled anti-repeat.
    pub fn is_playable(&self) -> bool {
        self.is_enabled
            && self.has_playable_content
            && !self.has_flag(PlaybackFlag::Interrupt)
            && !self.has_flag(PlaybackFlag::Merge)
            && !self.has_flag(PlaybackFlag::LoopOnce)
    }

    /// Format the day set for display.
    pub fn days_display(&self) -> String {
        if self.schedule_days.is_empty() {
            return "daily".to_string();
        }
        let names = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        self.schedule_days
            .iter()
            .filter_map(|&d| names.get(d as usize - 1))
            .copied()
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for PlaylistPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playable_policy() -> PlaylistPolicy {
        let mut policy = PlaylistPolicy::new();
        policy.has_playable_content = true;
        policy
    }

    // --- PolicyType / PlaybackFlag parsing ---

    #[test]
    fn policy_type_from_str() {
        assert_eq!(PolicyType::from_str_loose("default").unwrap(), PolicyType::Default);
        assert_eq!(
            PolicyType::from_str_loose("once_per_x_songs").unwrap(),
            PolicyType::OncePerXSongs
        );
        assert_eq!(
            PolicyType::from_str_loose("Per-Minutes").unwrap(),
            PolicyType::OncePerXMinutes
        );
        assert_eq!(PolicyType::from_str_loose("custom").unwrap(), PolicyType::Advanced);
        assert!(PolicyType::from_str_loose("bogus").is_err());
    }

    #[test]
    fn policy_type_display() {
        assert_eq!(format!("{}", PolicyType::OncePerHour), "once-per-hour");
        assert_eq!(format!("{}", PolicyType::Advanced), "advanced");
    }

    #[test]
    fn playback_flag_from_str() {
        assert_eq!(
            PlaybackFlag::from_str_loose("single_track").unwrap(),
            PlaybackFlag::SingleTrack
        );
        assert_eq!(
            PlaybackFlag::from_str_loose("LOOP-ONCE").unwrap(),
            PlaybackFlag::LoopOnce
        );
        assert!(PlaybackFlag::from_str_loose("shuffle").is_err());
    }

    // --- Field behavior ---

    #[test]
    fn hour_minute_in_range_is_kept() {
        let mut policy = PlaylistPolicy::new();
        policy.set_play_per_hour_minute(45);
        assert_eq!(policy.play_per_hour_minute(), 45);
        policy.set_play_per_hour_minute(0);
        assert_eq!(policy.play_per_hour_minute(), 0);
        policy.set_play_per_hour_minute(59);
        assert_eq!(policy.play_per_hour_minute(), 59);
    }

    #[test]
    fn hour_minute_out_of_range_resets_to_zero() {
        let mut policy = PlaylistPolicy::new();
        policy.set_play_per_hour_minute(45);
        policy.set_play_per_hour_minute(60);
        assert_eq!(policy.play_per_hour_minute(), 0);
    }

    #[test]
    fn weight_floors_at_default() {
        let mut policy = PlaylistPolicy::new();
        assert_eq!(policy.weight(), DEFAULT_WEIGHT);
        policy.set_weight(0);
        assert_eq!(policy.weight(), DEFAULT_WEIGHT);
        policy.set_weight(8);
        assert_eq!(policy.weight(), 8);
    }

    #[test]
    fn flags_toggle_without_duplicates() {
        let mut policy = PlaylistPolicy::new();
        policy.set_flag(PlaybackFlag::Merge, true);
        policy.set_flag(PlaybackFlag::Merge, true);
        assert_eq!(policy.playback_flags.len(), 1);
        assert!(policy.has_flag(PlaybackFlag::Merge));
        policy.set_flag(PlaybackFlag::Merge, false);
        assert!(!policy.has_flag(PlaybackFlag::Merge));
    }

    #[test]
    fn day_set_empty_means_every_day() {
        let policy = PlaylistPolicy::new();
        for day in 1..=7 {
            assert!(policy.is_scheduled_for_day(day));
        }
    }

    #[test]
    fn day_set_filters_membership() {
        let mut policy = PlaylistPolicy::new();
        policy.schedule_days = vec![1, 3, 5];
        assert!(policy.is_scheduled_for_day(1));
        assert!(policy.is_scheduled_for_day(5));
        assert!(!policy.is_scheduled_for_day(2));
        assert!(!policy.is_scheduled_for_day(7));
    }

    #[test]
    fn days_display_names() {
        let mut policy = PlaylistPolicy::new();
        assert_eq!(policy.days_display(), "daily");
        policy.schedule_days = vec![1, 5, 7];
        assert_eq!(policy.days_display(), "Mon,Fri,Sun");
    }

    // --- Playability gate ---

    #[test]
    fn gate_passes_enabled_with_content() {
        assert!(playable_policy().is_playable());
    }

    #[test]
    fn gate_rejects_disabled() {
        let mut policy = playable_policy();
        policy.is_enabled = false;
        assert!(!policy.is_playable());
    }

    #[test]
    fn gate_rejects_empty_content() {
        let policy = PlaylistPolicy::new();
        assert!(!policy.is_playable());
    }

    #[test]
    fn gate_rejects_externally_driven_flags() {
        for flag in [PlaybackFlag::Interrupt, PlaybackFlag::Merge, PlaybackFlag::LoopOnce] {
            let mut policy = playable_policy();
            policy.set_flag(flag, true);
            assert!(!policy.is_playable(), "{} should veto the gate", flag);
        }
    }

    #[test]
    fn gate_allows_single_track_flag() {
        let mut policy = playable_policy();
        policy.set_flag(PlaybackFlag::SingleTrack, true);
        assert!(policy.is_playable());
    }

    // --- Serialization ---

    #[test]
    fn policy_serialization_roundtrip() {
        let mut policy = playable_policy();
        policy.policy_type = PolicyType::Scheduled;
        policy.schedule_start_time = 2300;
        policy.schedule_end_time = 100;
        policy.schedule_days = vec![6, 7];
        policy.set_flag(PlaybackFlag::SingleTrack, true);
        policy.set_weight(5);

        let json = serde_json::to_string(&policy).unwrap();
        let loaded: PlaylistPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.policy_type, PolicyType::Scheduled);
        assert_eq!(loaded.schedule_start_time, 2300);
        assert_eq!(loaded.schedule_end_time, 100);
        assert_eq!(loaded.schedule_days, vec![6, 7]);
        assert!(loaded.has_flag(PlaybackFlag::SingleTrack));
        assert_eq!(loaded.weight(), 5);
    }

    #[test]
    fn policy_defaults_when_missing_from_json() {
        // Simulate loading a minimal older record
        let json = r#"{}"#;
        let policy: PlaylistPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.policy_type, PolicyType::Default);
        assert!(policy.is_enabled);
        assert!(!policy.has_playable_content);
        assert!(policy.playback_flags.is_empty());
        assert!(policy.schedule_days.is_empty());
    }
}
