//! The per-playlist eligibility verdict: playability gate first, then the
//! policy strategy. Evaluation never mutates state, so a candidate scan
//! can call it as often as it likes; `mark_played` is the one explicit
//! mutation, made by the caller after an actual play.

use crate::evaluator;
use crate::history::PlayHistoryEntry;
use crate::policy::PlaylistPolicy;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Mutable per-playlist scheduling state, owned by the playlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRuntimeState {
    /// Epoch seconds of the last play; 0 = never played.
    #[serde(default)]
    pub last_played_at: i64,
}

impl PlaylistRuntimeState {
    pub fn new() -> Self {
        PlaylistRuntimeState { last_played_at: 0 }
    }

    pub fn has_played(&self) -> bool {
        self.last_played_at != 0
    }

    /// Record an actual play. Called by the selector once per play event,
    /// never during evaluation.
    pub fn mark_played(&mut self, now_ts: i64) {
        self.last_played_at = now_ts;
    }
}

/// Whether the playlist may supply the next automatically-scheduled
/// track at `now`.
///
/// The static gate (enabled, content, no externally-driven flags) is
/// checked first and short-circuits without evaluating any timing; the
/// policy strategy's verdict is returned unchanged otherwise.
pub fn is_eligible_now<Tz: TimeZone>(
    policy: &PlaylistPolicy,
    runtime: &PlaylistRuntimeState,
    playlist_id: u32,
    now: &DateTime<Tz>,
    history: &[PlayHistoryEntry],
) -> bool {
    if !policy.is_playable() {
        return false;
    }
    evaluator::should_play_now(policy, playlist_id, runtime.last_played_at, now, history)
}
