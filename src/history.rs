use serde::{Deserialize, Serialize};

/// One entry of a station's recent play log, most-recent-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayHistoryEntry {
    /// Playlist the played track came from.
    pub playlist_id: u32,
    /// When the play happened (epoch seconds).
    pub timestamp: i64,
}

/// Whether a playlist's last play falls inside the cooldown window.
///
/// `last_played_at == 0` means "never played" and is always outside the
/// window. The boundary is exclusive: a play exactly `minutes` ago no
/// longer counts, and `minutes == 0` never suppresses a past play.
pub fn played_within_last_minutes(last_played_at: i64, now_ts: i64, minutes: i64) -> bool {
    if last_played_at == 0 {
        return false;
    }
    last_played_at > now_ts - minutes * 60
}

/// Whether `playlist_id` appears among the first `depth` entries of the
/// play log (already ordered most-recent-first by the caller).
///
/// An empty log reports `true` for any playlist: with no history to
/// consult, every playlist is presumed recently played, so a fresh
/// station does not flood the air with a single playlist.
pub fn played_in_recent_history(
    history: &[PlayHistoryEntry],
    playlist_id: u32,
    depth: usize,
) -> bool {
    if history.is_empty() {
        return true;
    }
    history
        .iter()
        .take(depth)
        .any(|entry| entry.playlist_id == playlist_id)
}
