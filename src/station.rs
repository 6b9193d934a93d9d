//! Station state: the automation-loop side that owns playlists, feeds the
//! scheduling engine its inputs, and records play events back.

use crate::engine::{self, PlaylistRuntimeState};
use crate::history::PlayHistoryEntry;
use crate::policy::PlaylistPolicy;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const STATE_FILE: &str = "airshift_state.json";

/// Most-recent-first play log entries kept per station. Large enough to
/// cover any reasonable `play_per_songs` lookback.
pub const PLAY_LOG_LIMIT: usize = 50;

/// A playlist as the station sees it: scheduling policy, runtime state,
/// and just enough source information to keep the content gate honest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationPlaylist {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub policy: PlaylistPolicy,
    #[serde(default)]
    pub runtime: PlaylistRuntimeState,
    /// Track names/paths for song-sourced playlists.
    #[serde(default)]
    pub tracks: Vec<String>,
    /// Remote-URL source: always counts as having playable content.
    #[serde(default)]
    pub remote: bool,
}

impl StationPlaylist {
    pub fn new(id: u32, name: String) -> Self {
        StationPlaylist {
            id,
            name,
            policy: PlaylistPolicy::new(),
            runtime: PlaylistRuntimeState::new(),
            tracks: Vec::new(),
            remote: false,
        }
    }

    /// Append a track and refresh the content gate.
    pub fn add_track(&mut self, track: String) {
        self.tracks.push(track);
        self.refresh_content();
    }

    /// Remove a track by index (0-based). Returns the removed track.
    pub fn remove_track(&mut self, index: usize) -> Result<String, String> {
        if index >= self.tracks.len() {
            return Err(format!(
                "Index {} out of range (playlist has {} tracks)",
                index,
                self.tracks.len()
            ));
        }
        let track = self.tracks.remove(index);
        self.refresh_content();
        Ok(track)
    }

    /// Mark the playlist as remote-URL sourced (or back to song-sourced).
    pub fn set_remote(&mut self, remote: bool) {
        self.remote = remote;
        self.refresh_content();
    }

    /// Keep `policy.has_playable_content` in sync with the source:
    /// remote sources always have content, song sources need tracks.
    fn refresh_content(&mut self) {
        self.policy.has_playable_content = self.remote || !self.tracks.is_empty();
    }

    /// Eligibility verdict for this playlist at `now` against the given
    /// play log.
    pub fn is_eligible_at<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        history: &[PlayHistoryEntry],
    ) -> bool {
        engine::is_eligible_now(&self.policy, &self.runtime, self.id, now, history)
    }
}

/// The station: named playlists plus the shared recent play log.
#[derive(Debug, Serialize, Deserialize)]
pub struct Station {
    pub playlists: Vec<StationPlaylist>,
    /// Most-recent-first, bounded at `PLAY_LOG_LIMIT`.
    #[serde(default)]
    pub play_log: Vec<PlayHistoryEntry>,
    next_id: u32,
}

impl Station {
    pub fn new() -> Self {
        Station {
            playlists: Vec::new(),
            play_log: Vec::new(),
            next_id: 1,
        }
    }

    /// Load station state from the default JSON state file, or create a
    /// fresh instance if not found.
    pub fn load() -> Self {
        Self::load_from(Path::new(STATE_FILE))
    }

    /// Load station state from a specific path.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(station) => return station,
                    Err(e) => eprintln!("[Station] Corrupt state file, starting fresh: {}", e),
                },
                Err(e) => eprintln!("[Station] Could not read state file: {}", e),
            }
        }
        Station::new()
    }

    /// Persist current state to the default JSON state file.
    pub fn save(&self) -> Result<(), String> {
        self.save_to(Path::new(STATE_FILE))
    }

    /// Persist current state to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Write error: {}", e))?;
        Ok(())
    }

    /// Create a new playlist. Names are unique case-insensitively.
    /// Returns the assigned ID.
    pub fn create_playlist(&mut self, name: String) -> Result<u32, String> {
        if self.find_playlist(&name).is_some() {
            return Err(format!("Playlist '{}' already exists", name));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.playlists.push(StationPlaylist::new(id, name));
        Ok(id)
    }

    /// Remove a playlist by name. Returns the removed playlist.
    pub fn remove_playlist(&mut self, name: &str) -> Result<StationPlaylist, String> {
        let pos = self
            .playlists
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Playlist '{}' not found", name))?;
        Ok(self.playlists.remove(pos))
    }

    /// Find a playlist by name (case-insensitive).
    pub fn find_playlist(&self, name: &str) -> Option<&StationPlaylist> {
        self.playlists
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Find a playlist by name (case-insensitive), mutable.
    pub fn find_playlist_mut(&mut self, name: &str) -> Option<&mut StationPlaylist> {
        self.playlists
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Record an actual play event: stamp the playlist's runtime state
    /// and push the event onto the front of the play log.
    pub fn record_play<Tz: TimeZone>(&mut self, name: &str, now: &DateTime<Tz>) -> Result<(), String> {
        let now_ts = now.timestamp();
        let playlist = self
            .find_playlist_mut(name)
            .ok_or_else(|| format!("Playlist '{}' not found", name))?;
        playlist.runtime.mark_played(now_ts);
        let entry = PlayHistoryEntry {
            playlist_id: playlist.id,
            timestamp: now_ts,
        };
        self.play_log.insert(0, entry);
        self.play_log.truncate(PLAY_LOG_LIMIT);
        Ok(())
    }

    /// One scheduling sweep: every playlist whose verdict at `now` is
    /// eligible, in configuration order. Selection among them is the
    /// caller's business.
    pub fn eligible_playlists<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&StationPlaylist> {
        self.playlists
            .iter()
            .filter(|p| p.is_eligible_at(now, &self.play_log))
            .collect()
    }
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_playlist_assigns_unique_ids() {
        let mut station = Station::new();
        let id1 = station.create_playlist("A".to_string()).unwrap();
        let id2 = station.create_playlist("B".to_string()).unwrap();
        assert_ne!(id1, id2);
        assert_eq!(station.playlists.len(), 2);
    }

    #[test]
    fn create_playlist_rejects_duplicate_names() {
        let mut station = Station::new();
        station.create_playlist("Main".to_string()).unwrap();
        assert!(station.create_playlist("main".to_string()).is_err());
    }

    #[test]
    fn find_playlist_case_insensitive() {
        let mut station = Station::new();
        station.create_playlist("Main".to_string()).unwrap();
        assert!(station.find_playlist("MAIN").is_some());
        assert!(station.find_playlist("nope").is_none());
    }

    #[test]
    fn remove_playlist_not_found_errors() {
        let mut station = Station::new();
        assert!(station.remove_playlist("ghost").is_err());
    }

    #[test]
    fn tracks_drive_content_gate() {
        let mut playlist = StationPlaylist::new(1, "Main".into());
        assert!(!playlist.policy.has_playable_content);

        playlist.add_track("song.mp3".into());
        assert!(playlist.policy.has_playable_content);

        playlist.remove_track(0).unwrap();
        assert!(!playlist.policy.has_playable_content);
    }

    #[test]
    fn remote_source_always_has_content() {
        let mut playlist = StationPlaylist::new(1, "Stream".into());
        playlist.set_remote(true);
        assert!(playlist.policy.has_playable_content);
        assert!(playlist.tracks.is_empty());

        playlist.set_remote(false);
        assert!(!playlist.policy.has_playable_content);
    }

    #[test]
    fn remove_track_out_of_range_errors() {
        let mut playlist = StationPlaylist::new(1, "Main".into());
        assert!(playlist.remove_track(0).is_err());
    }

    #[test]
    fn record_play_stamps_runtime_and_log() {
        let mut station = Station::new();
        station.create_playlist("Main".to_string()).unwrap();
        let now = noon();
        station.record_play("Main", &now).unwrap();

        let playlist = station.find_playlist("Main").unwrap();
        assert_eq!(playlist.runtime.last_played_at, now.timestamp());
        assert_eq!(station.play_log.len(), 1);
        assert_eq!(station.play_log[0].playlist_id, playlist.id);
    }

    #[test]
    fn record_play_unknown_playlist_errors() {
        let mut station = Station::new();
        assert!(station.record_play("ghost", &noon()).is_err());
    }

    #[test]
    fn play_log_is_most_recent_first_and_bounded() {
        let mut station = Station::new();
        station.create_playlist("A".to_string()).unwrap();
        station.create_playlist("B".to_string()).unwrap();

        let now = noon();
        for i in 0..(PLAY_LOG_LIMIT + 10) {
            let name = if i % 2 == 0 { "A" } else { "B" };
            station.record_play(name, &now).unwrap();
        }

        assert_eq!(station.play_log.len(), PLAY_LOG_LIMIT);
        // Last recorded play is at the front.
        let last_name = if (PLAY_LOG_LIMIT + 9) % 2 == 0 { "A" } else { "B" };
        let last_id = station.find_playlist(last_name).unwrap().id;
        assert_eq!(station.play_log[0].playlist_id, last_id);
    }

    #[test]
    fn eligible_playlists_filters_by_verdict() {
        let mut station = Station::new();
        station.create_playlist("On".to_string()).unwrap();
        station.create_playlist("Off".to_string()).unwrap();
        station.find_playlist_mut("On").unwrap().add_track("a.mp3".into());
        station.find_playlist_mut("Off").unwrap().add_track("b.mp3".into());
        station.find_playlist_mut("Off").unwrap().policy.is_enabled = false;

        let eligible = station.eligible_playlists(&noon());
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].name, "On");
    }

    #[test]
    fn station_serialization_roundtrip() {
        let mut station = Station::new();
        station.create_playlist("Main".to_string()).unwrap();
        station.find_playlist_mut("Main").unwrap().add_track("a.mp3".into());
        station.record_play("Main", &noon()).unwrap();

        let json = serde_json::to_string(&station).unwrap();
        let loaded: Station = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.playlists.len(), 1);
        assert_eq!(loaded.play_log.len(), 1);
        let playlist = loaded.find_playlist("Main").unwrap();
        assert!(playlist.runtime.has_played());
        assert!(playlist.policy.has_playable_content);
    }

    #[test]
    fn ids_stay_unique_after_roundtrip() {
        let mut station = Station::new();
        station.create_playlist("A".to_string()).unwrap();
        let json = serde_json::to_string(&station).unwrap();
        let mut loaded: Station = serde_json::from_str(&json).unwrap();
        let id = loaded.create_playlist("B".to_string()).unwrap();
        assert_ne!(id, loaded.find_playlist("A").unwrap().id);
    }
}
