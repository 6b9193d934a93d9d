use airshift::policy::{PlaybackFlag, PolicyType};
use airshift::station::Station;
use airshift::time_window;
use chrono::{DateTime, Local, NaiveDateTime};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "airshift", about = "Playlist scheduling engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show station status
    Status,
    /// Playlist management
    Playlist {
        #[command(subcommand)]
        action: PlaylistCmd,
    },
    /// Scheduling policy configuration
    Policy {
        #[command(subcommand)]
        action: PolicyCmd,
    },
    /// List playlists eligible for automatic scheduling right now
    Eligible {
        /// Evaluate at this local time instead of now (YYYY-MM-DD HH:MM)
        #[arg(long)]
        at: Option<String>,
    },
    /// Record that a track from a playlist was just played
    Played {
        /// Playlist name
        name: String,
        /// Record at this local time instead of now (YYYY-MM-DD HH:MM)
        #[arg(long)]
        at: Option<String>,
    },
}

#[derive(Subcommand)]
enum PlaylistCmd {
    /// Create a new playlist
    Create { name: String },
    /// List all playlists
    List,
    /// Show a playlist's tracks and policy
    Show { name: String },
    /// Remove a playlist
    Remove { name: String },
    /// Add track(s) to a playlist
    AddTrack {
        /// Playlist name
        name: String,
        /// Track path(s)
        #[arg(required = true)]
        tracks: Vec<String>,
    },
    /// Mark a playlist as remote-URL sourced (always has content)
    SetRemote {
        /// Playlist name
        name: String,
        /// Revert to song-sourced
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
enum PolicyCmd {
    /// Set the scheduling policy type
    SetType {
        /// Playlist name
        name: String,
        /// default, scheduled, once-per-x-songs, once-per-x-minutes,
        /// once-per-hour, advanced
        policy_type: String,
    },
    /// Set the song-history lookback depth (once-per-x-songs)
    PerSongs {
        /// Playlist name
        name: String,
        /// Number of recent history entries to check
        count: u32,
    },
    /// Set the cooldown window in minutes (once-per-x-minutes)
    PerMinutes {
        /// Playlist name
        name: String,
        /// Cooldown in minutes
        minutes: u32,
    },
    /// Set the target minute-of-hour (once-per-hour)
    HourMinute {
        /// Playlist name
        name: String,
        /// Minute of the hour, 0-59 (out of range resets to 0)
        minute: u32,
    },
    /// Set the scheduled time window (equal start/end = play once)
    Window {
        /// Playlist name
        name: String,
        /// Start time (HH:MM or HHMM)
        start: String,
        /// End time (HH:MM or HHMM); 0 or 00:00 means end-of-day
        end: String,
    },
    /// Restrict the schedule to certain weekdays
    Days {
        /// Playlist name
        name: String,
        /// ISO weekdays 1=Mon..7=Sun, comma-separated. Omit for daily.
        #[arg(short, long)]
        days: Option<String>,
    },
    /// Set a playback flag
    Flag {
        /// Playlist name
        name: String,
        /// interrupt, loop-once, single-track, merge
        flag: String,
    },
    /// Clear a playback flag
    Unflag {
        /// Playlist name
        name: String,
        /// interrupt, loop-once, single-track, merge
        flag: String,
    },
    /// Enable a playlist for automatic scheduling
    Enable { name: String },
    /// Disable a playlist
    Disable { name: String },
}

/// Parse a local evaluation instant, or fall back to the wall clock.
fn resolve_instant(at: Option<&str>) -> Result<DateTime<Local>, String> {
    match at {
        None => Ok(Local::now()),
        Some(s) => {
            let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .map_err(|_| format!("Invalid time '{}'. Expected YYYY-MM-DD HH:MM", s))?;
            naive
                .and_local_timezone(Local)
                .single()
                .ok_or_else(|| format!("Ambiguous or nonexistent local time '{}'", s))
        }
    }
}

fn parse_days(s: &str) -> Result<Vec<u8>, String> {
    s.split(',')
        .map(|part| {
            let day: u8 = part
                .trim()
                .parse()
                .map_err(|_| format!("Invalid day '{}'. Expected 1-7", part))?;
            if (1..=7).contains(&day) {
                Ok(day)
            } else {
                Err(format!("Day {} out of range (1=Mon..7=Sun)", day))
            }
        })
        .collect()
}

fn exit_err(msg: String) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    let mut station = Station::load();

    match cli.command {
        Commands::Status => {
            println!("airshift v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Playlists: {} | Play log: {} entr{}",
                station.playlists.len(),
                station.play_log.len(),
                if station.play_log.len() == 1 { "y" } else { "ies" }
            );
            for playlist in &station.playlists {
                println!(
                    "  [{}] {} — {} | {} | {} track(s){}",
                    playlist.id,
                    playlist.name,
                    playlist.policy.policy_type,
                    if playlist.policy.is_enabled { "enabled" } else { "disabled" },
                    playlist.tracks.len(),
                    if playlist.remote { " | remote" } else { "" }
                );
            }
        }
        Commands::Playlist { action } => {
            if handle_playlist(&mut station, action) {
                if let Err(e) = station.save() {
                    exit_err(e);
                }
            }
        }
        Commands::Policy { action } => {
            handle_policy(&mut station, action);
            if let Err(e) = station.save() {
                exit_err(e);
            }
        }
        Commands::Eligible { at } => {
            let now = match resolve_instant(at.as_deref()) {
                Ok(t) => t,
                Err(e) => exit_err(e),
            };
            let eligible = station.eligible_playlists(&now);
            println!(
                "Eligible at {}: {} of {} playlist(s)",
                now.format("%Y-%m-%d %H:%M"),
                eligible.len(),
                station.playlists.len()
            );
            for playlist in eligible {
                println!(
                    "  [{}] {} — {} (weight {})",
                    playlist.id,
                    playlist.name,
                    playlist.policy.policy_type,
                    playlist.policy.weight()
                );
            }
        }
        Commands::Played { name, at } => {
            let now = match resolve_instant(at.as_deref()) {
                Ok(t) => t,
                Err(e) => exit_err(e),
            };
            if let Err(e) = station.record_play(&name, &now) {
                exit_err(e);
            }
            if let Err(e) = station.save() {
                exit_err(e);
            }
            println!("Recorded play for '{}' at {}", name, now.format("%Y-%m-%d %H:%M"));
        }
    }
}

/// Returns true when station state changed and needs saving.
fn handle_playlist(station: &mut Station, action: PlaylistCmd) -> bool {
    match action {
        PlaylistCmd::Create { name } => match station.create_playlist(name.clone()) {
            Ok(id) => println!("Created playlist '{}' (id {})", name, id),
            Err(e) => exit_err(e),
        },
        PlaylistCmd::List => {
            if station.playlists.is_empty() {
                println!("No playlists.");
            }
            for playlist in &station.playlists {
                println!(
                    "[{}] {} — {} track(s), {}",
                    playlist.id,
                    playlist.name,
                    playlist.tracks.len(),
                    playlist.policy.policy_type
                );
            }
            return false;
        }
        PlaylistCmd::Show { name } => {
            let playlist = match station.find_playlist(&name) {
                Some(p) => p,
                None => exit_err(format!("Playlist '{}' not found", name)),
            };
            let policy = &playlist.policy;
            println!("Playlist '{}' (id {})", playlist.name, playlist.id);
            println!(
                "  Policy: {} | {} | days: {}",
                policy.policy_type,
                if policy.is_enabled { "enabled" } else { "disabled" },
                policy.days_display()
            );
            println!(
                "  per-songs: {} | per-minutes: {} | hour-minute: {} | window: {:04}-{:04}",
                policy.play_per_songs,
                policy.play_per_minutes,
                policy.play_per_hour_minute(),
                policy.schedule_start_time,
                policy.schedule_end_time
            );
            if !policy.playback_flags.is_empty() {
                let flags: Vec<String> =
                    policy.playback_flags.iter().map(|f| f.to_string()).collect();
                println!("  Flags: {}", flags.join(","));
            }
            if playlist.runtime.has_played() {
                println!("  Last played at epoch {}", playlist.runtime.last_played_at);
            }
            for (i, track) in playlist.tracks.iter().enumerate() {
                println!("  {}. {}", i + 1, track);
            }
            return false;
        }
        PlaylistCmd::Remove { name } => match station.remove_playlist(&name) {
            Ok(removed) => println!("Removed playlist '{}'", removed.name),
            Err(e) => exit_err(e),
        },
        PlaylistCmd::AddTrack { name, tracks } => {
            let playlist = match station.find_playlist_mut(&name) {
                Some(p) => p,
                None => exit_err(format!("Playlist '{}' not found", name)),
            };
            let count = tracks.len();
            for track in tracks {
                playlist.add_track(track);
            }
            println!("Added {} track(s) to '{}'", count, playlist.name);
        }
        PlaylistCmd::SetRemote { name, off } => {
            let playlist = match station.find_playlist_mut(&name) {
                Some(p) => p,
                None => exit_err(format!("Playlist '{}' not found", name)),
            };
            playlist.set_remote(!off);
            println!(
                "Playlist '{}' is now {}",
                playlist.name,
                if off { "song-sourced" } else { "remote-sourced" }
            );
        }
    }
    true
}

fn handle_policy(station: &mut Station, action: PolicyCmd) {
    let playlist_name = match &action {
        PolicyCmd::SetType { name, .. }
        | PolicyCmd::PerSongs { name, .. }
        | PolicyCmd::PerMinutes { name, .. }
        | PolicyCmd::HourMinute { name, .. }
        | PolicyCmd::Window { name, .. }
        | PolicyCmd::Days { name, .. }
        | PolicyCmd::Flag { name, .. }
        | PolicyCmd::Unflag { name, .. }
        | PolicyCmd::Enable { name }
        | PolicyCmd::Disable { name } => name.clone(),
    };

    let playlist = match station.find_playlist_mut(&playlist_name) {
        Some(p) => p,
        None => exit_err(format!("Playlist '{}' not found", playlist_name)),
    };

    match action {
        PolicyCmd::SetType { policy_type, .. } => {
            let parsed = match PolicyType::from_str_loose(&policy_type) {
                Ok(t) => t,
                Err(e) => exit_err(e),
            };
            playlist.policy.policy_type = parsed;
            println!("Policy for '{}' set to {}", playlist.name, parsed);
        }
        PolicyCmd::PerSongs { count, .. } => {
            playlist.policy.play_per_songs = count;
            println!("'{}' plays once per {} song(s)", playlist.name, count);
        }
        PolicyCmd::PerMinutes { minutes, .. } => {
            playlist.policy.play_per_minutes = minutes as i64;
            println!("'{}' plays once per {} minute(s)", playlist.name, minutes);
        }
        PolicyCmd::HourMinute { minute, .. } => {
            playlist.policy.set_play_per_hour_minute(minute);
            println!(
                "'{}' targets minute {} of each hour",
                playlist.name,
                playlist.policy.play_per_hour_minute()
            );
        }
        PolicyCmd::Window { start, end, .. } => {
            let start_code = match time_window::parse_timecode(&start) {
                Ok(c) => c,
                Err(e) => exit_err(e),
            };
            let end_code = match time_window::parse_timecode(&end) {
                Ok(c) => c,
                Err(e) => exit_err(e),
            };
            playlist.policy.schedule_start_time = start_code;
            playlist.policy.schedule_end_time = end_code;
            if start_code == end_code {
                println!("'{}' plays once at {:04}", playlist.name, start_code);
            } else {
                println!(
                    "'{}' scheduled window {:04}-{:04}",
                    playlist.name, start_code, end_code
                );
            }
        }
        PolicyCmd::Days { days, .. } => {
            let parsed = match days.as_deref() {
                Some(s) => match parse_days(s) {
                    Ok(d) => d,
                    Err(e) => exit_err(e),
                },
                None => Vec::new(),
            };
            playlist.policy.schedule_days = parsed;
            println!("'{}' plays {}", playlist.name, playlist.policy.days_display());
        }
        PolicyCmd::Flag { flag, .. } => {
            let parsed = match PlaybackFlag::from_str_loose(&flag) {
                Ok(f) => f,
                Err(e) => exit_err(e),
            };
            playlist.policy.set_flag(parsed, true);
            println!("Set {} on '{}'", parsed, playlist.name);
        }
        PolicyCmd::Unflag { flag, .. } => {
            let parsed = match PlaybackFlag::from_str_loose(&flag) {
                Ok(f) => f,
                Err(e) => exit_err(e),
            };
            playlist.policy.set_flag(parsed, false);
            println!("Cleared {} on '{}'", parsed, playlist.name);
        }
        PolicyCmd::Enable { .. } => {
            playlist.policy.is_enabled = true;
            println!("Enabled '{}'", playlist.name);
        }
        PolicyCmd::Disable { .. } => {
            playlist.policy.is_enabled = false;
            println!("Disabled '{}'", playlist.name);
        }
    }
}
