//! Station state: the playlist and its change counter.

use crate::config::StationConfig;
use crate::error::Result;
use crate::overrides;
use crate::playlist::Playlist;
use crate::track::{NewTrack, Track};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time copy of the playlist, tagged with the version it was taken at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistSnapshot {
    pub version: u64,
    pub tracks: Vec<Track>,
}

/// The station's canonical state: the playlist with its overrides and a
/// version counter bumped by every mutation that changes what will air.
///
/// Created once at startup, mutated only through these methods, and gone
/// with the process.
#[derive(Debug)]
pub struct Engine {
    pub config: StationConfig,
    playlist: Playlist,
    version: u64,
}

impl Engine {
    pub fn new(config: StationConfig) -> Self {
        Engine {
            playlist: Playlist::new(config.max_playlist_secs),
            config,
            version: 0,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> PlaylistSnapshot {
        PlaylistSnapshot {
            version: self.version,
            tracks: self.playlist.tracks().to_vec(),
        }
    }

    /// Validate and append a track. Returns the stored track and any tracks
    /// the budget evicted. A rejected payload leaves the state untouched.
    pub fn add_track(&mut self, payload: NewTrack, now: DateTime<Utc>) -> Result<(Track, Vec<Track>)> {
        let track = payload.into_track(&self.config, now)?;
        let stored = track.clone();
        let evicted = self.playlist.add(track)?;
        self.version += 1;
        Ok((stored, evicted))
    }

    /// Remove a track. The version only moves if something was removed.
    pub fn remove_track(&mut self, id: &str) -> Option<Track> {
        let removed = self.playlist.remove(id);
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    pub fn reorder(&mut self, ordered_ids: &[String]) -> bool {
        let changed = self.playlist.reorder(ordered_ids);
        if changed {
            self.version += 1;
        }
        changed
    }

    pub fn set_override(
        &mut self,
        id: &str,
        hour: u32,
        minute: u32,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let at = overrides::set_override(&mut self.playlist, id, hour, minute, now)?;
        self.version += 1;
        Ok(at)
    }

    pub fn clear_override(&mut self, id: &str) -> Result<bool> {
        let cleared = overrides::clear_override(&mut self.playlist, id)?;
        if cleared {
            self.version += 1;
        }
        Ok(cleared)
    }

    /// Garbage-collect expired overrides. Does not move the version: expired
    /// overrides never reach a schedule anyway.
    pub fn clear_stale_overrides(&mut self, now: DateTime<Utc>) -> usize {
        overrides::clear_stale(&mut self.playlist, now)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(StationConfig::default())
    }
}
