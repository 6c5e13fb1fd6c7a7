//! The playlist store: rotation order plus the total-duration budget.

use crate::config::DAY_SECS;
use crate::error::{Result, SchedulerError};
use crate::track::Track;
use std::collections::HashSet;
use tracing::warn;

/// The rotation: tracks in playback order, capped by a total-duration budget.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
    next_seq: u64,
    max_secs: u64,
}

impl Default for Playlist {
    fn default() -> Self {
        Playlist::new(DAY_SECS)
    }
}

impl Playlist {
    pub fn new(max_playlist_secs: u32) -> Self {
        Playlist {
            tracks: Vec::new(),
            next_seq: 0,
            max_secs: max_playlist_secs as u64,
        }
    }

    /// Append a validated track, then evict the oldest entries until the
    /// playlist fits the budget again. Returns the evicted tracks, oldest first.
    pub fn add(&mut self, mut track: Track) -> Result<Vec<Track>> {
        if self.find(&track.id).is_some() {
            return Err(SchedulerError::validation(format!(
                "Track '{}' is already in the playlist",
                track.id
            )));
        }
        track.seq = self.next_seq;
        self.next_seq += 1;
        self.tracks.push(track);
        Ok(self.enforce_budget())
    }

    /// Remove a track by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Track> {
        let pos = self.position(id)?;
        Some(self.tracks.remove(pos))
    }

    /// Rewrite playback order. Listed ids come first in the given order;
    /// tracks the request left out follow in their previous relative order.
    /// Unknown and repeated ids are ignored. Returns whether the order changed.
    pub fn reorder(&mut self, ordered_ids: &[String]) -> bool {
        let before: Vec<u64> = self.tracks.iter().map(|t| t.seq).collect();

        let mut remaining: Vec<Option<Track>> = self.tracks.drain(..).map(Some).collect();
        let mut reordered = Vec::with_capacity(remaining.len());
        let mut seen = HashSet::new();
        for id in ordered_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(slot) = remaining
                .iter_mut()
                .find(|slot| matches!(slot, Some(t) if &t.id == id))
            {
                reordered.extend(slot.take());
            }
        }
        reordered.extend(remaining.into_iter().flatten());
        self.tracks = reordered;

        self.tracks.iter().map(|t| t.seq).ne(before)
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Tracks in playback order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.iter_mut()
    }

    pub fn total_secs(&self) -> u64 {
        self.tracks.iter().map(|t| t.duration.as_secs()).sum()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    fn enforce_budget(&mut self) -> Vec<Track> {
        let mut evicted = Vec::new();
        while self.total_secs() > self.max_secs && !self.tracks.is_empty() {
            let Some(oldest) = self
                .tracks
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| t.seq)
                .map(|(i, _)| i)
            else {
                break;
            };
            let track = self.tracks.remove(oldest);
            warn!(
                id = %track.id,
                title = %track.title,
                "Playlist over {}s budget, evicted oldest track",
                self.max_secs
            );
            evicted.push(track);
        }
        evicted
    }
}
