//! SchedulerService — the single entry point for station state.
//!
//! Owns the `Engine` behind one mutex so that every write and every read
//! snapshot is serialized. Mutations check the authorization gate before the
//! lock is taken. Queries copy the playlist under the lock and build the day
//! schedule from that copy, so a build never sees a half-applied mutation.

use crate::auth::{Authorizer, OpenAccess};
use crate::clock::Clock;
use crate::config::StationConfig;
use crate::engine::{Engine, PlaylistSnapshot};
use crate::error::{Result, SchedulerError};
use crate::now_playing::{self, LiveState};
use crate::scheduler::{self, PlayEvent};
use crate::track::{NewTrack, Track};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

// ── Response data types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    pub track: Track,
    pub evicted: Vec<Track>,
    pub playlist: PlaylistSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveOutcome {
    pub removed: Option<Track>,
    pub playlist: PlaylistSnapshot,
}

// ── SchedulerService ────────────────────────────────────────────────────────

pub struct SchedulerService {
    engine: Mutex<Engine>,
    clock: Arc<dyn Clock>,
    auth: Arc<dyn Authorizer>,
}

impl SchedulerService {
    pub fn new(config: StationConfig, clock: Arc<dyn Clock>, auth: Arc<dyn Authorizer>) -> Self {
        SchedulerService {
            engine: Mutex::new(Engine::new(config)),
            clock,
            auth,
        }
    }

    /// A service with no authorization gate, for offline use and tests.
    pub fn open(config: StationConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config, clock, Arc::new(OpenAccess))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Check a credential against the gate without touching station state.
    pub fn authorize(&self, credential: Option<&str>) -> Result<()> {
        if self.auth.is_authorized(credential) {
            Ok(())
        } else {
            Err(SchedulerError::Unauthorized)
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Engine>> {
        self.engine
            .lock()
            .map_err(|_| SchedulerError::Internal("station state lock poisoned".to_string()))
    }

    // ── Mutations ───────────────────────────────────────────────────────

    pub fn add_track(&self, credential: Option<&str>, payload: NewTrack) -> Result<AddOutcome> {
        self.authorize(credential)?;
        let now = self.clock.now();
        let mut engine = self.lock()?;
        let (track, evicted) = engine.add_track(payload, now)?;
        info!(
            id = %track.id,
            title = %track.title,
            secs = track.duration.as_secs(),
            evicted = evicted.len(),
            version = engine.version(),
            "Track added"
        );
        Ok(AddOutcome {
            track,
            evicted,
            playlist: engine.snapshot(),
        })
    }

    pub fn remove_track(&self, credential: Option<&str>, id: &str) -> Result<RemoveOutcome> {
        self.authorize(credential)?;
        let mut engine = self.lock()?;
        let removed = engine.remove_track(id);
        if removed.is_some() {
            info!(id, version = engine.version(), "Track removed");
        }
        Ok(RemoveOutcome {
            removed,
            playlist: engine.snapshot(),
        })
    }

    pub fn reorder(&self, credential: Option<&str>, ordered_ids: &[String]) -> Result<PlaylistSnapshot> {
        self.authorize(credential)?;
        let mut engine = self.lock()?;
        if engine.reorder(ordered_ids) {
            info!(version = engine.version(), "Playlist reordered");
        }
        Ok(engine.snapshot())
    }

    /// Pin track `id` to the next `hour:minute` UTC. Returns the updated track.
    pub fn set_override(
        &self,
        credential: Option<&str>,
        id: &str,
        hour: u32,
        minute: u32,
    ) -> Result<Track> {
        self.authorize(credential)?;
        let now = self.clock.now();
        let mut engine = self.lock()?;
        let at = engine.set_override(id, hour, minute, now)?;
        info!(id, %at, version = engine.version(), "Start override set");
        engine
            .playlist()
            .find(id)
            .cloned()
            .ok_or_else(|| SchedulerError::track_not_found(id))
    }

    pub fn clear_override(&self, credential: Option<&str>, id: &str) -> Result<Track> {
        self.authorize(credential)?;
        let mut engine = self.lock()?;
        if engine.clear_override(id)? {
            info!(id, version = engine.version(), "Start override cleared");
        }
        engine
            .playlist()
            .find(id)
            .cloned()
            .ok_or_else(|| SchedulerError::track_not_found(id))
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// The playlist in playback order. Expired overrides are dropped first.
    pub fn playlist(&self, credential: Option<&str>) -> Result<PlaylistSnapshot> {
        self.authorize(credential)?;
        let now = self.clock.now();
        let mut engine = self.lock()?;
        engine.clear_stale_overrides(now);
        Ok(engine.snapshot())
    }

    /// Current version, for cheap "changed since N" polling.
    pub fn version(&self) -> Result<u64> {
        Ok(self.lock()?.version())
    }

    pub fn currently_playing(&self) -> Result<LiveState> {
        self.currently_playing_at(self.clock.now())
    }

    pub fn currently_playing_at(&self, now: DateTime<Utc>) -> Result<LiveState> {
        let tracks = self.tracks()?;
        if tracks.is_empty() {
            return Ok(LiveState::NoSongs);
        }
        let schedule = scheduler::build_day_schedule(&tracks, now);
        Ok(match now_playing::resolve(&schedule, now) {
            Some(np) => LiveState::Playing(np),
            None => LiveState::NoSchedule,
        })
    }

    pub fn full_schedule(&self) -> Result<Vec<PlayEvent>> {
        self.full_schedule_at(self.clock.now())
    }

    pub fn full_schedule_at(&self, now: DateTime<Utc>) -> Result<Vec<PlayEvent>> {
        let tracks = self.tracks()?;
        Ok(scheduler::build_day_schedule(&tracks, now))
    }

    fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.lock()?.playlist().tracks().to_vec())
    }
}
