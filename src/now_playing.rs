//! Live resolver: what is on air at a given instant.

use crate::scheduler::PlayEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How the resolved event relates to the query instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AirStatus {
    /// The instant falls inside the event.
    OnAir,
    /// Nothing covers the instant; this is the next event to start.
    Upcoming,
    /// The instant is past the whole schedule; wrapped to the first event.
    Wrapped,
}

impl std::fmt::Display for AirStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AirStatus::OnAir => write!(f, "on air"),
            AirStatus::Upcoming => write!(f, "upcoming"),
            AirStatus::Wrapped => write!(f, "wrapped"),
        }
    }
}

/// Snapshot of what is on air at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub server_now: DateTime<Utc>,
    pub event: PlayEvent,
    pub status: AirStatus,
    /// Seconds into the event. Zero unless `status` is `OnAir`.
    pub elapsed: f64,
    pub remaining: f64,
    /// `elapsed / duration`, in `0.0..=1.0`.
    pub progress: f64,
    pub next: Option<PlayEvent>,
}

/// Live answer for listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LiveState {
    /// The playlist is empty.
    NoSongs,
    /// The playlist has tracks but the schedule came out empty.
    NoSchedule,
    Playing(NowPlaying),
}

/// Find the event covering `now` in a start-sorted schedule.
///
/// Falls back to the first event starting after `now`, then to the first
/// event overall. Returns `None` only for an empty schedule.
pub fn resolve(schedule: &[PlayEvent], now: DateTime<Utc>) -> Option<NowPlaying> {
    let (index, status) = match schedule.iter().position(|e| e.covers(now)) {
        Some(i) => (i, AirStatus::OnAir),
        None => match schedule.iter().position(|e| e.start > now) {
            Some(i) => (i, AirStatus::Upcoming),
            None if !schedule.is_empty() => (0, AirStatus::Wrapped),
            None => return None,
        },
    };

    let event = schedule[index].clone();
    let duration = event.duration.as_secs_f64();
    let elapsed = match status {
        AirStatus::OnAir => (now - event.start).num_milliseconds() as f64 / 1000.0,
        AirStatus::Upcoming | AirStatus::Wrapped => 0.0,
    };
    let progress = if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(NowPlaying {
        server_now: now,
        next: schedule.get(index + 1).cloned(),
        status,
        elapsed,
        remaining: (duration - elapsed).max(0.0),
        progress,
        event,
    })
}
