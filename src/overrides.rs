//! Start overrides: pin a track to a wall-clock time of day.
//!
//! An override is stored on the track itself as an absolute instant. It is
//! always forward-looking: a time that has already passed today lands on
//! tomorrow instead.

use crate::error::{Result, SchedulerError};
use crate::playlist::Playlist;
use crate::scheduler::DayWindow;
use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};
use tracing::debug;

/// The next instant at `hour:minute` UTC strictly after `now`.
pub fn resolve_start(hour: u32, minute: u32, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if hour > 23 {
        return Err(SchedulerError::validation(format!(
            "hour {} out of range 0-23",
            hour
        )));
    }
    if minute > 59 {
        return Err(SchedulerError::validation(format!(
            "minute {} out of range 0-59",
            minute
        )));
    }
    let day = DayWindow::containing(now);
    let at = day.start + TimeDelta::hours(hour as i64) + TimeDelta::minutes(minute as i64);
    if at > now {
        Ok(at)
    } else {
        Ok(at + TimeDelta::days(1))
    }
}

/// Pin track `id` to the next `hour:minute`, replacing any previous override.
pub fn set_override(
    playlist: &mut Playlist,
    id: &str,
    hour: u32,
    minute: u32,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let at = resolve_start(hour, minute, now)?;
    let track = playlist
        .find_mut(id)
        .ok_or_else(|| SchedulerError::track_not_found(id))?;
    track.start_override = Some(at);
    Ok(at)
}

/// Drop the override on track `id`. Returns whether one was set.
pub fn clear_override(playlist: &mut Playlist, id: &str) -> Result<bool> {
    let track = playlist
        .find_mut(id)
        .ok_or_else(|| SchedulerError::track_not_found(id))?;
    Ok(track.start_override.take().is_some())
}

/// Clear overrides that can never be scheduled again: anything before
/// today's midnight, or beyond tomorrow's day. Returns how many were cleared.
pub fn clear_stale(playlist: &mut Playlist, now: DateTime<Utc>) -> usize {
    let today = DayWindow::containing(now);
    let pending = today.next();
    let mut cleared = 0;
    for track in playlist.tracks_mut() {
        let Some(at) = track.start_override else {
            continue;
        };
        if !today.contains(at) && !pending.contains(at) {
            debug!(id = %track.id, %at, "Cleared stale start override");
            track.start_override = None;
            cleared += 1;
        }
    }
    cleared
}

/// Parse a time string in HH:MM or HH:MM:SS format into (hour, minute).
/// Seconds are accepted but ignored.
pub fn parse_time(s: &str) -> Result<(u32, u32)> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map(|t| (t.hour(), t.minute()))
        .map_err(|_| {
            SchedulerError::validation(format!("Invalid time '{}'. Expected HH:MM or HH:MM:SS", s))
        })
}
