//! Day schedule builder.
//!
//! Turns the playlist into a gap-free timeline for one UTC day. Pinned
//! tracks (those carrying a start override inside the day) are placed at
//! their instants; everything between them is filled round-robin from the
//! playlist. The build is a pure function of the playlist and "now".

use crate::track::{Track, duration_serde};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// The half-open UTC day `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The UTC day that `now` falls in.
    pub fn containing(now: DateTime<Utc>) -> Self {
        let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        DayWindow {
            start,
            end: start + TimeDelta::days(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn next(&self) -> Self {
        DayWindow {
            start: self.end,
            end: self.end + TimeDelta::days(1),
        }
    }
}

/// A track placed at a concrete instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayEvent {
    pub track: Track,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    /// Time on air. Equal to the track's duration unless a pinned track cut in.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Placed by a start override rather than by the rotation.
    pub pinned: bool,
}

impl PlayEvent {
    fn new(track: &Track, start: DateTime<Utc>, pinned: bool) -> Self {
        PlayEvent {
            track: track.clone(),
            start,
            duration: track.duration,
            pinned,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + TimeDelta::milliseconds(self.duration.as_millis() as i64)
    }

    /// Whether `instant` lies in `[start, end)`.
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end()
    }
}

/// Build the schedule for the UTC day containing `now`.
///
/// A filler event may run past the next pinned instant; the pinned track
/// then cuts it short so events never overlap. The last event of the day is
/// never cut and may run past midnight.
pub fn build_day_schedule(tracks: &[Track], now: DateTime<Utc>) -> Vec<PlayEvent> {
    if tracks.is_empty() {
        return Vec::new();
    }

    let day = DayWindow::containing(now);
    let mut pinned: Vec<(DateTime<Utc>, &Track)> = tracks
        .iter()
        .filter_map(|t| {
            t.start_override
                .filter(|at| day.contains(*at))
                .map(|at| (at, t))
        })
        .collect();
    pinned.sort_by_key(|(at, _)| *at);
    let pinned_count = pinned.len();
    let mut pinned = pinned.into_iter().peekable();

    let mut events: Vec<PlayEvent> = Vec::new();
    let mut cursor = day.start;
    let mut rotation = 0usize;

    loop {
        match pinned.peek() {
            Some(&(at, track)) if at <= cursor => {
                pinned.next();
                cut_in(&mut events, at);
                let event = PlayEvent::new(track, at, true);
                cursor = event.end();
                events.push(event);
                continue;
            }
            _ => {}
        }

        let gap_end = pinned.peek().map_or(day.end, |&(at, _)| at);
        if cursor >= gap_end {
            break;
        }
        while cursor < gap_end {
            let event = PlayEvent::new(&tracks[rotation % tracks.len()], cursor, false);
            rotation += 1;
            cursor = event.end();
            events.push(event);
        }
    }

    events.sort_by_key(|e| e.start);
    debug!(
        day = %day.start.date_naive(),
        events = events.len(),
        pinned = pinned_count,
        "Built day schedule"
    );
    events
}

/// Shorten (or drop) whatever is still on air at `at` so a pinned event can start.
fn cut_in(events: &mut Vec<PlayEvent>, at: DateTime<Utc>) {
    while let Some(last) = events.last_mut() {
        if last.end() <= at {
            return;
        }
        if last.start >= at {
            events.pop();
            continue;
        }
        last.duration = Duration::from_millis((at - last.start).num_milliseconds() as u64);
        return;
    }
}
