use crate::config::StationConfig;
use crate::error::{Result, SchedulerError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A playable item in the rotation.
///
/// `title`, `artist`, `artwork` and `media` are carried for listeners and
/// never interpreted by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(rename = "image", default)]
    pub artwork: String,
    #[serde(rename = "url")]
    pub media: String,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
    /// Pinned start instant. Only meaningful inside the day it falls in.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub start_override: Option<DateTime<Utc>>,
    /// Insertion sequence assigned by the playlist; breaks `added_at` ties.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Track {
    /// Duration as a chrono delta, for timeline arithmetic.
    pub fn airtime(&self) -> TimeDelta {
        TimeDelta::seconds(self.duration.as_secs() as i64)
    }

    /// Format duration as MM:SS.
    pub fn duration_display(&self) -> String {
        let secs = self.duration.as_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// Write payload for adding a track. Every field is optional on the wire so
/// that missing data is reported as a validation error rather than a parse
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

impl NewTrack {
    pub fn new(title: &str, url: &str) -> Self {
        NewTrack {
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            ..NewTrack::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_duration(mut self, secs: u64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Validate the payload and turn it into a playlist entry stamped with
    /// `added_at`. Identifier uniqueness is the playlist's concern.
    pub fn into_track(self, config: &StationConfig, added_at: DateTime<Utc>) -> Result<Track> {
        let title = required(self.title, "title")?;
        let media = required(self.url, "url")?;

        let id = match self.id {
            Some(id) if id.trim().is_empty() => {
                return Err(SchedulerError::validation("id cannot be blank"));
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let secs = self.duration.unwrap_or(config.default_track_secs as u64);
        if secs == 0 {
            return Err(SchedulerError::validation("duration must be > 0"));
        }
        if secs > config.max_playlist_secs as u64 {
            return Err(SchedulerError::validation(format!(
                "duration {}s exceeds the {}s playlist budget",
                secs, config.max_playlist_secs
            )));
        }

        Ok(Track {
            id,
            title,
            artist: self.artist.unwrap_or_default(),
            artwork: self.image.unwrap_or_default(),
            media,
            duration: Duration::from_secs(secs),
            added_at,
            start_override: None,
            seq: 0,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SchedulerError::validation(format!("{} is required", field))),
    }
}

/// Durations travel as whole seconds.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(dur: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(dur.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
