//! roundcast — Core library for the 24-hour rolling broadcast scheduler.
//!
//! Playlist, overrides, day schedule building and live resolution live here.
//! The CLI and the HTTP server consume this crate.

pub mod app_core;
pub mod auth;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod now_playing;
pub mod overrides;
pub mod playlist;
pub mod scheduler;
pub mod track;

pub use app_core::SchedulerService;
pub use error::{Result, SchedulerError};
