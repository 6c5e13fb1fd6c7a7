//! roundcast-server — HTTP front-end for the roundcast scheduler.
//!
//! Holds one `SchedulerService` for the life of the process and exposes it
//! over a small JSON API.

pub mod api;
