//! # Fetebot Scheduler
//! The daily scan loop: wake once per day at the reference time, compare
//! every configured guild's records against today, dispatch a celebration
//! per match.

pub mod engine;

pub use engine::{DailyScheduler, ScanReport, spawn_daily};
