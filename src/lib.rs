//! Score analytics for drum corps competition results.
//!
//! The analysis modules work on already loaded [`models::ScoreRecord`] slices
//! and never touch the filesystem; [`loader`] and [`config`] handle I/O.

pub mod alias;
pub mod competition;
pub mod config;
pub mod head_to_head;
pub mod loader;
pub mod models;
pub mod profile;
pub mod report;
pub mod score_plus;
pub mod season;
pub mod standings;
