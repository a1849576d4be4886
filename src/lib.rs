//! Clutch performance prediction.
//!
//! The [`engine`] turns a player's game context into a predicted category
//! (overperform / expected / underperform) with a probability distribution,
//! a confidence, and a ranked explanation. A trained model is used when one is
//! loaded; otherwise the deterministic rule-based scorer answers.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod engine;
pub mod loader;
