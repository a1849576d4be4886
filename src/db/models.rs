use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{GameContext, PlayerPrediction};

/// A served prediction, as stored in the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: Option<i64>,
    pub player_name: String,
    pub is_home: bool,
    pub opponent_strength: f64,
    pub rest_days: i32,
    pub season_clutch_fg_pct: f64,
    pub minutes_per_game: f64,
    /// "overperform" | "expected" | "underperform"
    pub category: String,
    pub confidence: f64,
    pub p_underperform: f64,
    pub p_expected: f64,
    pub p_overperform: f64,
    /// "model" | "rule_based"
    pub source: String,
    pub summary: String,
    pub predicted_at: DateTime<Utc>,
}

impl PredictionRecord {
    /// Flatten a served prediction and the raw context it was made from.
    pub fn new(context: &GameContext, served: &PlayerPrediction) -> Self {
        let p = &served.prediction;
        PredictionRecord {
            id: None,
            player_name: served.player_name.clone(),
            is_home: context.is_home,
            opponent_strength: context.opponent_strength,
            rest_days: context.rest_days,
            season_clutch_fg_pct: context.season_clutch_fg_pct,
            minutes_per_game: context.minutes_per_game,
            category: p.category.as_str().to_string(),
            confidence: p.confidence,
            p_underperform: p.distribution.underperform,
            p_expected: p.distribution.expected,
            p_overperform: p.distribution.overperform,
            source: p.source.as_str().to_string(),
            summary: served.summary.clone(),
            predicted_at: served.predicted_at,
        }
    }
}

/// Aggregate history stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionStats {
    pub total_predictions: i64,
    pub overperform: i64,
    pub expected: i64,
    pub underperform: i64,
    pub model_predictions: i64,
    pub rule_based_predictions: i64,
    pub avg_confidence: f64,
}
