//! Rule-based clutch scorer.
//!
//! Always available and dependency-free. Each feature is mapped to a signed
//! favorability in [-1, +1] toward overperformance, the favorabilities are
//! combined with fixed domain weights into a composite score, and the
//! composite is turned into a 3-way distribution with a cumulative-logit
//! (proportional odds) mapping around two thresholds:
//!
//! ```text
//! P(under)            = σ(k · (t_low  − s))
//! P(under ∪ expected) = σ(k · (t_high − s))
//! P(expected)         = P(under ∪ expected) − P(under)
//! P(over)             = 1 − P(under ∪ expected)
//! ```
//!
//! Because `t_low < t_high` every class gets strictly positive mass, the
//! distribution sums to 1 by construction, and it varies continuously with
//! the score.

use serde::{Deserialize, Serialize};

use super::features::{FeatureVector, REGULATION_MINUTES};
use super::types::{ClassDistribution, Feature, FEATURE_COUNT};

/// Composite score below which mass concentrates on "underperform".
pub const T_LOW: f64 = -0.15;
/// Composite score above which mass concentrates on "overperform".
pub const T_HIGH: f64 = 0.15;
/// Logistic steepness around each threshold.
/// Calibrated so an all-baseline home context stays below ~0.5 on every class.
pub const STEEPNESS: f64 = 6.0;

// ── Favorability rules ───────────────────────────────────────────────────────

/// Fixed favorability of playing at home (away is neutral).
const HOME_FAVORABILITY: f64 = 0.3;
/// Opponent strength at which the opponent is neutral.
const OPPONENT_BASELINE: f64 = 0.5;
/// Rest days considered neutral.
const REST_BASELINE_DAYS: f64 = 1.0;
/// Extra rest beyond this no longer helps.
const REST_SATURATION_DAYS: f64 = 3.0;
/// League-typical clutch FG% (as a fraction).
const CLUTCH_FG_BASELINE: f64 = 0.45;
/// FG% distance from baseline that saturates favorability.
const CLUTCH_FG_SPAN: f64 = 0.10;
/// Minutes per game of a typical closing-lineup player.
const MINUTES_BASELINE: f64 = 32.0;
/// Minutes distance from baseline that saturates favorability.
const MINUTES_SPAN: f64 = 8.0;

/// Static per-feature weights of the rule-based scorer. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub home: f64,
    pub opponent_strength: f64,
    pub rest_days: f64,
    pub season_clutch_fg_pct: f64,
    pub minutes_per_game: f64,
}

pub const FEATURE_WEIGHTS: FeatureWeights = FeatureWeights {
    home: 0.15,
    opponent_strength: 0.25,
    rest_days: 0.10,
    season_clutch_fg_pct: 0.30,
    minutes_per_game: 0.20,
};

impl FeatureWeights {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Home => self.home,
            Feature::OpponentStrength => self.opponent_strength,
            Feature::RestDays => self.rest_days,
            Feature::SeasonClutchFgPct => self.season_clutch_fg_pct,
            Feature::MinutesPerGame => self.minutes_per_game,
        }
    }

    pub fn sum(&self) -> f64 {
        Feature::ALL.iter().map(|f| self.get(*f)).sum()
    }
}

/// Everything the scorer derives from one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Weighted favorability per feature, indexed like the feature vector
    pub contributions: [f64; FEATURE_COUNT],
    /// Sum of contributions, in [-1, 1]
    pub composite: f64,
    pub distribution: ClassDistribution,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Score a feature vector into a class distribution.
pub fn score(vector: &FeatureVector) -> ClassDistribution {
    breakdown(vector).distribution
}

/// Score a feature vector, keeping the per-feature contributions.
///
/// This is the single source of contribution values: explanations are built
/// from these numbers, never recomputed elsewhere.
pub fn breakdown(vector: &FeatureVector) -> ScoreBreakdown {
    let contributions = contributions(vector);
    let composite = contributions.iter().sum::<f64>().clamp(-1.0, 1.0);
    ScoreBreakdown {
        contributions,
        composite,
        distribution: distribution_from_score(composite),
    }
}

/// Weighted favorability of every feature.
pub fn contributions(vector: &FeatureVector) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for feature in Feature::ALL {
        out[feature.index()] = FEATURE_WEIGHTS.get(feature) * favorability(vector, feature);
    }
    out
}

/// Signed favorability of one feature toward overperformance, in [-1, 1].
pub fn favorability(vector: &FeatureVector, feature: Feature) -> f64 {
    let raw = match feature {
        Feature::Home => {
            if vector.is_home() {
                HOME_FAVORABILITY
            } else {
                0.0
            }
        }
        // Stronger opponents hurt linearly: 0.0 → +1, 0.5 → 0, 1.0 → −1.
        Feature::OpponentStrength => {
            2.0 * (OPPONENT_BASELINE - vector.get(Feature::OpponentStrength))
        }
        // 0 days → −0.5, 1 day → 0, flat at +1 from 3 days on.
        Feature::RestDays => {
            (vector.rest_days().min(REST_SATURATION_DAYS) - REST_BASELINE_DAYS)
                / (REST_SATURATION_DAYS - REST_BASELINE_DAYS)
        }
        Feature::SeasonClutchFgPct => {
            (vector.get(Feature::SeasonClutchFgPct) - CLUTCH_FG_BASELINE) / CLUTCH_FG_SPAN
        }
        // Heavy minutes stand in for a closing role.
        Feature::MinutesPerGame => {
            (vector.get(Feature::MinutesPerGame) * REGULATION_MINUTES - MINUTES_BASELINE)
                / MINUTES_SPAN
        }
    };
    raw.clamp(-1.0, 1.0)
}

/// Map a composite score to a smooth 3-way distribution.
pub fn distribution_from_score(composite: f64) -> ClassDistribution {
    let p_under = sigmoid(STEEPNESS * (T_LOW - composite));
    let p_not_over = sigmoid(STEEPNESS * (T_HIGH - composite));
    ClassDistribution::new(p_under, p_not_over - p_under, 1.0 - p_not_over)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Numerically stable logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
