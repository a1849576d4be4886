use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features in every [`FeatureVector`](super::features::FeatureVector).
pub const FEATURE_COUNT: usize = 5;

/// Tolerance used when checking that a distribution sums to 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Game context for a single player going into a clutch segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameContext {
    pub is_home: bool,
    /// Opponent strength rating, 0.0 (weakest) to 1.0 (strongest)
    pub opponent_strength: f64,
    /// Days since the player's previous game
    pub rest_days: i32,
    /// Season clutch field-goal percentage (0–100)
    pub season_clutch_fg_pct: f64,
    pub minutes_per_game: f64,
}

/// Input features, in the order every scorer and trained model consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Home,
    OpponentStrength,
    RestDays,
    SeasonClutchFgPct,
    MinutesPerGame,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Home,
        Feature::OpponentStrength,
        Feature::RestDays,
        Feature::SeasonClutchFgPct,
        Feature::MinutesPerGame,
    ];

    /// Position of this feature inside a feature vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Machine name, as persisted alongside trained models.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Home => "home",
            Feature::OpponentStrength => "opponent_strength",
            Feature::RestDays => "rest_days",
            Feature::SeasonClutchFgPct => "season_clutch_fg_pct",
            Feature::MinutesPerGame => "minutes_per_game",
        }
    }

    /// Human-readable label for narratives.
    pub fn label(self) -> &'static str {
        match self {
            Feature::Home => "home court",
            Feature::OpponentStrength => "opponent strength",
            Feature::RestDays => "rest",
            Feature::SeasonClutchFgPct => "season clutch FG%",
            Feature::MinutesPerGame => "minutes per game",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Predicted clutch performance class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Underperform,
    Expected,
    Overperform,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Underperform,
        Category::Expected,
        Category::Overperform,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Underperform => "underperform",
            Category::Expected => "expected",
            Category::Overperform => "overperform",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "underperform" => Some(Category::Underperform),
            "expected" => Some(Category::Expected),
            "overperform" => Some(Category::Overperform),
            _ => None,
        }
    }

    /// Rank used on exact probability ties: expected wins, then overperform.
    fn tie_rank(self) -> u8 {
        match self {
            Category::Expected => 2,
            Category::Overperform => 1,
            Category::Underperform => 0,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability for each of the three categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub underperform: f64,
    pub expected: f64,
    pub overperform: f64,
}

impl ClassDistribution {
    pub fn new(underperform: f64, expected: f64, overperform: f64) -> Self {
        ClassDistribution {
            underperform,
            expected,
            overperform,
        }
    }

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Underperform => self.underperform,
            Category::Expected => self.expected,
            Category::Overperform => self.overperform,
        }
    }

    pub fn sum(&self) -> f64 {
        self.underperform + self.expected + self.overperform
    }

    /// Every value finite, within [0, 1], and the total within tolerance of 1.
    pub fn is_valid(&self) -> bool {
        Category::ALL.iter().all(|c| {
            let p = self.get(*c);
            p.is_finite() && (0.0..=1.0).contains(&p)
        }) && (self.sum() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }

    /// The most likely category.
    ///
    /// Exact ties prefer `expected`, then `overperform` over `underperform`.
    pub fn most_likely(&self) -> Category {
        let mut best = Category::Underperform;
        for candidate in [Category::Expected, Category::Overperform] {
            let p = self.get(candidate);
            let p_best = self.get(best);
            if p > p_best || (p == p_best && candidate.tie_rank() > best.tie_rank()) {
                best = candidate;
            }
        }
        best
    }
}

/// Which scorer produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    RuleBased,
}

impl PredictionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::RuleBased => "rule_based",
        }
    }
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Supports,
    Opposes,
}

/// One line of a prediction's explanation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplanationItem {
    pub feature: Feature,
    pub direction: Direction,
    /// Absolute weighted contribution of the feature
    pub magnitude: f64,
}

/// Output of a single prediction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: Category,
    pub distribution: ClassDistribution,
    /// Probability of `category`
    pub confidence: f64,
    /// Rule-based composite score in [-1, 1], regardless of `source`
    pub composite_score: f64,
    /// Features ordered by influence, strongest first
    pub explanation: Vec<ExplanationItem>,
    pub source: PredictionSource,
}
