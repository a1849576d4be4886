//! Prediction explanations.
//!
//! A deterministic re-sort and labelling pass over contribution values that
//! the rule-based scorer already computed.

use super::features::FeatureVector;
use super::types::{Category, Direction, ExplanationItem, Feature, Prediction, FEATURE_COUNT};

/// Rank features by absolute contribution, strongest first.
///
/// A feature *supports* `category` when its contribution pushes the composite
/// score the way that category lies: up for overperform, down for
/// underperform, and back toward the neutral band (against the sign of the
/// composite) for expected. Equal magnitudes keep feature-vector order.
pub fn explain(contributions: &[f64; FEATURE_COUNT], category: Category) -> Vec<ExplanationItem> {
    let composite: f64 = contributions.iter().sum();
    let mut items: Vec<ExplanationItem> = Feature::ALL
        .iter()
        .map(|feature| {
            let c = contributions[feature.index()];
            let supports = match category {
                Category::Overperform => c > 0.0,
                Category::Underperform => c < 0.0,
                Category::Expected => c * composite <= 0.0,
            };
            ExplanationItem {
                feature: *feature,
                direction: if supports {
                    Direction::Supports
                } else {
                    Direction::Opposes
                },
                magnitude: c.abs(),
            }
        })
        .collect();
    items.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    items
}

/// Contributions smaller than this are left out of narratives.
const NARRATIVE_MIN_MAGNITUDE: f64 = 0.01;
/// Factors named in a narrative.
const NARRATIVE_MAX_FACTORS: usize = 3;

/// One-sentence narrative for a prediction, e.g.
/// `"Jane Doe is predicted to overperform (confidence: 89.4%), considering a strong 52.0% clutch FG% and facing a weaker opponent."`
pub fn narrative(prediction: &Prediction, vector: &FeatureVector, player_name: &str) -> String {
    let leading = prediction
        .explanation
        .iter()
        .filter(|item| item.magnitude >= NARRATIVE_MIN_MAGNITUDE)
        .take(NARRATIVE_MAX_FACTORS);
    let (supporting, opposing): (Vec<&ExplanationItem>, Vec<&ExplanationItem>) =
        leading.partition(|item| item.direction == Direction::Supports);
    let supporting: Vec<String> = supporting.iter().map(|i| describe(i, vector)).collect();
    let opposing: Vec<String> = opposing.iter().map(|i| describe(i, vector)).collect();

    let mut text = format!(
        "{} is predicted to {} (confidence: {:.1}%)",
        player_name,
        prediction.category,
        prediction.confidence * 100.0
    );
    match (supporting.is_empty(), opposing.is_empty()) {
        (true, true) => text.push_str(" under standard game conditions"),
        (false, true) => text.push_str(&format!(", considering {}", join_phrases(&supporting))),
        (true, false) => text.push_str(&format!(" despite {}", join_phrases(&opposing))),
        (false, false) => text.push_str(&format!(
            ", considering {} despite {}",
            join_phrases(&supporting),
            join_phrases(&opposing)
        )),
    }
    text.push('.');
    text
}

fn describe(item: &ExplanationItem, vector: &FeatureVector) -> String {
    match item.feature {
        Feature::Home => "home court advantage".to_string(),
        Feature::OpponentStrength => {
            if vector.get(Feature::OpponentStrength) > 0.5 {
                "facing a strong opponent".to_string()
            } else {
                "facing a weaker opponent".to_string()
            }
        }
        Feature::RestDays => match vector.rest_days() as i64 {
            0 => "playing back-to-back".to_string(),
            d if d >= 3 => "being well-rested".to_string(),
            d => format!("{d} days of rest"),
        },
        Feature::SeasonClutchFgPct => {
            if vector.clutch_fg_pct() >= 45.0 {
                format!("a strong {:.1}% clutch FG%", vector.clutch_fg_pct())
            } else {
                format!("a weak {:.1}% clutch FG%", vector.clutch_fg_pct())
            }
        }
        Feature::MinutesPerGame => {
            if vector.minutes() >= 32.0 {
                format!("a heavy {:.1} minutes per game", vector.minutes())
            } else {
                format!("a light {:.1} minutes per game", vector.minutes())
            }
        }
    }
}

fn join_phrases(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::features::build;
    use crate::engine::scorer::breakdown;
    use crate::engine::types::{GameContext, PredictionSource};
    use approx::assert_relative_eq;

    fn favorable() -> FeatureVector {
        build(&GameContext {
            is_home: true,
            opponent_strength: 0.3,
            rest_days: 2,
            season_clutch_fg_pct: 52.0,
            minutes_per_game: 36.0,
        })
        .unwrap()
    }

    #[test]
    fn orders_by_magnitude_descending() {
        let v = favorable();
        let b = breakdown(&v);
        let items = explain(&b.contributions, Category::Overperform);
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].feature, Feature::SeasonClutchFgPct);
        for pair in items.windows(2) {
            assert!(pair[0].magnitude >= pair[1].magnitude);
        }
    }

    #[test]
    fn magnitudes_are_weighted_contributions() {
        let v = favorable();
        let b = breakdown(&v);
        let items = explain(&b.contributions, Category::Overperform);
        for item in &items {
            assert_relative_eq!(
                item.magnitude,
                b.contributions[item.feature.index()].abs(),
                epsilon = 1e-15
            );
        }
    }

    #[test]
    fn direction_follows_category() {
        let v = favorable();
        let b = breakdown(&v);
        let over = explain(&b.contributions, Category::Overperform);
        assert!(over.iter().all(|i| i.direction == Direction::Supports));
        let under = explain(&b.contributions, Category::Underperform);
        assert!(under.iter().all(|i| i.direction == Direction::Opposes));
    }

    #[test]
    fn expected_supported_by_features_pulling_to_neutral() {
        let mut contributions = [0.0; FEATURE_COUNT];
        contributions[Feature::SeasonClutchFgPct.index()] = 0.12;
        contributions[Feature::OpponentStrength.index()] = -0.05;
        let items = explain(&contributions, Category::Expected);
        let fg = items.iter().find(|i| i.feature == Feature::SeasonClutchFgPct).unwrap();
        let opp = items.iter().find(|i| i.feature == Feature::OpponentStrength).unwrap();
        assert_eq!(fg.direction, Direction::Opposes);
        assert_eq!(opp.direction, Direction::Supports);
    }

    #[test]
    fn narrative_names_player_and_leading_factors() {
        let v = favorable();
        let b = breakdown(&v);
        let prediction = Prediction {
            category: Category::Overperform,
            distribution: b.distribution,
            confidence: b.distribution.overperform,
            composite_score: b.composite,
            explanation: explain(&b.contributions, Category::Overperform),
            source: PredictionSource::RuleBased,
        };
        let text = narrative(&prediction, &v, "Jane Doe");
        assert!(text.starts_with("Jane Doe is predicted to overperform (confidence: "));
        assert!(text.contains("52.0% clutch FG%"), "{text}");
        assert!(!text.contains("despite"));
        assert!(text.ends_with('.'));
    }

    #[test]
    fn narrative_lists_opposing_factors() {
        let v = favorable();
        let b = breakdown(&v);
        let prediction = Prediction {
            category: Category::Underperform,
            distribution: b.distribution,
            confidence: b.distribution.underperform,
            composite_score: b.composite,
            explanation: explain(&b.contributions, Category::Underperform),
            source: PredictionSource::RuleBased,
        };
        let text = narrative(&prediction, &v, "Jane Doe");
        assert!(text.contains(" despite a strong 52.0% clutch FG%"), "{text}");
    }

    #[test]
    fn narrative_for_neutral_context() {
        let v = build(&GameContext {
            is_home: false,
            opponent_strength: 0.5,
            rest_days: 1,
            season_clutch_fg_pct: 45.0,
            minutes_per_game: 32.0,
        })
        .unwrap();
        let b = breakdown(&v);
        let prediction = Prediction {
            category: Category::Expected,
            distribution: b.distribution,
            confidence: b.distribution.expected,
            composite_score: b.composite,
            explanation: explain(&b.contributions, Category::Expected),
            source: PredictionSource::RuleBased,
        };
        let text = narrative(&prediction, &v, "John Roe");
        assert!(text.ends_with("under standard game conditions."), "{text}");
    }

    #[test]
    fn join_phrases_formats_lists() {
        let parts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(join_phrases(&parts), "a, b and c");
        assert_eq!(join_phrases(&parts[..1]), "a");
    }
}
