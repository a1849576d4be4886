use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::PredictError;
use super::explanation::{explain, narrative};
use super::features;
use super::model::{self, ModelHandle};
use super::scorer::{self, FeatureWeights, FEATURE_WEIGHTS};
use super::types::{Category, Feature, GameContext, Prediction, PredictionSource};

/// Predict clutch performance for one game context.
///
/// Uses the trained model when `handle` is present and usable, otherwise the
/// rule-based scorer. Model problems never fail the call: the only error a
/// caller can see is `InvalidInput`.
pub fn predict(
    context: &GameContext,
    handle: Option<&ModelHandle>,
) -> Result<Prediction, PredictError> {
    let vector = features::build(context)?;
    let breakdown = scorer::breakdown(&vector);

    let (distribution, source) = match model::predict(&vector, handle) {
        Ok(distribution) => (distribution, PredictionSource::Model),
        Err(PredictError::ModelUnavailable) => {
            debug!("No trained model loaded, using rule-based scorer");
            (breakdown.distribution, PredictionSource::RuleBased)
        }
        Err(e) => {
            warn!("Falling back to rule-based scorer: {}", e);
            (breakdown.distribution, PredictionSource::RuleBased)
        }
    };

    let category = distribution.most_likely();
    Ok(Prediction {
        category,
        distribution,
        confidence: distribution.get(category),
        composite_score: breakdown.composite,
        explanation: explain(&breakdown.contributions, category),
        source,
    })
}

/// A prediction for a named player, as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPrediction {
    pub player_name: String,
    #[serde(flatten)]
    pub prediction: Prediction,
    /// One-sentence narrative of the prediction
    pub summary: String,
    pub predicted_at: DateTime<Utc>,
}

/// What the predictor is running with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub model_name: Option<String>,
    pub categories: Vec<Category>,
    pub feature_order: Vec<Feature>,
    pub feature_weights: FeatureWeights,
}

/// Process-level predictor holding the optional shared model.
///
/// Cheap to clone; the model is never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct ClutchPredictor {
    model: Option<Arc<ModelHandle>>,
}

impl ClutchPredictor {
    pub fn new(model: Option<ModelHandle>) -> Self {
        ClutchPredictor {
            model: model.map(Arc::new),
        }
    }

    /// Predictor without a trained model.
    pub fn rule_based() -> Self {
        Self::default()
    }

    pub fn predict(&self, context: &GameContext) -> Result<Prediction, PredictError> {
        predict(context, self.model.as_deref())
    }

    pub fn predict_player(
        &self,
        player_name: &str,
        context: &GameContext,
    ) -> Result<PlayerPrediction, PredictError> {
        let vector = features::build(context)?;
        let prediction = self.predict(context)?;
        let summary = narrative(&prediction, &vector, player_name);
        info!(
            "Prediction for {}: {} ({:.1}%, {})",
            player_name,
            prediction.category,
            prediction.confidence * 100.0,
            prediction.source
        );
        Ok(PlayerPrediction {
            player_name: player_name.to_string(),
            prediction,
            summary,
            predicted_at: Utc::now(),
        })
    }

    /// Predict for several players; each entry succeeds or fails on its own.
    pub fn predict_many(
        &self,
        requests: &[(String, GameContext)],
    ) -> Vec<Result<PlayerPrediction, PredictError>> {
        let results: Vec<_> = requests
            .iter()
            .map(|(name, context)| self.predict_player(name, context))
            .collect();
        info!("Generated predictions for {} player(s)", results.len());
        results
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_loaded: self.model.is_some(),
            scaler_loaded: self.model.as_ref().is_some_and(|m| m.has_scaler()),
            model_name: self.model.as_ref().map(|m| m.name().to_string()),
            categories: Category::ALL.to_vec(),
            feature_order: Feature::ALL.to_vec(),
            feature_weights: FEATURE_WEIGHTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::tests::FixedClassifier;
    use crate::engine::model::LabelEncoding;
    use crate::engine::types::PROBABILITY_TOLERANCE;
    use approx::assert_relative_eq;

    fn ctx(home: bool, opp: f64, rest: i32, fg: f64, mpg: f64) -> GameContext {
        GameContext {
            is_home: home,
            opponent_strength: opp,
            rest_days: rest,
            season_clutch_fg_pct: fg,
            minutes_per_game: mpg,
        }
    }

    fn model_handle(output: Vec<f64>) -> ModelHandle {
        ModelHandle::new(
            Arc::new(FixedClassifier::new(5, output)),
            None,
            LabelEncoding::default(),
        )
        .unwrap()
    }

    fn sample_contexts() -> Vec<GameContext> {
        let mut out = Vec::new();
        for home in [true, false] {
            for opp in [-0.2, 0.0, 0.25, 0.5, 0.85, 1.0, 1.3] {
                for rest in [0, 1, 2, 3, 7] {
                    for fg in [0.0, 30.0, 45.0, 52.0, 100.0, 120.0] {
                        for mpg in [0.0, 12.0, 32.0, 40.0, 53.0] {
                            out.push(ctx(home, opp, rest, fg, mpg));
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn distributions_valid_and_confidence_matches_category() {
        for c in sample_contexts() {
            let p = predict(&c, None).unwrap();
            for cat in Category::ALL {
                let v = p.distribution.get(cat);
                assert!((0.0..=1.0).contains(&v), "{c:?}: {cat} = {v}");
            }
            assert!((p.distribution.sum() - 1.0).abs() <= PROBABILITY_TOLERANCE);
            assert_eq!(p.confidence, p.distribution.get(p.category));
            assert!((-1.0..=1.0).contains(&p.composite_score));
        }
    }

    #[test]
    fn no_handle_is_rule_based() {
        for c in sample_contexts() {
            let p = predict(&c, None).unwrap();
            assert_eq!(p.source, PredictionSource::RuleBased);
        }
    }

    #[test]
    fn loaded_model_is_used() {
        let h = model_handle(vec![0.1, 0.2, 0.7]);
        let p = predict(&ctx(false, 0.9, 0, 35.0, 20.0), Some(&h)).unwrap();
        assert_eq!(p.source, PredictionSource::Model);
        assert_eq!(p.category, Category::Overperform);
        assert_relative_eq!(p.confidence, 0.7, epsilon = 1e-12);
        // explanation still comes from the rule-based contributions
        assert_eq!(p.explanation.len(), 5);
    }

    #[test]
    fn incompatible_model_falls_back() {
        let h = model_handle(vec![0.5, 0.5]);
        let c = ctx(true, 0.3, 2, 52.0, 36.0);
        let p = predict(&c, Some(&h)).unwrap();
        assert_eq!(p.source, PredictionSource::RuleBased);
        assert_eq!(p, predict(&c, None).unwrap());
    }

    #[test]
    fn failing_model_falls_back() {
        let mut classifier = FixedClassifier::new(5, vec![]);
        classifier.output = Err("corrupt trees".into());
        let h = ModelHandle::new(Arc::new(classifier), None, LabelEncoding::default()).unwrap();
        let p = predict(&ctx(true, 0.5, 1, 45.0, 32.0), Some(&h)).unwrap();
        assert_eq!(p.source, PredictionSource::RuleBased);
    }

    #[test]
    fn model_tie_prefers_expected() {
        let h = model_handle(vec![0.35, 0.35, 0.30]);
        let p = predict(&ctx(true, 0.5, 1, 45.0, 32.0), Some(&h)).unwrap();
        assert_eq!(p.category, Category::Expected);
    }

    #[test]
    fn invalid_input_is_surfaced() {
        let c = ctx(true, 0.5, -1, 45.0, 32.0);
        assert!(matches!(
            predict(&c, None),
            Err(PredictError::InvalidInput {
                field: "rest_days",
                ..
            })
        ));
        let h = model_handle(vec![0.2, 0.3, 0.5]);
        assert!(matches!(
            predict(&c, Some(&h)),
            Err(PredictError::InvalidInput { .. })
        ));
    }

    #[test]
    fn scenario_baseline_is_expected() {
        let p = predict(&ctx(true, 0.5, 1, 45.0, 32.0), None).unwrap();
        assert_eq!(p.category, Category::Expected);
        for cat in Category::ALL {
            assert!(p.distribution.get(cat) <= 0.5);
        }
    }

    #[test]
    fn scenario_favorable_is_overperform() {
        let p = predict(&ctx(true, 0.3, 2, 52.0, 36.0), None).unwrap();
        assert_eq!(p.category, Category::Overperform);
        assert_eq!(p.explanation[0].feature, Feature::SeasonClutchFgPct);
    }

    #[test]
    fn scenario_unfavorable_is_underperform() {
        let p = predict(&ctx(false, 0.85, 0, 40.0, 32.0), None).unwrap();
        assert_eq!(p.category, Category::Underperform);
        assert_eq!(p.explanation[0].feature, Feature::OpponentStrength);
    }

    #[test]
    fn clamped_input_predicts_like_boundary() {
        let over = predict(&ctx(true, 1.4, 1, 45.0, 32.0), None).unwrap();
        let edge = predict(&ctx(true, 1.0, 1, 45.0, 32.0), None).unwrap();
        assert_eq!(over, edge);
    }

    #[test]
    fn predictor_reports_model_info() {
        let info = ClutchPredictor::rule_based().model_info();
        assert!(!info.model_loaded);
        assert!(!info.scaler_loaded);
        assert_eq!(info.model_name, None);
        assert_eq!(info.feature_order.len(), 5);
        assert_relative_eq!(info.feature_weights.season_clutch_fg_pct, 0.30);

        let info = ClutchPredictor::new(Some(model_handle(vec![0.2, 0.3, 0.5]))).model_info();
        assert!(info.model_loaded);
        assert_eq!(info.model_name.as_deref(), Some("fixed"));
    }

    #[test]
    fn predict_player_attaches_summary() {
        let p = ClutchPredictor::rule_based()
            .predict_player("Jane Doe", &ctx(true, 0.3, 2, 52.0, 36.0))
            .unwrap();
        assert_eq!(p.player_name, "Jane Doe");
        assert!(p.summary.starts_with("Jane Doe is predicted to overperform"));
    }

    #[test]
    fn predict_many_keeps_each_result() {
        let requests = vec![
            ("A".to_string(), ctx(true, 0.3, 2, 52.0, 36.0)),
            ("B".to_string(), ctx(true, 0.3, -2, 52.0, 36.0)),
            ("C".to_string(), ctx(false, 0.85, 0, 40.0, 32.0)),
        ];
        let results = ClutchPredictor::rule_based().predict_many(&requests);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().prediction.category, Category::Overperform);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().prediction.category, Category::Underperform);
    }

    #[test]
    fn player_prediction_serializes_flat() {
        let p = ClutchPredictor::rule_based()
            .predict_player("Jane Doe", &ctx(true, 0.5, 1, 45.0, 32.0))
            .unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["category"], "expected");
        assert_eq!(json["source"], "rule_based");
        assert!(json["distribution"]["overperform"].is_number());
        let back: PlayerPrediction = serde_json::from_value(json).unwrap();
        assert_eq!(back.player_name, "Jane Doe");
        assert_eq!(back.prediction.category, Category::Expected);
    }
}
