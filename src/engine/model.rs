//! Trained-model adapter.
//!
//! A [`ModelHandle`] bundles a classifier, its optional training-time feature
//! scaler, and the fixed mapping from the classifier's class indices to
//! [`Category`] labels. Handles are built once by a loader, validated against
//! the feature contract at construction, and shared read-only afterwards.

use std::fmt;
use std::sync::Arc;

use super::error::PredictError;
use super::features::FeatureVector;
use super::types::{Category, ClassDistribution, FEATURE_COUNT};

/// Largest deviation from 1 tolerated in a classifier's probability output
/// before it is rejected (smaller deviations are renormalized away).
const MODEL_SUM_TOLERANCE: f64 = 1e-3;

/// A trained classifier that outputs class probabilities.
pub trait Classifier: Send + Sync {
    /// Number of input features the classifier was trained on.
    fn n_features(&self) -> usize;

    /// Class probabilities for one (already scaled) feature row, indexed by
    /// the classifier's native class encoding.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, String>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// A feature transform fit alongside the classifier at training time.
pub trait FeatureScaler: Send + Sync {
    fn n_features(&self) -> usize;

    fn transform(&self, features: &[f64]) -> Vec<f64>;
}

/// Standardization `(x − mean) / scale`; a zero scale leaves the centred
/// value unscaled.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, PredictError> {
        if mean.len() != scale.len() {
            return Err(PredictError::ModelIncompatible(format!(
                "scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(PredictError::ModelIncompatible(
                "scaler parameters must be finite".into(),
            ));
        }
        Ok(StandardScaler { mean, scale })
    }
}

impl FeatureScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect()
    }
}

/// Classifier class index → canonical category, fixed when a model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelEncoding([Category; 3]);

impl LabelEncoding {
    /// `labels[i]` is the category of the classifier's class `i`. Every
    /// category must appear exactly once.
    pub fn new(labels: [Category; 3]) -> Result<Self, PredictError> {
        for category in Category::ALL {
            if labels.iter().filter(|c| **c == category).count() != 1 {
                return Err(PredictError::ModelIncompatible(format!(
                    "label encoding {:?} must list each category once",
                    labels
                )));
            }
        }
        Ok(LabelEncoding(labels))
    }

    pub fn category(&self, class_index: usize) -> Option<Category> {
        self.0.get(class_index).copied()
    }

    pub fn labels(&self) -> [Category; 3] {
        self.0
    }
}

impl Default for LabelEncoding {
    /// Encoding of the training pipeline: 0 = under, 1 = expected, 2 = over.
    fn default() -> Self {
        LabelEncoding(Category::ALL)
    }
}

/// A loaded, contract-checked trained model.
#[derive(Clone)]
pub struct ModelHandle {
    classifier: Arc<dyn Classifier>,
    scaler: Option<Arc<dyn FeatureScaler>>,
    labels: LabelEncoding,
}

impl ModelHandle {
    /// Wrap a classifier and optional scaler, asserting that both accept
    /// exactly the engine's feature count.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        scaler: Option<Arc<dyn FeatureScaler>>,
        labels: LabelEncoding,
    ) -> Result<Self, PredictError> {
        let handle = ModelHandle {
            classifier,
            scaler,
            labels,
        };
        handle.check_feature_count(FEATURE_COUNT)?;
        Ok(handle)
    }

    pub fn name(&self) -> &str {
        self.classifier.name()
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn labels(&self) -> LabelEncoding {
        self.labels
    }

    fn check_feature_count(&self, expected: usize) -> Result<(), PredictError> {
        let got = self.classifier.n_features();
        if got != expected {
            return Err(PredictError::ModelIncompatible(format!(
                "classifier '{}' expects {} features, feature vector has {}",
                self.classifier.name(),
                got,
                expected
            )));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.n_features() != expected {
                return Err(PredictError::ModelIncompatible(format!(
                    "scaler expects {} features, feature vector has {}",
                    scaler.n_features(),
                    expected
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("classifier", &self.classifier.name())
            .field("has_scaler", &self.scaler.is_some())
            .field("labels", &self.labels)
            .finish()
    }
}

/// Class distribution from the trained model.
///
/// Feature counts are checked before the classifier is invoked; the output is
/// validated, renormalized, and relabeled into canonical categories.
pub fn predict(
    vector: &FeatureVector,
    handle: Option<&ModelHandle>,
) -> Result<ClassDistribution, PredictError> {
    let handle = handle.ok_or(PredictError::ModelUnavailable)?;
    handle.check_feature_count(vector.len())?;

    let scaled = match &handle.scaler {
        Some(scaler) => scaler.transform(vector.as_slice()),
        None => vector.as_slice().to_vec(),
    };
    let raw = handle
        .classifier
        .predict_proba(&scaled)
        .map_err(PredictError::ModelFailed)?;

    if raw.len() != Category::ALL.len() {
        return Err(PredictError::ModelIncompatible(format!(
            "classifier '{}' returned {} class probabilities, expected {}",
            handle.classifier.name(),
            raw.len(),
            Category::ALL.len()
        )));
    }
    if raw.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(PredictError::ModelFailed(format!(
            "classifier returned invalid probabilities {:?}",
            raw
        )));
    }
    let total: f64 = raw.iter().sum();
    if (total - 1.0).abs() > MODEL_SUM_TOLERANCE {
        return Err(PredictError::ModelFailed(format!(
            "classifier probabilities sum to {:.6}",
            total
        )));
    }

    let mut dist = ClassDistribution::new(0.0, 0.0, 0.0);
    for (p, category) in raw.iter().zip(handle.labels.0) {
        let p = p / total;
        match category {
            Category::Underperform => dist.underperform = p,
            Category::Expected => dist.expected = p,
            Category::Overperform => dist.overperform = p,
        }
    }
    Ok(dist)
}
