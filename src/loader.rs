//! Model artifact loading.
//!
//! Artifacts are JSON documents produced by the training pipeline: a
//! multinomial logistic (softmax) regression, an optional standard scaler,
//! the persisted feature order, and the class label encoding. Loading checks
//! the artifact against the engine's feature contract before any prediction
//! is made.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::engine::{
    Category, Classifier, Feature, FeatureScaler, LabelEncoding, ModelHandle, PredictError,
    StandardScaler,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model artifact incompatible: {0}")]
    Incompatible(String),
}

impl From<PredictError> for LoadError {
    fn from(value: PredictError) -> Self {
        LoadError::Incompatible(value.to_string())
    }
}

/// On-disk model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Feature order the model was trained on
    pub feature_names: Vec<String>,
    /// Category of each classifier output index; defaults to
    /// `[underperform, expected, overperform]`
    #[serde(default)]
    pub classes: Option<Vec<String>>,
    #[serde(default)]
    pub scaler: Option<ScalerParams>,
    pub classifier: SoftmaxParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxParams {
    /// One row of feature coefficients per class
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// Multinomial logistic regression.
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    name: String,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    n_features: usize,
}

impl SoftmaxClassifier {
    pub fn new(name: impl Into<String>, params: SoftmaxParams) -> Result<Self, LoadError> {
        let SoftmaxParams {
            coefficients,
            intercepts,
        } = params;
        if coefficients.is_empty() || coefficients.len() != intercepts.len() {
            return Err(LoadError::Incompatible(format!(
                "classifier has {} coefficient rows and {} intercepts",
                coefficients.len(),
                intercepts.len()
            )));
        }
        let n_features = coefficients[0].len();
        if coefficients.iter().any(|row| row.len() != n_features) {
            return Err(LoadError::Incompatible(
                "classifier coefficient rows differ in length".into(),
            ));
        }
        if coefficients
            .iter()
            .flatten()
            .chain(intercepts.iter())
            .any(|v| !v.is_finite())
        {
            return Err(LoadError::Incompatible(
                "classifier parameters must be finite".into(),
            ));
        }
        Ok(SoftmaxClassifier {
            name: name.into(),
            coefficients,
            intercepts,
            n_features,
        })
    }
}

impl Classifier for SoftmaxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, String> {
        if features.len() != self.n_features {
            return Err(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            ));
        }
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| b + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>())
            .collect();
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ModelArtifact {
    /// Validate the artifact and turn it into a model handle.
    pub fn into_handle(self) -> Result<ModelHandle, LoadError> {
        let expected: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
        if self.feature_names != expected {
            return Err(LoadError::Incompatible(format!(
                "trained on features {:?}, engine supplies {:?}",
                self.feature_names, expected
            )));
        }

        let labels = match &self.classes {
            None => LabelEncoding::default(),
            Some(classes) => parse_labels(classes)?,
        };

        let name = match &self.version {
            Some(v) => format!("{}@{}", self.name, v),
            None => self.name.clone(),
        };
        let classifier = SoftmaxClassifier::new(name, self.classifier)?;
        if classifier.coefficients.len() != Category::ALL.len() {
            return Err(LoadError::Incompatible(format!(
                "classifier has {} classes, expected {}",
                classifier.coefficients.len(),
                Category::ALL.len()
            )));
        }

        let scaler: Option<Arc<dyn FeatureScaler>> = match self.scaler {
            Some(params) => Some(Arc::new(StandardScaler::new(params.mean, params.scale)?)),
            None => None,
        };

        Ok(ModelHandle::new(Arc::new(classifier), scaler, labels)?)
    }
}

fn parse_labels(classes: &[String]) -> Result<LabelEncoding, LoadError> {
    let parsed = classes
        .iter()
        .map(|c| {
            Category::parse(c)
                .ok_or_else(|| LoadError::Incompatible(format!("unknown class label '{}'", c)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let labels: [Category; 3] = parsed.try_into().map_err(|v: Vec<Category>| {
        LoadError::Incompatible(format!("expected 3 class labels, got {}", v.len()))
    })?;
    Ok(LabelEncoding::new(labels)?)
}

/// Read and validate a model artifact from disk.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelHandle, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&content)?;
    let handle = artifact.into_handle()?;
    info!(
        "Loaded model {} from {} (scaler: {})",
        handle.name(),
        path.display(),
        handle.has_scaler()
    );
    Ok(handle)
}
