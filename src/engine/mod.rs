pub mod error;
pub mod explanation;
pub mod features;
pub mod model;
pub mod predictor;
pub mod scorer;
pub mod types;

pub use error::PredictError;
pub use model::{Classifier, FeatureScaler, LabelEncoding, ModelHandle, StandardScaler};
pub use predictor::{predict, ClutchPredictor, ModelInfo, PlayerPrediction};
pub use types::{
    Category, ClassDistribution, Direction, ExplanationItem, Feature, GameContext, Prediction,
    PredictionSource,
};
