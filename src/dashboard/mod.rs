use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::db::{Database, PredictionRecord};
use crate::engine::{ClutchPredictor, GameContext, PlayerPrediction, PredictError};

#[derive(Clone)]
pub struct AppState {
    pub predictor: ClutchPredictor,
    pub db: Database,
    /// Default and maximum number of rows served by `/api/history`
    pub history_limit: i64,
}

/// Build the Axum router for the dashboard API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/model", get(model_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/predict/batch", post(batch_handler))
        .route("/api/history", get(history_handler))
        .route("/api/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// A prediction request: player name plus the flattened game context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub player_name: String,
    #[serde(flatten)]
    pub context: GameContext,
}

/// One entry of a batch response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Ok(PlayerPrediction),
    Err { player_name: String, error: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub player: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PredictError> for ApiError {
    fn from(value: PredictError) -> Self {
        match value {
            PredictError::InvalidInput { .. } => ApiError::BadRequest(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        ApiError::Internal(value.to_string())
    }
}

/// GET /api/model
async fn model_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.predictor.model_info())
}

/// POST /api/predict
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PlayerPrediction>, ApiError> {
    let served = state.predictor.predict_player(&req.player_name, &req.context)?;
    record(&state.db, &req.context, &served)?;
    Ok(Json(served))
}

/// POST /api/predict/batch
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(reqs): Json<Vec<PredictRequest>>,
) -> Result<Json<Vec<BatchItem>>, ApiError> {
    let pairs: Vec<(String, GameContext)> = reqs
        .into_iter()
        .map(|r| (r.player_name, r.context))
        .collect();
    let results = state.predictor.predict_many(&pairs);

    let mut items = Vec::with_capacity(results.len());
    for ((player_name, context), result) in pairs.iter().zip(results) {
        match result {
            Ok(served) => {
                record(&state.db, context, &served)?;
                items.push(BatchItem::Ok(served));
            }
            Err(e) => items.push(BatchItem::Err {
                player_name: player_name.clone(),
                error: e.to_string(),
            }),
        }
    }
    Ok(Json(items))
}

/// GET /api/history?player=<name>&limit=50
async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    let limit = q
        .limit
        .unwrap_or(state.history_limit)
        .clamp(1, state.history_limit);
    let rows = match q.player.as_deref() {
        Some(player) => state.db.list_player_predictions(player, limit)?,
        None => state.db.list_recent_predictions(limit)?,
    };
    Ok(Json(rows))
}

/// GET /api/stats
async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.get_stats()?))
}

fn record(db: &Database, context: &GameContext, served: &PlayerPrediction) -> Result<(), ApiError> {
    db.insert_prediction(&PredictionRecord::new(context, served))
        .map(|_| ())
        .map_err(|e| {
            error!("Failed to record prediction for {}: {}", served.player_name, e);
            ApiError::from(e)
        })
}
