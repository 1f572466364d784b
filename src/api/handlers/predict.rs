use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::{debug, info_span};

use crate::api::{error::ApiError, state::AppState, types::PredictResponse};

/// POST /predict
///
/// Body is a flat JSON object of feature values. The first required key
/// that is absent yields 400; any other failure is 500.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();

    info_span!("predict", %request_id).in_scope(|| -> Result<Json<PredictResponse>, ApiError> {
        let Json(body) = payload
            .map_err(|rejection| ApiError::Internal(format!("unreadable body: {rejection}")))?;
        let Value::Object(fields) = body else {
            return Err(ApiError::Internal(
                "request body is not a JSON object".to_string(),
            ));
        };

        let forecast = state.predictor.predict(&fields)?;
        debug!(probability = forecast.probability, "prediction served");

        Ok(Json(forecast.into()))
    })
}
