//! Route handlers

use crate::api::{AppResult, AppState, ClassificationRequest, PredictionRequest};
use crate::metrics::MetricsSnapshot;
use crate::types::{RawFeatures, ScoringResult, Transaction};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use std::time::Instant;
use tracing::info;
use validator::Validate;

#[derive(Serialize)]
pub struct WelcomeResponse {
    message: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    version: &'static str,
}

/// Verdict for pre-computed features
#[derive(Serialize)]
pub struct PredictionResponse {
    prediction: u8,
    prediction_label: &'static str,
    probability_fraud: f64,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Fraud Scoring API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.service.model_loaded(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassificationRequest>, JsonRejection>,
) -> AppResult<Json<ScoringResult>> {
    let Json(request) = payload?;
    request.validate()?;

    let tx = Transaction::from(request);
    let started = Instant::now();

    let outcome = match state.service.classify(&tx) {
        Ok(outcome) => outcome,
        Err(e) => {
            state.metrics.record_failure();
            return Err(e.into());
        }
    };
    let result = outcome.result;

    state.metrics.record_scoring(
        started.elapsed(),
        result.fraud_score,
        result.details.risk_level,
        result.is_fraud(),
        outcome.degraded,
    );

    info!(
        transaction_id = %result.transaction_id,
        classification = result.classification,
        fraud_score = result.fraud_score,
        risk_level = result.details.risk_level.as_str(),
        "Transaction classified"
    );

    Ok(Json(result))
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let raw = RawFeatures::try_from(request)?;
    let started = Instant::now();

    let prediction = match state.service.predict(&raw) {
        Ok(prediction) => prediction,
        Err(e) => {
            state.metrics.record_failure();
            return Err(e.into());
        }
    };

    state.metrics.record_scoring(
        started.elapsed(),
        prediction.fraud_probability,
        prediction.risk_level,
        prediction.is_fraud(),
        false,
    );

    info!(
        prediction = prediction.classification,
        probability_fraud = prediction.fraud_probability,
        "Raw features scored"
    );

    Ok(Json(PredictionResponse {
        prediction: prediction.classification,
        prediction_label: if prediction.is_fraud() { "Fraud" } else { "Legitimate" },
        probability_fraud: prediction.fraud_probability,
    }))
}
