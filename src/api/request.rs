//! Request bodies for the scoring endpoints

use crate::api::AppError;
use crate::feature_extractor::HEURISTIC_SLOTS;
use crate::types::{Location, RawFeatures, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationData {
    pub country: String,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// `POST /api/v1/classify` body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassificationRequest {
    #[validate(range(exclusive_min = 0.0, message = "amount must be greater than 0"))]
    pub amount: f64,

    #[validate(range(max = 23, message = "hour must be between 0 and 23"))]
    pub hour: u8,

    #[serde(default)]
    #[validate(range(max = 6, message = "day_of_week must be between 0 and 6"))]
    pub day_of_week: u8,

    pub merchant_category: String,

    #[validate(nested)]
    pub location: LocationData,

    #[serde(default)]
    pub device_info: Option<serde_json::Value>,

    #[serde(default)]
    pub user_id: Option<String>,

    /// Explicit `null` counts as 0
    #[serde(default)]
    pub previous_transactions_count: Option<u32>,
}

impl From<LocationData> for Location {
    fn from(data: LocationData) -> Self {
        Location {
            country: data.country,
            state: data.state,
            city: data.city,
            latitude: data.latitude,
            longitude: data.longitude,
        }
    }
}

impl From<ClassificationRequest> for Transaction {
    fn from(request: ClassificationRequest) -> Self {
        Transaction {
            amount: request.amount,
            hour: request.hour,
            day_of_week: request.day_of_week,
            merchant_category: Some(request.merchant_category),
            location: Some(request.location.into()),
            device_info: request.device_info,
            user_id: request.user_id,
            previous_transactions_count: request.previous_transactions_count.unwrap_or(0),
        }
    }
}

/// `POST /predict` body: `Time`, `V1..V28` and `Amount` as in the
/// training dataset. Extra numeric keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictionRequest {
    #[serde(rename = "Time")]
    #[validate(range(min = 0.0, message = "Time must not be negative"))]
    pub time: f64,

    #[serde(rename = "Amount")]
    #[validate(range(min = 0.0, message = "Amount must not be negative"))]
    pub amount: f64,

    /// `V1..V28`
    #[serde(flatten)]
    pub components: BTreeMap<String, f64>,
}

impl TryFrom<PredictionRequest> for RawFeatures {
    type Error = AppError;

    fn try_from(request: PredictionRequest) -> Result<Self, Self::Error> {
        let mut components = [0.0; HEURISTIC_SLOTS];
        for (i, slot) in components.iter_mut().enumerate() {
            let name = format!("V{}", i + 1);
            *slot = request
                .components
                .get(&name)
                .copied()
                .ok_or_else(|| AppError::ValidationError(format!("missing field `{name}`")))?;
        }
        Ok(RawFeatures::new(request.time, components, request.amount))
    }
}
