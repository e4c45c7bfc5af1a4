//! Feature extraction for fraud classifier inference.
//!
//! Produces the 33 values the classifier was trained on: 28 heuristic slots
//! `V1..V28`, the scaled amount and four cyclical time encodings. The values
//! are then laid out in the order of the feature-name list shipped with the
//! model.
//!
//! The `V*` slots are placeholders for behavioral features that no feature
//! store provides yet. Their arithmetic must stay exactly as is: already
//! trained artifacts depend on it.

use crate::deterministic::{hash_bucket, normal, SplitMix64};
use crate::error::ModelError;
use crate::types::{RawFeatures, Transaction};
use rand::SeedableRng;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Number of heuristic `V*` slots
pub const HEURISTIC_SLOTS: usize = 28;

/// Total number of features the encoder can produce
pub const FEATURE_COUNT: usize = 33;

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_WEEK: f64 = 7.0;

/// Number of seeded filler slots (`V15..V28`)
const FILLER_SLOTS: usize = 14;

/// Feature names in the order the encoder computes them.
pub fn default_feature_names() -> Vec<String> {
    (1..=HEURISTIC_SLOTS)
        .map(|i| format!("V{i}"))
        .chain(
            ["Amount_scaled", "hour_sin", "hour_cos", "day_sin", "day_cos"]
                .into_iter()
                .map(String::from),
        )
        .collect()
}

/// Fixed-order numeric encoding of one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Single-precision copy for runtimes that take `f32` tensors
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

/// Ordered feature-name list mapped onto encoder slots.
///
/// Built once when the model state is loaded; a name the encoder cannot
/// produce is rejected here rather than per request.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    slots: Vec<usize>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, ModelError> {
        let canonical: HashMap<String, usize> = default_feature_names()
            .into_iter()
            .enumerate()
            .map(|(slot, name)| (name, slot))
            .collect();

        let slots = names
            .iter()
            .map(|name| {
                canonical
                    .get(name.trim())
                    .copied()
                    .ok_or_else(|| ModelError::Schema(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { names, slots })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        let names = default_feature_names();
        let slots = (0..names.len()).collect();
        Self { names, slots }
    }
}

/// Feature extractor that transforms transactions into model input features.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
}

impl FeatureExtractor {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Number of features produced, equal to the schema length
    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    /// Extract features from a transaction, laid out in schema order.
    ///
    /// `amount_scaled` comes from the amount scaler (see [`crate::scaler`]).
    pub fn extract(&self, tx: &Transaction, amount_scaled: f64) -> FeatureVector {
        self.select(&encode_all(tx, amount_scaled))
    }

    /// Lay out caller-supplied `V1..V28` values in schema order; the time
    /// encodings are derived from `raw.time`.
    pub fn extract_raw(&self, raw: &RawFeatures, amount_scaled: f64) -> FeatureVector {
        self.select(&encode_raw(raw, amount_scaled))
    }

    fn select(&self, all: &[f64; FEATURE_COUNT]) -> FeatureVector {
        FeatureVector::new(self.schema.slots.iter().map(|&slot| all[slot]).collect())
    }
}

/// Every feature in canonical order (`V1..V28`, amount, time encodings)
pub fn encode_all(tx: &Transaction, amount_scaled: f64) -> [f64; FEATURE_COUNT] {
    assemble(&heuristic_slots(tx), amount_scaled, tx.hour, tx.day_of_week)
}

/// Canonical order for pre-computed features
pub fn encode_raw(raw: &RawFeatures, amount_scaled: f64) -> [f64; FEATURE_COUNT] {
    assemble(&raw.components, amount_scaled, raw.hour(), raw.day_of_week())
}

fn assemble(
    components: &[f64; HEURISTIC_SLOTS],
    amount_scaled: f64,
    hour: u8,
    day_of_week: u8,
) -> [f64; FEATURE_COUNT] {
    let mut features = [0.0; FEATURE_COUNT];
    features[..HEURISTIC_SLOTS].copy_from_slice(components);
    features[HEURISTIC_SLOTS] = amount_scaled;
    features[HEURISTIC_SLOTS + 1..].copy_from_slice(&cyclical_time(hour, day_of_week));
    features
}

/// `[hour_sin, hour_cos, day_sin, day_cos]` with periods 24 and 7
pub fn cyclical_time(hour: u8, day_of_week: u8) -> [f64; 4] {
    let hour_angle = 2.0 * PI * f64::from(hour) / HOURS_PER_DAY;
    let day_angle = 2.0 * PI * f64::from(day_of_week) / DAYS_PER_WEEK;
    [hour_angle.sin(), hour_angle.cos(), day_angle.sin(), day_angle.cos()]
}

/// Seed for the filler slots: truncated amount modulo 1000
pub fn filler_seed(amount: f64) -> u64 {
    // `as` saturates, so huge amounts still yield a valid seed
    (amount.trunc() as u64) % 1000
}

/// Heuristic slots `V1..V28`
pub fn heuristic_slots(tx: &Transaction) -> [f64; HEURISTIC_SLOTS] {
    let amount = tx.amount;
    let hour = f64::from(tx.hour);
    let day = f64::from(tx.day_of_week);
    let amount_log = amount.ln_1p();

    let mut slots = [0.0; HEURISTIC_SLOTS];

    // Amount
    slots[0] = amount_log * 0.1;
    slots[1] = amount / 10000.0;
    slots[2] = (amount / 1000.0).sin();
    slots[3] = (amount / 1000.0).cos();

    // Time
    slots[4] = (hour / HOURS_PER_DAY) * 2.0 - 1.0;
    slots[5] = (2.0 * PI * hour / HOURS_PER_DAY).sin();
    slots[6] = (2.0 * PI * hour / HOURS_PER_DAY).cos();
    slots[7] = (day / DAYS_PER_WEEK) * 2.0 - 1.0;

    // Interactions
    slots[8] = amount_log * (hour / HOURS_PER_DAY);
    slots[9] = amount_log * (day / DAYS_PER_WEEK);

    // Merchant category
    let category = hash_bucket(tx.merchant_category_or_default());
    slots[10] = category;
    slots[11] = category * amount_log;

    // Location
    let country = hash_bucket(tx.country_or_default());
    slots[12] = country;
    slots[13] = country * amount_log;

    // Filler, V15..V28
    let mut rng = SplitMix64::seed_from_u64(filler_seed(amount));
    for slot in &mut slots[HEURISTIC_SLOTS - FILLER_SLOTS..] {
        *slot = normal(&mut rng, 0.0, 0.5) + amount_log * 0.01;
    }

    slots
}
