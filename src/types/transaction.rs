//! Transaction data structures for fraud scoring

use serde::{Deserialize, Serialize};

/// Merchant category assumed when a request leaves it blank.
pub const DEFAULT_MERCHANT_CATEGORY: &str = "online_retail";

/// Country code assumed when a request carries no location.
pub const DEFAULT_COUNTRY: &str = "BR";

/// Where the transaction took place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// ISO country code (e.g. "BR")
    pub country: String,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: None,
            city: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// A card transaction to be scored.
///
/// Range checks (positive amount, hour and weekday bounds) happen at the HTTP
/// boundary; the scoring core assumes a well-formed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction amount, strictly positive
    pub amount: f64,

    /// Hour of day (0-23)
    pub hour: u8,

    /// Day of week (0 = Monday, 6 = Sunday)
    #[serde(default)]
    pub day_of_week: u8,

    #[serde(default)]
    pub merchant_category: Option<String>,

    #[serde(default)]
    pub location: Option<Location>,

    /// Opaque device metadata, carried but not scored
    #[serde(default)]
    pub device_info: Option<serde_json::Value>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub previous_transactions_count: u32,
}

impl Transaction {
    /// Create a transaction with only the required fields set
    pub fn new(amount: f64, hour: u8) -> Self {
        Self {
            amount,
            hour,
            day_of_week: 0,
            merchant_category: None,
            location: None,
            device_info: None,
            user_id: None,
            previous_transactions_count: 0,
        }
    }

    pub fn with_day_of_week(mut self, day_of_week: u8) -> Self {
        self.day_of_week = day_of_week;
        self
    }

    pub fn with_merchant_category(mut self, category: impl Into<String>) -> Self {
        self.merchant_category = Some(category.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Merchant category, or [`DEFAULT_MERCHANT_CATEGORY`] when missing or blank
    pub fn merchant_category_or_default(&self) -> &str {
        self.merchant_category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_MERCHANT_CATEGORY)
    }

    /// Country code, or [`DEFAULT_COUNTRY`] when missing or blank
    pub fn country_or_default(&self) -> &str {
        self.location
            .as_ref()
            .map(|l| l.country.trim())
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
    }
}
