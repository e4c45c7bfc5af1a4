//! Sample Traffic Generator
//!
//! Posts random legitimate and suspicious transactions to a running scoring
//! service. Falls back to printing samples when the service is unreachable.
//!
//! Usage: traffic-generator [base_url] [count] [fraud_rate] [delay_ms]
//! The API key is read from `API_KEY`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Request body matching `POST /api/v1/classify`
#[derive(Debug, Clone, Serialize)]
struct ClassificationRequest {
    amount: f64,
    hour: u8,
    day_of_week: u8,
    merchant_category: String,
    location: Location,
    user_id: String,
    previous_transactions_count: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Location {
    country: String,
    city: String,
}

/// Subset of the scoring response we report on
#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    transaction_id: String,
    classification: u8,
    fraud_score: f64,
}

/// Random request generator
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Everyday purchase during waking hours
    fn generate_legitimate(&mut self) -> ClassificationRequest {
        ClassificationRequest {
            amount: (self.rng.gen_range(10.0..500.0_f64) * 100.0).round() / 100.0,
            hour: self.rng.gen_range(8..21),
            day_of_week: self.rng.gen_range(0..7),
            merchant_category: self
                .random_choice(&["grocery", "restaurant", "gas_station", "pharmacy", "online_retail"])
                .to_string(),
            location: self.random_location(&[("BR", "Sao Paulo"), ("BR", "Rio de Janeiro"), ("US", "Austin")]),
            user_id: format!("user_{}", self.rng.gen_range(1..1000)),
            previous_transactions_count: self.rng.gen_range(5..200),
        }
    }

    /// High amount at night from a fresh account
    fn generate_suspicious(&mut self) -> ClassificationRequest {
        ClassificationRequest {
            amount: (self.rng.gen_range(5000.0..20000.0_f64) * 100.0).round() / 100.0,
            hour: self.rng.gen_range(0..6),
            day_of_week: self.rng.gen_range(0..7),
            merchant_category: self.random_choice(&["electronics", "online_retail"]).to_string(),
            location: self.random_location(&[("RU", "Moscow"), ("CN", "Shenzhen"), ("US", "Miami")]),
            user_id: format!("user_{}", self.rng.gen_range(1..1000)),
            previous_transactions_count: self.rng.gen_range(0..3),
        }
    }

    fn random_location(&mut self, choices: &[(&str, &str)]) -> Location {
        let (country, city) = choices[self.rng.gen_range(0..choices.len())];
        Location {
            country: country.to_string(),
            city: city.to_string(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("traffic_generator=info".parse()?),
        )
        .init();

    info!("Starting Sample Traffic Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.1_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);
    let api_key = std::env::var("API_KEY").ok();

    info!(
        base_url = %base_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        api_key_set = api_key.is_some(),
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // Check the service is reachable
    match client.get(format!("{base_url}/health")).send().await {
        Ok(response) if response.status().is_success() => {
            info!("Connected to scoring service");
        }
        Ok(response) => {
            warn!(status = %response.status(), "Health check failed. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
        Err(e) => {
            warn!(error = %e, "Scoring service unreachable. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    }

    let classify_url = format!("{base_url}/api/v1/classify");
    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to post {} transactions...", count);

    let mut suspicious_sent = 0;
    let mut flagged = 0;
    let mut failed = 0;

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            suspicious_sent += 1;
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let mut builder = client.post(&classify_url).json(&request);
        if let Some(key) = &api_key {
            builder = builder.header("X-API-Key", key);
        }

        match builder.send().await {
            Ok(response) if response.status().is_success() => {
                let result: ClassificationResponse = response.json().await?;
                if result.classification == 1 {
                    flagged += 1;
                    info!(
                        transaction_id = %result.transaction_id,
                        fraud_score = result.fraud_score,
                        amount = request.amount,
                        hour = request.hour,
                        "Transaction flagged"
                    );
                }
            }
            Ok(response) => {
                failed += 1;
                warn!(status = %response.status(), "Classify request rejected");
            }
            Err(e) => {
                failed += 1;
                warn!(error = %e, "Classify request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Posted {}/{} transactions ({} suspicious, {} flagged, {} failed)",
                i + 1,
                count,
                suspicious_sent,
                flagged,
                failed
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Posted {} transactions ({} suspicious, {} flagged, {} failed)",
        count, suspicious_sent, flagged, failed
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no scoring service)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
