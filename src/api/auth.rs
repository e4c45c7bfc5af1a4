//! API key middleware

use crate::api::{AppError, AppState};
use crate::config::{Environment, SecurityConfig};
use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Accepted API keys and the header that carries them
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    header: HeaderName,
    keys: HashSet<String>,
    /// Requests without a key pass (development only)
    allow_missing: bool,
}

impl ApiKeyAuth {
    pub fn new(header: HeaderName, keys: impl IntoIterator<Item = String>, allow_missing: bool) -> Self {
        Self {
            header,
            keys: keys
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            allow_missing,
        }
    }

    /// Keys from `security.api_keys`, else the `API_KEY` environment variable
    pub fn from_config(security: &SecurityConfig, environment: Environment) -> Result<Self> {
        let header = HeaderName::from_bytes(security.api_key_header.as_bytes())
            .with_context(|| format!("Invalid API key header name '{}'", security.api_key_header))?;

        let keys = if security.api_keys.is_empty() {
            std::env::var("API_KEY").ok().into_iter().collect()
        } else {
            security.api_keys.clone()
        };

        let auth = Self::new(header, keys, environment.is_development());
        if auth.keys.is_empty() && !auth.allow_missing {
            warn!("No API keys configured, every classify request will be rejected");
        }
        Ok(auth)
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let Some(value) = headers.get(&self.header) else {
            if self.allow_missing {
                debug!("No API key supplied, allowed in development");
                return Ok(());
            }
            return Err(AppError::MissingApiKey);
        };

        match value.to_str() {
            Ok(key) if self.keys.contains(key) => Ok(()),
            _ => {
                warn!(header = %self.header, "Rejected request with invalid API key");
                Err(AppError::InvalidApiKey)
            }
        }
    }
}

/// Middleware: require a valid API key
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.auth.check(req.headers())?;
    Ok(next.run(req).await)
}
