// ABOUTME: USDA FoodData Central fact provider with TTL caching and request rate limiting
// ABOUTME: Issues foods/search POST queries restricted to the configured datasets
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! USDA `FoodData` Central provider
//!
//! # Features
//! - Dataset-restricted search with `requireAllWords`
//! - 24-hour result caching to minimize API calls
//! - Rate limiting (30 requests per minute by default)
//! - Bounded request timeout
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use super::provider::FactProvider;
use async_trait::async_trait;
use mealforge_core::constants::service_names;
use mealforge_core::errors::{AppError, AppResult, ErrorCode};
use mealforge_core::models::FoodRecord;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Environment variable holding the API key
const USDA_API_KEY_ENV: &str = "USDA_API_KEY";

/// Environment variable overriding the API base URL
const USDA_BASE_URL_ENV: &str = "USDA_BASE_URL";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// USDA API client configuration
#[derive(Debug, Clone)]
pub struct UsdaClientConfig {
    /// USDA API key (free from <https://fdc.nal.usda.gov/api-key-signup.html>)
    pub api_key: String,
    /// Base URL for USDA API (default: <https://api.nal.usda.gov/fdc/v1>)
    pub base_url: String,
    /// Cache TTL in seconds (default: 86400 = 24 hours)
    pub cache_ttl_secs: u64,
    /// Rate limit per minute (default: 30)
    pub rate_limit_per_minute: u32,
    /// Request timeout in seconds (default: 5)
    pub timeout_secs: u64,
}

impl Default for UsdaClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            cache_ttl_secs: 86400,
            rate_limit_per_minute: 30,
            timeout_secs: 5,
        }
    }
}

impl UsdaClientConfig {
    /// Build configuration from `USDA_API_KEY` and `USDA_BASE_URL`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is set
    pub fn from_env(timeout_secs: u64) -> AppResult<Self> {
        let api_key = env::var(USDA_API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::config(format!("{USDA_API_KEY_ENV} is not set")))?;
        let base_url = env::var(USDA_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
            ..Self::default()
        })
    }
}

/// Search request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    page_size: u32,
    require_all_words: bool,
    data_type: &'a [String],
}

/// USDA API search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodRecord>,
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// Sliding-window rate limiter for API requests
#[derive(Debug)]
struct RateLimiter {
    requests: Vec<Instant>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    const fn new(limit: u32, window: Duration) -> Self {
        Self {
            requests: Vec::new(),
            limit,
            window,
        }
    }

    fn can_request(&mut self) -> bool {
        let now = Instant::now();
        self.requests
            .retain(|&t| now.duration_since(t) < self.window);
        self.requests.len() < self.limit as usize
    }

    fn record_request(&mut self) {
        self.requests.push(Instant::now());
    }

    async fn wait_if_needed(&mut self) {
        while !self.can_request() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

/// USDA `FoodData` Central fact provider
pub struct UsdaFactProvider {
    config: UsdaClientConfig,
    http_client: Client,
    search_cache: Arc<RwLock<HashMap<String, CacheEntry<Vec<FoodRecord>>>>>,
    rate_limiter: Arc<RwLock<RateLimiter>>,
}

impl UsdaFactProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: UsdaClientConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60));

        Ok(Self {
            config,
            http_client,
            search_cache: Arc::new(RwLock::new(HashMap::new())),
            rate_limiter: Arc::new(RwLock::new(rate_limiter)),
        })
    }

    fn cache_key(query: &str, page_size: u32, data_types: &[String]) -> String {
        format!("{}:{page_size}:{}", query.to_lowercase(), data_types.join("|"))
    }

    async fn cached(&self, key: &str) -> Option<Vec<FoodRecord>> {
        let cache = self.search_cache.read().await;
        cache
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.data.clone())
    }

    /// Number of cached search results
    pub async fn cache_len(&self) -> usize {
        self.search_cache.read().await.len()
    }
}

#[async_trait]
impl FactProvider for UsdaFactProvider {
    fn name(&self) -> &'static str {
        service_names::USDA_API
    }

    #[instrument(skip(self, data_types), fields(provider = "usda"))]
    async fn search(
        &self,
        term: &str,
        page_size: u32,
        data_types: &[String],
    ) -> AppResult<Vec<FoodRecord>> {
        let query = term.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if page_size == 0 || page_size > 200 {
            return Err(AppError::invalid_input(
                "Page size must be between 1 and 200",
            ));
        }

        let cache_key = Self::cache_key(query, page_size, data_types);
        if let Some(records) = self.cached(&cache_key).await {
            debug!(records = records.len(), "USDA search served from cache");
            return Ok(records);
        }

        {
            let mut limiter = self.rate_limiter.write().await;
            limiter.wait_if_needed().await;
            limiter.record_request();
        }

        let url = format!("{}/foods/search", self.config.base_url.trim_end_matches('/'));
        let body = SearchRequest {
            query,
            page_size,
            require_all_words: true,
            data_type: data_types,
        };
        let response = self
            .http_client
            .post(&url)
            .query(&[("api_key", &self.config.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout(service_names::USDA_API, self.config.timeout_secs)
                } else {
                    AppError::external_service(service_names::USDA_API, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let excerpt: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(status_error(status, &excerpt));
        }

        let search_response: SearchResponse = response.json().await.map_err(|e| {
            AppError::external_service(service_names::USDA_API, format!("JSON parse error: {e}"))
        })?;

        {
            let mut cache = self.search_cache.write().await;
            cache.insert(
                cache_key,
                CacheEntry {
                    data: search_response.foods.clone(),
                    expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
                },
            );
        }

        debug!(records = search_response.foods.len(), "USDA search returned");
        Ok(search_response.foods)
    }
}

fn status_error(status: StatusCode, excerpt: &str) -> AppError {
    let code = match status.as_u16() {
        401 | 403 => ErrorCode::ExternalAuthFailed,
        429 => ErrorCode::ExternalRateLimited,
        500..=599 => ErrorCode::ExternalServiceUnavailable,
        _ => ErrorCode::ExternalServiceError,
    };
    AppError::new(code, format!("{}: HTTP {status}: {excerpt}", service_names::USDA_API))
}
