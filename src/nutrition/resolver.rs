// ABOUTME: Resolves normalized ingredient terms to nutrition facts with per-run caching
// ABOUTME: Bounded provider calls; misses and failures degrade to None and are logged
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nutrition Resolver
//!
//! One resolver serves one generation attempt. Lookups consult, in order:
//!
//! 1. the run cache by direct key;
//! 2. the run cache by sorted-token key;
//! 3. the run cache entry with the best positive token overlap;
//! 4. the optional cross-request [`SharedFactCache`];
//! 5. the fact provider, bounded by a timeout.
//!
//! Misses are cached too, so a term is queried at most once per run.

use super::provider::FactProvider;
use super::scoring::{record_to_fact, select_candidate, tokenize};
use crate::config::ResolverConfig;
use crate::ingredients::{sorted_token_key, term_tokens};
use crate::logging::PipelineLogger;
use dashmap::DashMap;
use mealforge_core::errors::{AppError, AppResult};
use mealforge_core::models::{NutritionFact, RetrievalBatch};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Facts shared across requests, keyed by lowercase term
pub type SharedFactCache = Arc<DashMap<String, NutritionFact>>;

/// Where a resolved fact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactOrigin {
    /// Queried from the provider during this run
    Live,
    /// Seeded ahead of time or taken from the shared cache
    Cached,
}

/// A resolved fact with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The fact
    pub fact: NutritionFact,
    /// Its origin
    pub origin: FactOrigin,
}

#[derive(Debug, Clone)]
struct CacheSlot {
    fact: Option<NutritionFact>,
    origin: FactOrigin,
}

impl CacheSlot {
    fn resolution(&self) -> Option<Resolution> {
        self.fact.clone().map(|fact| Resolution {
            fact,
            origin: self.origin,
        })
    }
}

/// Term-to-fact resolver for one generation attempt
pub struct NutritionResolver {
    provider: Arc<dyn FactProvider>,
    config: ResolverConfig,
    data_types: Vec<String>,
    timeout: Duration,
    cache: HashMap<String, CacheSlot>,
    shared: Option<SharedFactCache>,
}

impl NutritionResolver {
    /// Create a resolver with an empty run cache
    #[must_use]
    pub fn new(provider: Arc<dyn FactProvider>, config: ResolverConfig, timeout: Duration) -> Self {
        let data_types = config.data_types();
        Self {
            provider,
            config,
            data_types,
            timeout,
            cache: HashMap::new(),
            shared: None,
        }
    }

    /// Attach a cross-request cache
    #[must_use]
    pub fn with_shared_cache(mut self, shared: SharedFactCache) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Pre-load a fact; later lookups report it as cached
    pub fn seed(&mut self, term: &str, fact: NutritionFact) {
        let key = cache_key(term);
        if key.is_empty() {
            return;
        }
        self.store(
            &key,
            CacheSlot {
                fact: Some(fact),
                origin: FactOrigin::Cached,
            },
        );
    }

    /// Number of run-cache entries, misses included
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a term to a fact
    pub async fn resolve(&mut self, term: &str) -> Option<NutritionFact> {
        self.resolve_with_origin(term)
            .await
            .map(|resolution| resolution.fact)
    }

    /// Resolve a term, reporting whether the fact came from a cache
    pub async fn resolve_with_origin(&mut self, term: &str) -> Option<Resolution> {
        match self.try_resolve_with_origin(term).await {
            Ok(resolution) => resolution,
            Err(error) => {
                PipelineLogger::log_unresolved(term, &error.to_string());
                None
            }
        }
    }

    /// Resolve a term, surfacing provider failures to the caller
    ///
    /// A failed lookup is still cached as a miss for the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns the provider error, or a timeout error when the provider does
    /// not answer in time.
    pub async fn try_resolve_with_origin(&mut self, term: &str) -> AppResult<Option<Resolution>> {
        let key = cache_key(term);
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.lookup_run_cache(&key) {
            return Ok(hit);
        }

        if let Some(fact) = self.lookup_shared(&key) {
            let slot = CacheSlot {
                fact: Some(fact),
                origin: FactOrigin::Cached,
            };
            let resolution = slot.resolution();
            self.store(&key, slot);
            return Ok(resolution);
        }

        let fetched = self.fetch_live(&key).await;
        let fact = fetched.as_ref().ok().cloned().flatten();
        if let (Some(shared), Some(fact)) = (&self.shared, &fact) {
            shared.insert(key.clone(), fact.clone());
        }
        let slot = CacheSlot {
            fact,
            origin: FactOrigin::Live,
        };
        let resolution = slot.resolution();
        self.store(&key, slot);
        fetched.map(|_| resolution)
    }

    /// Resolve several terms for prompt grounding
    pub async fn fetch(&mut self, terms: &[String]) -> RetrievalBatch {
        let mut seen = HashSet::new();
        let mut query_terms = Vec::new();
        for term in terms {
            let key = cache_key(term);
            if !key.is_empty() && seen.insert(key.clone()) {
                query_terms.push(key);
            }
        }

        let mut facts: Vec<NutritionFact> = Vec::new();
        let mut missing = Vec::new();
        for term in &query_terms {
            match self.resolve(term).await {
                Some(fact) => {
                    if !facts.iter().any(|known| known.source_id == fact.source_id) {
                        facts.push(fact);
                    }
                }
                None => missing.push(term.clone()),
            }
        }

        RetrievalBatch::from_results(query_terms, facts, &missing)
    }

    /// Some(slot) when the run cache answers, including cached misses
    fn lookup_run_cache(&self, key: &str) -> Option<Option<Resolution>> {
        if let Some(slot) = self.cache.get(key) {
            return Some(slot.resolution());
        }

        let sorted = sorted_token_key(key);
        if !sorted.is_empty() {
            if let Some(slot) = self.cache.get(&sorted) {
                return Some(slot.resolution());
            }
        }

        let tokens = term_tokens(key);
        if tokens.is_empty() {
            return None;
        }
        self.cache
            .iter()
            .filter(|(_, slot)| slot.fact.is_some())
            .filter_map(|(cached, slot)| {
                let shared = term_tokens(cached).intersection(&tokens).count();
                (shared > 0).then(|| (shared as f64 / tokens.len() as f64, cached, slot))
            })
            .max_by(|(a, key_a, _), (b, key_b, _)| a.total_cmp(b).then_with(|| key_b.cmp(key_a)))
            .map(|(overlap, cached, slot)| {
                debug!(term = %key, cached = %cached, overlap, "Run cache overlap hit");
                slot.resolution()
            })
    }

    fn lookup_shared(&self, key: &str) -> Option<NutritionFact> {
        let shared = self.shared.as_ref()?;
        shared
            .get(key)
            .or_else(|| shared.get(&sorted_token_key(key)))
            .map(|entry| entry.value().clone())
    }

    async fn fetch_live(&self, term: &str) -> AppResult<Option<NutritionFact>> {
        let search = self
            .provider
            .search(term, self.config.page_size, &self.data_types);
        let records = tokio::time::timeout(self.timeout, search)
            .await
            .map_err(|_| AppError::timeout(self.provider.name(), self.timeout.as_secs()))??;
        if records.is_empty() {
            PipelineLogger::log_unresolved(term, "no candidates");
            return Ok(None);
        }

        let ceiling = self.config.calorie_density_ceiling;
        let selection = select_candidate(&tokenize(term), &records, self.config.min_match_ratio);
        if let Some(picked) = selection.filter(|picked| !picked.confident) {
            PipelineLogger::log_low_confidence(
                term,
                &picked.record.description,
                picked.score.overlap,
            );
        }

        let fact = selection
            .and_then(|picked| record_to_fact(term, picked.record, ceiling))
            .or_else(|| {
                records
                    .iter()
                    .find_map(|record| record_to_fact(term, record, ceiling))
            });
        if fact.is_none() {
            PipelineLogger::log_unresolved(term, "all candidates rejected");
        }
        Ok(fact)
    }

    fn store(&mut self, key: &str, slot: CacheSlot) {
        let sorted = sorted_token_key(key);
        if !sorted.is_empty() && sorted != key {
            self.cache.insert(sorted, slot.clone());
        }
        self.cache.insert(key.to_owned(), slot);
    }
}

fn cache_key(term: &str) -> String {
    term.trim().to_lowercase()
}
