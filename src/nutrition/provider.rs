// ABOUTME: Nutrition fact provider trait abstracting the external food database
// ABOUTME: Providers return raw candidate records; ranking happens in the resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use mealforge_core::errors::AppResult;
use mealforge_core::models::FoodRecord;

/// Source of candidate food records for an ingredient term
///
/// Results may be empty and are never assumed authoritative.
#[async_trait]
pub trait FactProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Search records matching a term within the given datasets
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot be reached or answers with
    /// an unusable payload.
    async fn search(
        &self,
        term: &str,
        page_size: u32,
        data_types: &[String],
    ) -> AppResult<Vec<FoodRecord>>;
}
