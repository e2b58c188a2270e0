// ABOUTME: Nutrition resolution: provider trait, USDA and in-memory providers, ranking, resolver
// ABOUTME: Turns ingredient terms into authoritative per-serving nutrition facts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Fact provider trait
pub mod provider;

/// Term resolution with caching
pub mod resolver;

/// Candidate ranking and record conversion
pub mod scoring;

/// In-memory provider
pub mod stub;

/// USDA `FoodData` Central provider
pub mod usda;

pub use provider::FactProvider;
pub use resolver::{FactOrigin, NutritionResolver, Resolution, SharedFactCache};
pub use stub::{standard_records, StubFactProvider};
pub use usda::{UsdaClientConfig, UsdaFactProvider};
