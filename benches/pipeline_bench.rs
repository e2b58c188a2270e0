// ABOUTME: Criterion benchmarks for the meal pipeline's local stages
// ABOUTME: Measures decoding, ingredient normalization, and macro aggregation over stub facts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the meal pipeline.
//!
//! Covers the stages that run without a generator: response decoding at
//! each recovery stage, free-text ingredient normalization, and macro
//! aggregation against the in-memory stub provider.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mealforge::aggregator::aggregate_all;
use mealforge::config::PipelineConfig;
use mealforge::decoder::decode_text;
use mealforge::ingredients::{build_candidate, normalize_text};
use mealforge::models::MealCandidate;
use mealforge::nutrition::{NutritionResolver, StubFactProvider};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::runtime::Runtime;

const INGREDIENT_LINES: &[&str] = &[
    "1 1/2 cups rolled oats (120 g)",
    "6 oz salmon fillet",
    "2 tbsp olive oil (240 kcal)",
    "1 medium banana (118 g)",
    "salt and pepper to taste",
    "200 g firm tofu, pressed and cubed",
    "1-/2 cup milk",
];

fn meal_objects(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "mealType": ["breakfast", "lunch", "dinner"][i % 3],
                "name": format!("Bench Meal {i}"),
                "ingredients": ["200 g tofu", "150 g rice", "1 cup spinach (30 g)", "salt to taste"],
                "instructions": "1. Press tofu 2. Cook rice 3. Wilt spinach",
                "calories": 500,
                "protein": 30,
                "carbs": 50,
                "fat": 15
            })
        })
        .collect()
}

fn document(count: usize) -> String {
    json!({ "meals": meal_objects(count) }).to_string()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in [1_usize, 6, 24] {
        let strict = document(count);
        group.throughput(Throughput::Bytes(strict.len() as u64));
        group.bench_with_input(BenchmarkId::new("strict", count), &strict, |b, text| {
            b.iter(|| black_box(decode_text(black_box(text))));
        });

        let fenced = format!("Here is your plan:\n```json\n{strict}\n```\nEnjoy!");
        group.bench_with_input(BenchmarkId::new("fenced", count), &fenced, |b, text| {
            b.iter(|| black_box(decode_text(black_box(text))));
        });

        // Cut mid-way through the last meal
        let truncated = strict[..strict.len() - 40].to_owned();
        group.bench_with_input(
            BenchmarkId::new("truncated", count),
            &truncated,
            |b, text| {
                b.iter(|| black_box(decode_text(black_box(text))));
            },
        );
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(INGREDIENT_LINES.len() as u64));

    group.bench_function("ingredient_lines", |b| {
        b.iter(|| {
            for line in INGREDIENT_LINES {
                black_box(normalize_text(black_box(line)));
            }
        });
    });

    let objects = meal_objects(6);
    group.bench_function("build_candidates_6", |b| {
        b.iter(|| {
            let meals: Vec<MealCandidate> = objects
                .iter()
                .filter_map(Value::as_object)
                .map(build_candidate)
                .collect();
            black_box(meals)
        });
    });

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("aggregate");
    let provider = Arc::new(StubFactProvider::with_standard_records());
    let config = PipelineConfig::default();

    for count in [1_usize, 6] {
        let template: Vec<MealCandidate> = meal_objects(count)
            .iter()
            .filter_map(Value::as_object)
            .map(build_candidate)
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("stub_provider", count),
            &template,
            |b, template| {
                b.iter(|| {
                    rt.block_on(async {
                        let mut meals = template.clone();
                        let mut resolver = NutritionResolver::new(
                            provider.clone(),
                            config.resolver.clone(),
                            config.timeouts.provider(),
                        );
                        aggregate_all(&mut meals, &mut resolver).await;
                        black_box(meals)
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_normalize, bench_aggregate);
criterion_main!(benches);
