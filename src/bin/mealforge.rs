// ABOUTME: mealforge CLI - runs meal plan requests and exposes the normalizer and decoder
// ABOUTME: Wires the OpenAI-compatible generator and USDA or stub fact providers from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Generate a meal plan (needs LLM_API_KEY and USDA_API_KEY)
//! mealforge plan --request request.json
//!
//! # Resolve facts from a local food list instead of the USDA API
//! mealforge plan --request request.json --stub-facts foods.json --format pretty
//!
//! # Normalize ingredient strings
//! mealforge normalize "1 1/2 cups rolled oats (120 g)" "2 eggs"
//!
//! # Decode a saved model response
//! mealforge decode response.txt
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mealforge::config::PipelineConfig;
use mealforge::decoder::decode_text;
use mealforge::ingredients::normalize_text;
use mealforge::llm::OpenAiCompatibleGenerator;
use mealforge::logging::LoggingConfig;
use mealforge::nutrition::{FactProvider, StubFactProvider, UsdaClientConfig, UsdaFactProvider};
use mealforge::orchestrator::{GenerationOrchestrator, MealPlanRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "mealforge",
    about = "Meal plan generation with verified nutrition",
    long_about = "Generates meal plans with a language model, then decodes, normalizes, verifies, and filters them."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a meal plan request
    Plan {
        /// JSON file holding the request tiers, calorie rules, and favorites
        #[arg(long)]
        request: PathBuf,

        /// JSON food list used instead of the USDA API
        #[arg(long)]
        stub_facts: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Normalize ingredient strings
    Normalize {
        /// Ingredient text, one per argument
        #[arg(required = true)]
        ingredients: Vec<String>,
    },

    /// Decode a saved generator response
    Decode {
        /// File holding the raw response text
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Single-line JSON
    Json,
    /// Indented JSON
    Pretty,
}

fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
    };
    println!("{text}");
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

async fn run_plan(request: &Path, stub_facts: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = PipelineConfig::load()?;
    let request: MealPlanRequest = serde_json::from_str(&read_file(request)?)
        .with_context(|| format!("Invalid request JSON in {}", request.display()))?;

    let provider: Arc<dyn FactProvider> = match stub_facts {
        Some(path) => Arc::new(StubFactProvider::from_json_file(path)?),
        None => Arc::new(UsdaFactProvider::new(UsdaClientConfig::from_env(
            config.timeouts.provider_secs,
        )?)?),
    };
    let generator = Arc::new(OpenAiCompatibleGenerator::from_env(
        config.timeouts.generator_secs,
    )?);
    info!(provider = provider.name(), "Starting meal plan request");

    let orchestrator = GenerationOrchestrator::new(generator, provider, config);
    let outcome = orchestrator.plan(&request).await;
    print_json(&outcome, format)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".to_owned();
    }
    logging.init()?;

    match cli.command {
        Command::Plan {
            request,
            stub_facts,
            format,
        } => run_plan(&request, stub_facts.as_deref(), format).await?,
        Command::Normalize { ingredients } => {
            let entries: Vec<_> = ingredients.iter().map(|text| normalize_text(text)).collect();
            print_json(&entries, OutputFormat::Pretty)?;
        }
        Command::Decode { file } => {
            let decoded = decode_text(&read_file(&file)?);
            print_json(&decoded, OutputFormat::Pretty)?;
        }
    }
    Ok(())
}
