use anyhow::{anyhow, Context, Result};
use cardio_predict::{
    config::ArtifactConfig,
    ml::{ArtifactBundle, PredictionService, RawRecord, UnknownModelPolicy},
};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cardio-cli")]
#[command(about = "Heart disease prediction CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CARDIO_ENDPOINT", default_value = "http://localhost:8000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict locally from the artifacts on disk
    Predict {
        /// Directory holding the four artifacts
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Model to use: logistic or tree
        #[arg(short, long, default_value = "logistic")]
        model: String,

        /// Answer unknown model names with an error instead of the decision tree
        #[arg(long)]
        strict: bool,

        /// Clinical fields as name=value, e.g. age=63 oldpeak=2.3
        #[arg(value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Show the loaded feature schema and models
    Inspect {
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,
    },

    /// Send a prediction request to a running server
    Remote {
        #[arg(short, long, default_value = "logistic")]
        model: String,

        #[arg(value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            artifacts,
            model,
            strict,
            fields,
        } => {
            let policy = if strict {
                UnknownModelPolicy::Reject
            } else {
                UnknownModelPolicy::Fallback
            };
            let service = load_service(artifacts, policy)?;

            let pairs = parse_pairs(&fields)?;
            let record = RawRecord::from_pairs(
                pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                &service.bundle().input(),
            )?;

            let prediction = service.predict_named(&record, &model)?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }

        Commands::Inspect { artifacts } => {
            let service = load_service(artifacts, UnknownModelPolicy::default())?;
            let bundle = service.bundle();

            println!("Feature columns ({}):", bundle.schema().len());
            for (i, column) in bundle.schema().columns().iter().enumerate() {
                println!("  {:>2}  {}", i, column);
            }
            println!();
            println!("Categorical levels:");
            for field in bundle.input().categorical() {
                println!("  {:<8} {:?}", field.name, bundle.schema().levels(field.name));
            }
            println!();
            println!("Models:");
            for meta in service.models() {
                println!(
                    "  {:<22} features={} parameters={} scaled_input={}",
                    meta.name, meta.n_features, meta.parameters, meta.scaled_input
                );
            }
        }

        Commands::Remote { model, fields } => {
            let mut body: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();
            body.insert("model".to_string(), serde_json::Value::String(model));
            for (name, text) in parse_pairs(&fields)? {
                let value: serde_json::Value = serde_json::from_str(&text)
                    .with_context(|| format!("value of '{}' is not a number: {}", name, text))?;
                body.insert(name, value);
            }

            let response = Client::new()
                .post(format!("{}/v1/predict", cli.endpoint))
                .json(&body)
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let response = Client::new()
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

fn load_service(dir: PathBuf, policy: UnknownModelPolicy) -> Result<PredictionService> {
    let config = ArtifactConfig::default().with_dir(dir);
    let bundle = ArtifactBundle::load(&config)
        .with_context(|| format!("loading artifacts from {}", config.dir.display()))?;
    Ok(PredictionService::new(Arc::new(bundle), policy))
}

fn parse_pairs(fields: &[String]) -> Result<HashMap<String, String>> {
    fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", field))
        })
        .collect()
}
