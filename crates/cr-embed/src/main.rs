use std::fs;
use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use thiserror::Error;
use tracing::info;

use cr_common::embedding::{create_embedder, load_config_from_env};
use cr_common::logging::init_tracing_subscriber;
use cr_common::Circle;

/// circles.json の埋め込みを事前計算して circle_embeddings.json を生成する。
/// サービスと同じ埋め込み設定を使うことで、保存ベクトルとクエリベクトルが
/// 同一空間に乗ることを保証する。
#[derive(Debug, Parser)]
#[command(
    name = "cr-embed",
    about = "Precompute circle embeddings for the recommendation service"
)]
struct Cli {
    /// Path to circles.json
    #[arg(long, env = "CR_CIRCLES_PATH", default_value = "data/circles.json")]
    input: PathBuf,

    /// Output path for the embedding vectors
    #[arg(long, env = "CR_EMBEDDINGS_PATH", default_value = "data/circle_embeddings.json")]
    output: PathBuf,

    /// Embedder implementation name
    #[arg(long, env = "CR_EMBEDDER", default_value = "hash")]
    embedder: String,
}

#[derive(Debug, Error)]
enum EmbedCliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize embeddings: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn run(cli: Cli) -> Result<(), EmbedCliError> {
    let input_path = cli.input.display().to_string();
    let text = fs::read_to_string(&cli.input).map_err(|source| EmbedCliError::Read {
        path: input_path.clone(),
        source,
    })?;
    let circles: Vec<Circle> =
        serde_json::from_str(&text).map_err(|source| EmbedCliError::Parse {
            path: input_path,
            source,
        })?;

    let embedder = create_embedder(&cli.embedder, load_config_from_env());

    let embeddings: Vec<Vec<f32>> = circles
        .iter()
        .map(|circle| embedder.embed_circle(circle).vector)
        .collect();

    let json = serde_json::to_string(&embeddings).map_err(EmbedCliError::Serialize)?;
    fs::write(&cli.output, json).map_err(|source| EmbedCliError::Write {
        path: cli.output.display().to_string(),
        source,
    })?;

    info!(
        circles = circles.len(),
        dimension = embedder.dimension(),
        embedder = embedder.name(),
        version = embedder.version(),
        output = %cli.output.display(),
        "circle embeddings written"
    );

    Ok(())
}

fn main() {
    dotenv().ok();
    init_tracing_subscriber("cr-embed");

    if let Err(err) = run(Cli::parse()) {
        tracing::error!(error = %err, "cr-embed failed");
        std::process::exit(1);
    }
}
