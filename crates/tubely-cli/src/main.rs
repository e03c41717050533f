//! Tubely CLI: run the video ingestion pipeline from the command line.
//!
//! Configuration comes from the environment (or `.env`); see `TubelyConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tubely_cli::{content_type_for_path, init_tracing};
use tubely_core::{AspectRatio, TubelyConfig, Video};
use tubely_processing::{
    FfprobeProber, InMemoryVideoRepository, MediaProber, UploadRequest, VideoUploadPipeline,
    VideoUrlSigner,
};
use tubely_storage::create_storage;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tubely", about = "Tubely video ingestion CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, remux and store a video, then print it with a signed URL
    Upload {
        /// Path to the video file
        file: PathBuf,
        /// Video UUID (generated when omitted)
        #[arg(long)]
        video_id: Option<Uuid>,
        /// Owner UUID (generated when omitted)
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
        /// Title stored on the video record
        #[arg(long, default_value = "Untitled")]
        title: String,
    },
    /// Print the geometry and aspect classification of a video file
    Probe {
        /// Path to the video file
        file: PathBuf,
    },
    /// Print a fresh signed URL for a stored key
    Sign {
        /// Object key, e.g. landscape/<id>.mp4
        key: String,
    },
}

#[derive(Serialize)]
struct ProbeOutput {
    width: u32,
    height: u32,
    aspect_ratio: AspectRatio,
}

#[derive(Serialize)]
struct SignOutput<'a> {
    key: &'a str,
    url: String,
    expires_in_secs: u64,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = TubelyConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Upload {
            file,
            video_id,
            user_id,
            content_type,
            title,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let content_type =
                content_type.unwrap_or_else(|| content_type_for_path(&file).to_string());

            let mut video = Video::new(user_id.unwrap_or_else(Uuid::new_v4), title, "");
            if let Some(id) = video_id {
                video.id = id;
            }

            tracing::info!(
                video_id = %video.id,
                file = %file.display(),
                content_type = %content_type,
                size_bytes = data.len(),
                "Uploading video"
            );

            let repository = Arc::new(InMemoryVideoRepository::new());
            repository.insert(video.clone()).await;

            let storage = create_storage(&config)
                .await
                .context("Failed to initialize storage")?;
            let pipeline =
                VideoUploadPipeline::from_config(&config, repository, storage.clone())?;
            let signer = VideoUrlSigner::from_config(storage, &config);

            let updated = pipeline
                .process(UploadRequest {
                    video_id: video.id,
                    user_id: video.user_id,
                    content_type,
                    data: data.into(),
                })
                .await?;

            print_json(&signer.sign_video(updated).await?)?;
        }
        Commands::Probe { file } => {
            let prober = FfprobeProber::from_config(&config)?;
            let result = prober.probe(&file).await?;
            print_json(&ProbeOutput {
                width: result.width,
                height: result.height,
                aspect_ratio: result.aspect_ratio(),
            })?;
        }
        Commands::Sign { key } => {
            let storage = create_storage(&config)
                .await
                .context("Failed to initialize storage")?;
            let signer = VideoUrlSigner::from_config(storage, &config);
            let url = signer.sign(&key).await?;
            print_json(&SignOutput {
                key: &key,
                url,
                expires_in_secs: signer.ttl().as_secs(),
            })?;
        }
    }

    Ok(())
}
