mod artifact;
mod batch;
mod config;
mod db;
mod document;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod render;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifact::{PgJobStore, S3ObjectStore};
use crate::batch::BatchCoordinator;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::pipeline::{LlmJobAnalyzer, LlmRewriter, PipelineDeps};
use crate::render::GotenbergLauncher;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvbatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Rendering engine launcher; each batch launches one engine instance
    let launcher = GotenbergLauncher::new(&config.render_service_url)?;
    info!(
        "Render service at {} (timeout {:?}, max concurrent jobs {})",
        config.render_service_url, config.render_timeout, config.max_concurrent_jobs
    );

    let deps = PipelineDeps {
        analyzer: Arc::new(LlmJobAnalyzer::new(llm.clone())),
        rewriter: Arc::new(LlmRewriter::new(llm)),
        objects: Arc::new(S3ObjectStore::new(
            s3,
            config.s3_bucket.clone(),
            &config.s3_public_url,
        )),
        jobs: Arc::new(PgJobStore::new(db)),
    };
    let coordinator = BatchCoordinator::new(
        deps,
        Arc::new(launcher),
        config.render_timeout,
        config.max_concurrent_jobs,
    );

    // Build app state
    let state = AppState {
        coordinator: Arc::new(coordinator),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "cvbatch-static",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO only serves path-style bucket addressing.
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
