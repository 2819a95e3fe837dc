use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

mod camera;
mod config;
mod engine;
mod interaction;
mod math;
mod model;
mod persistence;
mod rendering;
mod scene;
mod scene_graph;
mod ui;
mod window;

use crate::{config::EditorConfig, engine::EditorState, persistence::PersistenceClient};

#[derive(Debug, Parser)]
#[command(name = "duckpond", about = "Drag and rotate glTF models on a ground grid")]
struct Args {
    /// Config file; defaults to ./duckpond.toml when present
    #[arg(short, long, env = "DUCKPOND_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = EditorConfig::load(args.config.as_deref()).context("Failed to load config")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("duckpond-io")
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let store = config.persistence.build_store()?;
    log::info!("Persisting to {}", config.persistence.describe());
    let persistence = PersistenceClient::new(store, runtime.handle().clone());

    let state = EditorState::new(&config, persistence)?;
    pollster::block_on(window::run(config.window_title.clone(), state))?;

    Ok(())
}
