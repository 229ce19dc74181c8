mod config;
mod errors;
mod logging;
mod resolver;
mod responder;
mod security;
mod server;

use crate::config::{canonical_root, Config};
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("dashserve.toml");
    let mut explicit_config = false;
    let mut data_dir: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--config requires a path");
                    std::process::exit(2);
                }
                config_path = PathBuf::from(&args[i]);
                explicit_config = true;
            }
            "--data-dir" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--data-dir requires a path");
                    std::process::exit(2);
                }
                data_dir = Some(args[i].clone());
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let mut cfg = if explicit_config {
        Config::load(&config_path)
    } else {
        Config::load_or_default(&config_path)
    }
    .context("loading config")?;
    cfg.apply_env().context("reading environment")?;
    cfg.apply_overrides(data_dir, None)?;
    cfg.validate().context("validating config")?;

    logging::init(cfg.logging.format);

    let root = canonical_root(&cfg.data.root_dir).context("canonicalizing data root")?;
    info!(
        root = %root.display(),
        mount = %cfg.data.mount,
        assets = ?cfg.assets.as_ref().map(|a| a.dir.display().to_string()),
        "dashserve ready"
    );

    server::serve(cfg, root).await
}
