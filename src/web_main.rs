//! 边缘翻译代理主程序入口

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use edge_translator::env::{self, EnvVar};
use edge_translator::gateway::Gateway;
use edge_translator::network::HttpOrigin;
use edge_translator::translation::{ConfigManager, MemoryEdgeCache};
use edge_translator::web::{AppState, WebConfig, WebServer};

#[derive(Parser, Debug)]
#[command(
    name = "edge-translator",
    version,
    about = "Request-time HTML translation proxy with edge caching",
    after_help = env_help()
)]
struct Args {
    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Port number
    #[arg(short, long)]
    port: Option<u16>,

    /// Origin that serves the untranslated site
    #[arg(short, long)]
    origin: Option<String>,

    /// Translation config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn env_help() -> String {
    let mut help = String::from("ENVIRONMENT:\n");
    for (name, description) in env::describe_all() {
        help.push_str(&format!("    {:<32} {}\n", name, description));
    }
    help
}

fn init_tracing() {
    let level = env::core::LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut web_config = WebConfig::default();
    if let Some(bind) = args.bind {
        web_config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        web_config.port = port;
    }
    if let Some(origin) = args.origin {
        web_config.origin_url = origin;
    }
    web_config.config_path = args.config;
    web_config.validate()?;

    let manager = ConfigManager::load(web_config.config_path.as_deref())?;
    if let Some(path) = manager.config_path() {
        tracing::info!("使用配置文件: {}", path.display());
    }
    let config = manager.into_config();

    let origin = Arc::new(HttpOrigin::new(
        &web_config.origin_url,
        web_config.origin_timeout,
    )?);
    let cache = Arc::new(MemoryEdgeCache::new(&config.cache));
    let gateway = Gateway::from_config(&config, origin, cache)?;

    tracing::info!(
        "默认语言: {}，可翻译语言: {}",
        config.languages.default,
        config.languages.alternates.join(", ")
    );

    let server = WebServer::new(web_config, AppState::new(Arc::new(gateway)));
    server.start().await?;

    Ok(())
}
