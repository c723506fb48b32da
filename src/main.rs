use anyhow::{Context, Result, anyhow};
use seoforge::cli::{Args, ExecuteConfig, ExecutionMode};
use seoforge::mcp::catalogue;
use seoforge::{ConfigDiscovery, ServiceConfig, ServiceManager, ToolResponse};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only JSON envelopes
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mode = args.mode().map_err(|e| anyhow!(e))?;

    match mode {
        ExecutionMode::ListTools => print_json(&catalogue(), true),
        ExecutionMode::Status => run_status(&args).await,
        ExecutionMode::Execute(config) => run_execute(&args, config).await,
        ExecutionMode::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
        ExecutionMode::InitConfig => {
            let path = ConfigDiscovery::create_default_user_config()?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> Result<ServiceConfig> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration override from: {:?}", path);
            ServiceConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?
        }
        None => ConfigDiscovery::discover_config()?,
    };
    config.validate()?;
    Ok(config)
}

async fn start_manager(args: &Args) -> Result<ServiceManager> {
    let manager = ServiceManager::from_env(load_config(args)?)?;
    manager.initialize().await?;
    Ok(manager)
}

async fn run_status(args: &Args) -> Result<()> {
    let manager = start_manager(args).await?;

    let status = json!({
        "services": manager.get_service_status().await,
        "providers": manager.provider_availability(),
        "cache": manager.cache_stats().await,
        "rate_limits": manager.rate_limit_status("anonymous").await,
    });
    print_json(&status, true)?;

    manager.shutdown().await?;
    Ok(())
}

async fn run_execute(args: &Args, config: ExecuteConfig) -> Result<()> {
    let requests = config.source.load()?;
    let manager = start_manager(args).await?;
    info!("Executing {} tool request(s)", requests.len());

    let mut failures = 0usize;
    for request in requests {
        let response: ToolResponse = manager.execute_tool(request).await;
        if !response.success {
            failures += 1;
        }
        print_json(&response, config.pretty)?;
    }

    manager.shutdown().await?;

    if failures > 0 {
        warn!("{} tool request(s) failed", failures);
        std::process::exit(1);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}
