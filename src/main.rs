// src/main.rs
use actix_web::{App, HttpServer, web};
use clap::Parser;
use cryptosim_miner_rs::cli::{Action, ConfigOptions, ServeOptions};
use cryptosim_miner_rs::config::{self, Config, StoreKind};
use cryptosim_miner_rs::{
    Commands, ControlStatus, Coordinator, CoordinatorError, HttpComputeClient, LoopSettings,
    MemoryStore, RedisStore, StoreBackend, api, init_logging,
};
use std::time::Duration;

/// Entry point: parses the command line and dispatches
fn main() -> Result<(), CoordinatorError> {
    let cli = Commands::parse();

    match cli.action {
        Action::Serve(opts) => serve(opts),
        Action::Config(opts) => generate_config(opts),
    }
}

/// Resolves configuration and runs the coordinator until shutdown
///
/// Precedence: CLI flags > environment > TOML file > defaults.
fn serve(opts: ServeOptions) -> Result<(), CoordinatorError> {
    init_logging(opts.verbose);

    let mut config = config::load(opts.config.as_deref())?;
    if let Some(port) = opts.port {
        config.port = port;
    }
    if opts.memory_store {
        config.store_backend = StoreKind::Memory;
    }
    config.validate()?;

    actix_web::rt::System::new().block_on(run(config))
}

async fn run(config: Config) -> Result<(), CoordinatorError> {
    let compute = HttpComputeClient::new(
        &config.rng_base()?,
        &config.hasher_base()?,
        Duration::from_millis(config.request_timeout_ms),
    )?;
    let store = match config.store_backend {
        StoreKind::Redis => {
            StoreBackend::Redis(RedisStore::connect(&config.redis_host, config.redis_port).await?)
        }
        StoreKind::Memory => {
            log::warn!("Using in-memory store; stats are not visible to other services");
            StoreBackend::Memory(MemoryStore::new())
        }
    };

    let coordinator = Coordinator::new(compute, store, LoopSettings::from(&config));
    // the store can outlive us; don't report a previous run's numbers
    coordinator.reset().await?;

    log::info!(
        "Coordinator listening on {}:{} (rng={}, hasher={}, difficulty={}, pacing={}ms, window={})",
        config.host,
        config.port,
        config.rng_url,
        config.hasher_url,
        config.difficulty,
        config.pacing_ms,
        config.window_size
    );

    let data = web::Data::new(coordinator.clone());
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(api::init_routes::<HttpComputeClient, StoreBackend>)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    if coordinator.stop().await == ControlStatus::Stopped {
        coordinator.join_loop().await;
    }
    log::info!("Coordinator shut down");
    Ok(())
}

/// Writes a commented configuration template
fn generate_config(opts: ConfigOptions) -> Result<(), CoordinatorError> {
    std::fs::write(&opts.output, config::generate_template())?;
    println!("Configuration template written to {}", opts.output.display());
    Ok(())
}
