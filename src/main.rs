use clap::Parser;
use synthbot::cli::{Cli, Commands};
use synthbot::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = synthbot::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting trading engine");
            args.execute(config).await?;
        }
        Commands::Status => {
            println!("synthbot status");
            println!("  Mode: {:?}", config.client.mode);
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Symbols: {}", config.feed.symbols.join(", "));
            println!("  Timeframes: {:?}s", config.trend.timeframes);
            println!(
                "  Stake: base={} multiplier={} cap={}",
                config.stake.base_stake, config.stake.multiplier, config.stake.max_loss_cap
            );
            println!("  Client: {:?}", config.client.mode);
        }
    }

    Ok(())
}
