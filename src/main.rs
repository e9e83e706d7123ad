use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vulnscan::cli::{self, Commands};
use vulnscan::config::{self, LogFormat, LoggingConfig};
use vulnscan::errors::VulnscanError;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Logging settings live in the config file, so load it before the subscriber starts.
    let loaded = match &cli.command {
        Commands::Serve(args) => Some(config::parse_config(Path::new(&args.config)).await),
        Commands::CreateAdmin(args) => Some(config::parse_config(Path::new(&args.config)).await),
        Commands::Validate(_) => None,
    };
    let logging = match &loaded {
        Some(Ok(config)) => config.logging.clone(),
        _ => LoggingConfig::default(),
    };
    init_tracing(&logging, cli.verbose, cli.no_color);

    let result = match (cli.command, loaded) {
        (_, Some(Err(e))) => Err(e),
        (Commands::Serve(args), Some(Ok(config))) => cli::serve::handle_serve(args, config).await,
        (Commands::CreateAdmin(args), Some(Ok(config))) => {
            cli::admin::handle_create_admin(args, &config)
        }
        (Commands::Validate(args), _) => handle_validate(&args.config).await,
        (_, None) => Err(VulnscanError::Internal("configuration was not loaded".into())),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            VulnscanError::Config(_) | VulnscanError::Yaml(_) => 2,
            VulnscanError::Database(_) => 3,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: u8, no_color: bool) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_ansi(!no_color).init(),
    }
}

async fn handle_validate(path: &str) -> Result<(), VulnscanError> {
    let config = config::parse_config(Path::new(path)).await?;
    println!("Configuration is valid: {}", path);
    println!("  server:   {}:{}", config.server.host, config.server.port);
    println!("  database: {}", config.database.path);
    println!("  scanner:  {}", config.scanner.socket_path);
    match &config.llm {
        Some(llm) => println!("  ai:       {}", llm.provider.as_deref().unwrap_or("gemini")),
        None => println!("  ai:       disabled"),
    }
    Ok(())
}
