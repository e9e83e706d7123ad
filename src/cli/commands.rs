use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vulnscan", version, about = "REST gateway for an OpenVAS vulnerability scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP REST API server
    Serve(ServeArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Create an admin account in the local database
    CreateAdmin(CreateAdminArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: String,

    /// Listen address (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides server.port)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    pub config: String,
}

#[derive(Args, Clone)]
pub struct CreateAdminArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: String,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["vulnscan", "-vv", "serve", "--config", "c.yaml", "--port", "8080"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.config, "c.yaml");
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host, None);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_create_admin_requires_password() {
        let parsed = Cli::try_parse_from([
            "vulnscan", "create-admin", "--config", "c.yaml", "--username", "root", "--email", "r@x.io",
        ]);
        assert!(parsed.is_err());
    }
}
