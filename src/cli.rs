//! Command Line Interface (CLI) arguments.

use clap::Parser;

/// Belly button biodiversity server command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "BELLYBUTTON_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 5000, env = "BELLYBUTTON_PORT")]
    pub port: u16,
    /// Path to the read-only SQLite database holding the biodiversity dataset
    #[arg(
        long,
        default_value = "DataSets/belly_button_biodiversity.sqlite",
        env = "BELLYBUTTON_DATABASE"
    )]
    pub database: String,
    /// Maximum number of pooled database connections
    #[arg(
        long,
        default_value_t = 5,
        env = "BELLYBUTTON_CONNECTION_LIMIT",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub connection_limit: u32,
    /// Maximum time in seconds a request waits for a pooled database connection
    #[arg(long, default_value_t = 5, env = "BELLYBUTTON_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: u64,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "BELLYBUTTON_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/bellybutton/certs/cert.pem",
        env = "BELLYBUTTON_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/bellybutton/certs/key.pem",
        env = "BELLYBUTTON_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "BELLYBUTTON_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "BELLYBUTTON_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
