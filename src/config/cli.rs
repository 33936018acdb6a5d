use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Personal bio site backed by a headless CMS")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub cms: CmsOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve(Box<ServeArgs>),
    /// Create the content types and seed sample entries, then exit.
    Provision,
    /// Print content-type and setup status as JSON, then exit.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CmsModeArg {
    Contentstack,
    Memory,
}

/// CMS settings shared by every subcommand. The vendor variable names are
/// accepted so an existing `.env` keeps working.
#[derive(Debug, Args, Default, Clone)]
pub struct CmsOverrides {
    /// Content store backend.
    #[arg(long = "cms-mode", value_enum, global = true)]
    pub mode: Option<CmsModeArg>,

    /// Stack API key.
    #[arg(long = "cms-api-key", env = "CONTENTSTACK_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Delivery token for published reads.
    #[arg(
        long = "cms-delivery-token",
        env = "CONTENTSTACK_DELIVERY_TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub delivery_token: Option<String>,

    /// Management token for writes.
    #[arg(
        long = "cms-management-token",
        env = "CONTENTSTACK_MANAGEMENT_TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub management_token: Option<String>,

    /// Management API host.
    #[arg(long = "cms-api-host", env = "CONTENTSTACK_API_HOST", value_name = "HOST", global = true)]
    pub api_host: Option<String>,

    /// Delivery API host.
    #[arg(long = "cms-cdn-host", env = "CONTENTSTACK_CDN", value_name = "HOST", global = true)]
    pub cdn_host: Option<String>,

    /// Publishing environment.
    #[arg(long = "cms-environment", env = "CONTENTSTACK_ENVIRONMENT", global = true)]
    pub environment: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle provisioning on the first content read.
    #[arg(
        long = "provisioning-auto",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub provisioning_auto: Option<bool>,

    /// Override the maximum request body size in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,

    /// Override the maximum avatar size in bytes.
    #[arg(long = "uploads-max-avatar-bytes", value_name = "BYTES")]
    pub uploads_max_avatar_bytes: Option<u64>,
}
