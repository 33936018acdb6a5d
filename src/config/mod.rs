//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{fmt, net::SocketAddr, num::NonZeroU64, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;
#[cfg(test)]
mod tests;

pub use cli::{CliArgs, CmsModeArg, CmsOverrides, Command, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_API_HOST: &str = "api.contentstack.io";
const DEFAULT_CDN_HOST: &str = "cdn.contentstack.io";
const DEFAULT_ENVIRONMENT: &str = "production";
const DEFAULT_LOCALE: &str = "en-us";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_POLL_ATTEMPTS: u32 = 5;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_RECENT_WINDOW_SECS: u64 = 30;
const DEFAULT_ENTRY_DELAY_MS: u64 = 1_000;
const DEFAULT_PUBLISH_DELAY_MS: u64 = 500;
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_AVATAR_LIMIT_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_HOME_TTL_SECS: u64 = 30;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub setup: SetupSettings,
    pub provisioning: ProvisioningSettings,
    pub uploads: UploadSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmsMode {
    Contentstack,
    Memory,
}

impl CmsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CmsMode::Contentstack => "contentstack",
            CmsMode::Memory => "memory",
        }
    }
}

impl FromStr for CmsMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contentstack" => Ok(CmsMode::Contentstack),
            "memory" => Ok(CmsMode::Memory),
            other => Err(format!("unknown mode `{other}` (expected contentstack|memory)")),
        }
    }
}

impl From<CmsModeArg> for CmsMode {
    fn from(value: CmsModeArg) -> Self {
        match value {
            CmsModeArg::Contentstack => CmsMode::Contentstack,
            CmsModeArg::Memory => CmsMode::Memory,
        }
    }
}

/// Connection settings for the headless CMS. Credentials stay optional here;
/// the client refuses to call an API whose token is missing.
#[derive(Clone)]
pub struct CmsSettings {
    pub mode: CmsMode,
    pub api_key: Option<String>,
    pub delivery_token: Option<String>,
    pub management_token: Option<String>,
    pub api_host: String,
    pub cdn_host: String,
    pub environment: String,
    pub locale: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for CmsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted(value: &Option<String>) -> &'static str {
            if value.is_some() { "<set>" } else { "<unset>" }
        }

        f.debug_struct("CmsSettings")
            .field("mode", &self.mode)
            .field("api_key", &redacted(&self.api_key))
            .field("delivery_token", &redacted(&self.delivery_token))
            .field("management_token", &redacted(&self.management_token))
            .field("api_host", &self.api_host)
            .field("cdn_host", &self.cdn_host)
            .field("environment", &self.environment)
            .field("locale", &self.locale)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SetupSettings {
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub recent_window: Duration,
}

#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    pub entry_delay: Duration,
    pub publish_delay: Duration,
    pub auto: bool,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_request_bytes: NonZeroU64,
    pub max_avatar_bytes: NonZeroU64,
}

/// Lifetime of the rendered home page. Zero turns the cache off.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub home_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cms_overrides(&cli.cms);
    if let Some(Command::Serve(args)) = cli.command.as_ref() {
        raw.apply_serve_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

impl Settings {
    /// Built-in defaults with no file, environment or CLI input.
    pub fn defaults() -> Result<Self, LoadError> {
        Self::from_raw(RawSettings::default())
    }

    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            setup,
            provisioning,
            uploads,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cms: build_cms_settings(cms)?,
            setup: build_setup_settings(setup),
            provisioning: build_provisioning_settings(provisioning),
            uploads: build_upload_settings(uploads)?,
            cache: CacheSettings {
                home_ttl: Duration::from_secs(
                    cache.home_ttl_seconds.unwrap_or(DEFAULT_HOME_TTL_SECS),
                ),
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    setup: RawSetupSettings,
    provisioning: RawProvisioningSettings,
    uploads: RawUploadSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_cms_overrides(&mut self, overrides: &CmsOverrides) {
        if let Some(mode) = overrides.mode {
            self.cms.mode = Some(CmsMode::from(mode).as_str().to_string());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.cms.api_key = Some(key.clone());
        }
        if let Some(token) = overrides.delivery_token.as_ref() {
            self.cms.delivery_token = Some(token.clone());
        }
        if let Some(token) = overrides.management_token.as_ref() {
            self.cms.management_token = Some(token.clone());
        }
        if let Some(host) = overrides.api_host.as_ref() {
            self.cms.api_host = Some(host.clone());
        }
        if let Some(host) = overrides.cdn_host.as_ref() {
            self.cms.cdn_host = Some(host.clone());
        }
        if let Some(environment) = overrides.environment.as_ref() {
            self.cms.environment = Some(environment.clone());
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(auto) = overrides.provisioning_auto {
            self.provisioning.auto = Some(auto);
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
        if let Some(limit) = overrides.uploads_max_avatar_bytes {
            self.uploads.max_avatar_bytes = Some(limit);
        }
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;
    let graceful_shutdown = Duration::from_secs(
        server
            .graceful_shutdown_seconds
            .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS),
    );

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let mode = match cms.mode {
        Some(mode) => {
            CmsMode::from_str(&mode).map_err(|reason| LoadError::invalid("cms.mode", reason))?
        }
        None => CmsMode::Contentstack,
    };

    let api_host = non_blank(cms.api_host).unwrap_or_else(|| DEFAULT_API_HOST.to_string());
    let cdn_host = non_blank(cms.cdn_host).unwrap_or_else(|| DEFAULT_CDN_HOST.to_string());
    let environment =
        non_blank(cms.environment).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    let locale = non_blank(cms.locale).unwrap_or_else(|| DEFAULT_LOCALE.to_string());

    let timeout_secs = cms
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "cms.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CmsSettings {
        mode,
        api_key: non_blank(cms.api_key),
        delivery_token: non_blank(cms.delivery_token),
        management_token: non_blank(cms.management_token),
        api_host,
        cdn_host,
        environment,
        locale,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_setup_settings(setup: RawSetupSettings) -> SetupSettings {
    SetupSettings {
        poll_attempts: setup.poll_attempts.unwrap_or(DEFAULT_POLL_ATTEMPTS),
        poll_interval: Duration::from_millis(
            setup.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        ),
        recent_window: Duration::from_secs(
            setup
                .recent_window_seconds
                .unwrap_or(DEFAULT_RECENT_WINDOW_SECS),
        ),
    }
}

fn build_provisioning_settings(provisioning: RawProvisioningSettings) -> ProvisioningSettings {
    ProvisioningSettings {
        entry_delay: Duration::from_millis(
            provisioning.entry_delay_ms.unwrap_or(DEFAULT_ENTRY_DELAY_MS),
        ),
        publish_delay: Duration::from_millis(
            provisioning
                .publish_delay_ms
                .unwrap_or(DEFAULT_PUBLISH_DELAY_MS),
        ),
        auto: provisioning.auto.unwrap_or(true),
    }
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    let max_avatar_bytes = NonZeroU64::new(
        uploads
            .max_avatar_bytes
            .unwrap_or(DEFAULT_AVATAR_LIMIT_BYTES),
    )
    .ok_or_else(|| LoadError::invalid("uploads.max_avatar_bytes", "must be greater than zero"))?;
    if max_avatar_bytes > max_request_bytes {
        return Err(LoadError::invalid(
            "uploads.max_avatar_bytes",
            "must not exceed uploads.max_request_bytes",
        ));
    }

    Ok(UploadSettings {
        max_request_bytes,
        max_avatar_bytes,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    mode: Option<String>,
    api_key: Option<String>,
    delivery_token: Option<String>,
    management_token: Option<String>,
    api_host: Option<String>,
    cdn_host: Option<String>,
    environment: Option<String>,
    locale: Option<String>,
    request_timeout_seconds: Option<u64>,
}

impl fmt::Debug for RawCmsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCmsSettings")
            .field("mode", &self.mode)
            .field("api_host", &self.api_host)
            .field("cdn_host", &self.cdn_host)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSetupSettings {
    poll_attempts: Option<u32>,
    poll_interval_ms: Option<u64>,
    recent_window_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawProvisioningSettings {
    entry_delay_ms: Option<u64>,
    publish_delay_ms: Option<u64>,
    auto: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_request_bytes: Option<u64>,
    max_avatar_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    home_ttl_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
