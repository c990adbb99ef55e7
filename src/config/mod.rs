//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "unevent";
const ENV_PREFIX: &str = "UNEVENT";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_PAGE_CACHE_RESPONSE_LIMIT: usize = 500;
const DEFAULT_PAGE_CACHE_BODY_LIMIT_BYTES: usize = 1024 * 1024;
const DEFAULT_STAMP_TTL_SECS: u64 = 60 * 60;
const DEFAULT_STORE_CONNECT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_CDN_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Command-line arguments for the UN:EVENT binary.
#[derive(Debug, Parser)]
#[command(name = "unevent", version, about = "UN:EVENT cache revalidation services")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "UNEVENT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public frontend and admin listeners.
    Serve(Box<ServeArgs>),
    /// Send tags to the revalidation endpoint and the CDN once, then exit.
    Revalidate(RevalidateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

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

    /// Toggle the public page cache.
    #[arg(
        long = "page-cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub page_cache_enabled: Option<bool>,

    /// Override the shared store Redis URL.
    #[arg(long = "store-redis-url", value_name = "URL")]
    pub redis_url: Option<String>,

    #[command(flatten)]
    pub notify: NotifyOverrides,
}

/// Overrides shared by every command that sends tags.
#[derive(Debug, Args, Default, Clone)]
pub struct NotifyOverrides {
    /// Override the revalidation endpoint URL.
    #[arg(long = "revalidate-url", value_name = "URL")]
    pub revalidate_url: Option<String>,

    /// Override the outbound request timeout.
    #[arg(long = "outbound-timeout-seconds", value_name = "SECONDS")]
    pub outbound_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct RevalidateArgs {
    #[command(flatten)]
    pub notify: NotifyOverrides,

    /// Tags to revalidate.
    #[arg(value_name = "TAG", required = true, num_args = 1..)]
    pub tags: Vec<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub page_cache: PageCacheSettings,
    pub service: ServiceSettings,
    pub revalidate: RevalidateSettings,
    pub cdn: CdnSettings,
    pub store: StoreSettings,
    pub outbound: OutboundSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
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

#[derive(Debug, Clone)]
pub struct PageCacheSettings {
    pub enabled: bool,
    pub response_limit: usize,
    pub response_body_limit_bytes: usize,
}

/// Inbound service-to-service authentication.
#[derive(Clone)]
pub struct ServiceSettings {
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct RevalidateSettings {
    pub url: Option<Url>,
    /// Falls back to `service.token` when unset.
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct CdnSettings {
    pub api_token: Option<String>,
    pub zone_id: Option<String>,
    pub api_base: Url,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub redis_url: Option<String>,
    pub stamp_ttl: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OutboundSettings {
    pub timeout: Duration,
}

impl std::fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("token", &redacted(&self.token))
            .finish()
    }
}

impl std::fmt::Debug for RevalidateSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevalidateSettings")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("token", &redacted(&self.token))
            .finish()
    }
}

impl std::fmt::Debug for CdnSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnSettings")
            .field("api_token", &redacted(&self.api_token))
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "<redacted>" } else { "<unset>" }
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

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Revalidate(args)) => raw.apply_notify_overrides(&args.notify),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    page_cache: RawPageCacheSettings,
    service: RawServiceSettings,
    revalidate: RawRevalidateSettings,
    cdn: RawCdnSettings,
    store: RawStoreSettings,
    outbound: RawOutboundSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.page_cache_enabled {
            self.page_cache.enabled = Some(enabled);
        }
        if let Some(url) = overrides.redis_url.as_ref() {
            self.store.redis_url = Some(url.clone());
        }
        self.apply_notify_overrides(&overrides.notify);
    }

    fn apply_notify_overrides(&mut self, overrides: &NotifyOverrides) {
        if let Some(url) = overrides.revalidate_url.as_ref() {
            self.revalidate.url = Some(url.clone());
        }
        if let Some(seconds) = overrides.outbound_timeout_seconds {
            self.outbound.timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            page_cache,
            service,
            revalidate,
            cdn,
            store,
            outbound,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let page_cache = build_page_cache_settings(page_cache)?;
        let service = ServiceSettings {
            token: non_blank(service.token),
        };
        let revalidate = build_revalidate_settings(revalidate, &service)?;
        let cdn = build_cdn_settings(cdn)?;
        let store = build_store_settings(store)?;
        let outbound = build_outbound_settings(outbound)?;

        Ok(Self {
            server,
            logging,
            page_cache,
            service,
            revalidate,
            cdn,
            store,
            outbound,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }
    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;

    Ok(ServerSettings {
        public_addr,
        admin_addr,
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

fn build_page_cache_settings(
    page_cache: RawPageCacheSettings,
) -> Result<PageCacheSettings, LoadError> {
    let response_limit = page_cache
        .response_limit
        .unwrap_or(DEFAULT_PAGE_CACHE_RESPONSE_LIMIT);
    if response_limit == 0 {
        return Err(LoadError::invalid(
            "page_cache.response_limit",
            "must be greater than zero",
        ));
    }
    Ok(PageCacheSettings {
        enabled: page_cache.enabled.unwrap_or(true),
        response_limit,
        response_body_limit_bytes: page_cache
            .response_body_limit_bytes
            .unwrap_or(DEFAULT_PAGE_CACHE_BODY_LIMIT_BYTES),
    })
}

fn build_revalidate_settings(
    revalidate: RawRevalidateSettings,
    service: &ServiceSettings,
) -> Result<RevalidateSettings, LoadError> {
    let url = non_blank(revalidate.url)
        .map(|value| parse_http_url(&value, "revalidate.url"))
        .transpose()?;
    let token = non_blank(revalidate.token).or_else(|| service.token.clone());
    Ok(RevalidateSettings { url, token })
}

fn build_cdn_settings(cdn: RawCdnSettings) -> Result<CdnSettings, LoadError> {
    let api_base = non_blank(cdn.api_base).unwrap_or_else(|| DEFAULT_CDN_API_BASE.to_string());
    Ok(CdnSettings {
        api_token: non_blank(cdn.api_token),
        zone_id: non_blank(cdn.zone_id),
        api_base: parse_http_url(&api_base, "cdn.api_base")?,
    })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let stamp_ttl_seconds = store.stamp_ttl_seconds.unwrap_or(DEFAULT_STAMP_TTL_SECS);
    if stamp_ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "store.stamp_ttl_seconds",
            "must be greater than zero",
        ));
    }
    let connect_timeout_ms = store
        .connect_timeout_ms
        .unwrap_or(DEFAULT_STORE_CONNECT_TIMEOUT_MS);
    if connect_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "store.connect_timeout_ms",
            "must be greater than zero",
        ));
    }
    Ok(StoreSettings {
        redis_url: non_blank(store.redis_url),
        stamp_ttl: Duration::from_secs(stamp_ttl_seconds),
        connect_timeout: Duration::from_millis(connect_timeout_ms),
    })
}

fn build_outbound_settings(outbound: RawOutboundSettings) -> Result<OutboundSettings, LoadError> {
    let timeout_seconds = outbound
        .timeout_seconds
        .unwrap_or(DEFAULT_OUTBOUND_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "outbound.timeout_seconds",
            "must be greater than zero",
        ));
    }
    Ok(OutboundSettings {
        timeout: Duration::from_secs(timeout_seconds),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPageCacheSettings {
    enabled: Option<bool>,
    response_limit: Option<usize>,
    response_body_limit_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServiceSettings {
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidateSettings {
    url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCdnSettings {
    api_token: Option<String>,
    zone_id: Option<String>,
    api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    redis_url: Option<String>,
    stamp_ttl_seconds: Option<u64>,
    connect_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOutboundSettings {
    timeout_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
