use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Upper bound AWS accepts for `X-Amz-Expires`.
pub const MAX_SIGNED_URL_EXPIRATION_SECS: u64 = 604_800;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub attachments: AttachmentsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Which task store backs the service.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Postgres,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(anyhow!("unknown storage.backend `{other}` (expected file or postgres)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_todos_file")]
    pub file_path: PathBuf,
}

fn default_todos_file() -> PathBuf { PathBuf::from("data/todos.json") }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::File, file_path: default_todos_file() }
    }
}

/// Bucket location and URL lifetime. Credentials come from the AWS SDK
/// default chain (env, profile, SSO, web identity, IMDS), never from here.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3-compatible endpoint (MinIO, localstack); switches to path-style URLs.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_url_expiration")]
    pub url_expiration_secs: u64,
}

fn default_region() -> String { "us-east-1".into() }
fn default_url_expiration() -> u64 { 300 }

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            url_expiration_secs: default_url_expiration(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwks_url: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
    #[serde(default = "default_jwks_timeout")]
    pub jwks_timeout_secs: u64,
}

fn default_leeway() -> u64 { 60 }
fn default_jwks_timeout() -> u64 { 10 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks_url: String::new(),
            issuer: None,
            audience: None,
            leeway_secs: default_leeway(),
            jwks_timeout_secs: default_jwks_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String { "compact".into() }

impl Default for LoggingConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file is absent, then apply env overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())?;
        self.validate()
    }

    /// Overlay environment values. `lookup` is injected so tests need not touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| anyhow!("SERVER_PORT is not a valid port: {port}"))?;
        }
        if let Some(w) = get("TOKIO_WORKER_THREADS").and_then(|v| v.parse().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(url) = get("DATABASE_URL") {
            if self.database.url.trim().is_empty() {
                self.database.url = url;
            }
        }
        if let Some(backend) = get("TODOS_STORE") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(path) = get("TODOS_FILE") {
            self.storage.file_path = PathBuf::from(path);
        }
        if let Some(bucket) = get("ATTACHMENTS_BUCKET") {
            self.attachments.bucket = bucket;
        }
        if let Some(region) = get("ATTACHMENTS_REGION").or_else(|| get("AWS_REGION")) {
            self.attachments.region = region;
        }
        if let Some(endpoint) = get("ATTACHMENTS_ENDPOINT") {
            self.attachments.endpoint = Some(endpoint);
        }
        if let Some(exp) = get("SIGNED_URL_EXPIRATION") {
            self.attachments.url_expiration_secs = exp
                .parse()
                .map_err(|_| anyhow!("SIGNED_URL_EXPIRATION must be a number of seconds: {exp}"))?;
        }
        if let Some(url) = get("JWKS_URL") {
            self.auth.jwks_url = url;
        }
        if let Some(iss) = get("AUTH_ISSUER") {
            self.auth.issuer = Some(iss);
        }
        if let Some(aud) = get("AUTH_AUDIENCE") {
            self.auth.audience = Some(aud);
        }
        if let Some(fmt) = get("LOG_FORMAT") {
            self.logging.format = fmt;
        }
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        if self.storage.backend == StoreBackend::Postgres {
            self.database.validate()?;
        }
        self.attachments.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AttachmentsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(anyhow!("attachments.bucket is empty; set it in config.toml or ATTACHMENTS_BUCKET"));
        }
        if self.region.trim().is_empty() {
            return Err(anyhow!("attachments.region must not be empty"));
        }
        if self.url_expiration_secs == 0 || self.url_expiration_secs > MAX_SIGNED_URL_EXPIRATION_SECS {
            return Err(anyhow!(
                "attachments.url_expiration_secs must be in 1..={MAX_SIGNED_URL_EXPIRATION_SECS}"
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(anyhow!("attachments.endpoint must start with http(s)"));
            }
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwks_url.trim().is_empty() {
            return Err(anyhow!("auth.jwks_url is empty; set it in config.toml or JWKS_URL"));
        }
        if !(self.jwks_url.starts_with("http://") || self.jwks_url.starts_with("https://")) {
            return Err(anyhow!("auth.jwks_url must start with http(s)"));
        }
        if self.jwks_timeout_secs == 0 {
            return Err(anyhow!("auth.jwks_timeout_secs must be positive"));
        }
        Ok(())
    }
}
