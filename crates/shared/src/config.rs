//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Blob storage backend configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Media conversion defaults.
    #[serde(default)]
    pub media: MediaSettings,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Raw storage backend settings as read from config files or the environment.
///
/// The `provider` selector decides which of the remaining fields matter:
/// `local` uses `path` and `base_url`; `s3` uses the key pair, `endpoint`,
/// `bucket` and `region`; `r2` uses the key pair, `account_id`,
/// `bucket`, `base_url` and `cdn`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend selector: `local`, `s3` or `r2`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Filesystem root for the local backend (relative paths resolve against the cwd).
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Public URL prefix for stored objects.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Access key id.
    #[serde(default)]
    pub api_key: String,
    /// Secret access key.
    #[serde(default)]
    pub api_secret: String,
    /// Object store endpoint (S3 only).
    #[serde(default)]
    pub endpoint: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// CDN prefix, preferred over `base_url` on R2.
    #[serde(default)]
    pub cdn: String,
    /// Region (S3 only).
    #[serde(default)]
    pub region: String,
    /// Cloudflare account id (R2 only).
    #[serde(default)]
    pub account_id: String,
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_storage_path() -> String {
    "storage".to_string()
}

fn default_base_url() -> String {
    "/storage".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            path: default_storage_path(),
            base_url: default_base_url(),
            api_key: String::new(),
            api_secret: String::new(),
            endpoint: String::new(),
            bucket: String::new(),
            cdn: String::new(),
            region: String::new(),
            account_id: String::new(),
        }
    }
}

/// Default converter parameters, overridable at runtime through settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// WebP quality (0-100).
    #[serde(default = "default_webp_quality")]
    pub webp_quality: i64,
    /// VP9 constant rate factor (0-51, lower is better).
    #[serde(default = "default_video_crf")]
    pub video_crf: i64,
    /// Opus bitrate in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: i64,
    /// Encoder binary looked up on `PATH`.
    #[serde(default = "default_encoder")]
    pub encoder: String,
}

fn default_webp_quality() -> i64 {
    85
}

fn default_video_crf() -> i64 {
    23
}

fn default_audio_bitrate() -> i64 {
    96
}

fn default_encoder() -> String {
    "ffmpeg".to_string()
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            webp_quality: default_webp_quality(),
            video_crf: default_video_crf(),
            audio_bitrate: default_audio_bitrate(),
            encoder: default_encoder(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Environment variables use the `STOWAGE__` prefix with `__` as the
    /// nesting separator, e.g. `STOWAGE__STORAGE__BUCKET`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("STOWAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
