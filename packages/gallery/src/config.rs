use std::path::PathBuf;

use common::MediaKind;
use config::{Config, ConfigError, Environment, File};
use rand::Rng;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL guests should open. Derived from request headers when unset.
    pub base_url: Option<String>,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub session_secret: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
}

impl StorageConfig {
    /// Root for scratch directories used by archive export.
    pub fn tmp_dir(&self) -> PathBuf {
        self.data_dir.join("tmp")
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Quota and size ceilings for one media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindLimits {
    pub per_person: u64,
    pub total: u64,
    pub max_file_size_mb: u64,
    /// Files accepted in one upload request; admission truncates anything
    /// above the quota.
    pub max_files_per_request: u64,
}

impl KindLimits {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_files(&self) -> usize {
        usize::try_from(self.max_files_per_request).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitsConfig {
    pub photos: KindLimits,
    pub videos: KindLimits,
}

impl LimitsConfig {
    pub fn for_kind(&self, kind: MediaKind) -> &KindLimits {
        match kind {
            MediaKind::Photo => &self.photos,
            MediaKind::Video => &self.videos,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            photos: KindLimits {
                per_person: DEFAULT_PHOTOS_PER_PERSON,
                total: DEFAULT_PHOTOS_TOTAL,
                max_file_size_mb: DEFAULT_PHOTO_MAX_MB,
                max_files_per_request: DEFAULT_PHOTOS_PER_REQUEST,
            },
            videos: KindLimits {
                per_person: DEFAULT_VIDEOS_PER_PERSON,
                total: DEFAULT_VIDEOS_TOTAL,
                max_file_size_mb: DEFAULT_VIDEO_MAX_MB,
                max_files_per_request: DEFAULT_VIDEOS_PER_REQUEST,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub limits: LimitsConfig,
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PHOTOS_PER_PERSON: u64 = 20;
const DEFAULT_PHOTOS_TOTAL: u64 = 500;
const DEFAULT_PHOTO_MAX_MB: u64 = 25;
const DEFAULT_PHOTOS_PER_REQUEST: u64 = 40;
const DEFAULT_VIDEOS_PER_PERSON: u64 = 3;
const DEFAULT_VIDEOS_TOTAL: u64 = 50;
const DEFAULT_VIDEO_MAX_MB: u64 = 200;
const DEFAULT_VIDEOS_PER_REQUEST: u64 = 6;

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("auth.admin_username", "admin")?
            .set_default("auth.admin_password", "admin")?
            .set_default("storage.data_dir", "./data")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., GALLERY__AUTH__ADMIN_PASSWORD)
            .add_source(Environment::with_prefix("GALLERY").separator("__"))
            .build()?;

        let raw: RawConfig = s.try_deserialize()?;
        Ok(raw.resolve())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    storage: RawStorage,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    limits: RawLimits,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    host: Option<String>,
    #[serde(default, deserialize_with = "soft_number")]
    port: Option<u64>,
    base_url: Option<String>,
    static_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuth {
    admin_username: Option<String>,
    admin_password: Option<String>,
    session_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStorage {
    data_dir: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLimits {
    #[serde(default)]
    photos: RawKindLimits,
    #[serde(default)]
    videos: RawKindLimits,
}

#[derive(Debug, Default, Deserialize)]
struct RawKindLimits {
    #[serde(default, deserialize_with = "soft_number")]
    per_person: Option<u64>,
    #[serde(default, deserialize_with = "soft_number")]
    total: Option<u64>,
    #[serde(default, deserialize_with = "soft_number")]
    max_file_size_mb: Option<u64>,
    #[serde(default, deserialize_with = "soft_number")]
    max_files_per_request: Option<u64>,
}

impl RawKindLimits {
    fn resolve(self, defaults: KindLimits) -> KindLimits {
        KindLimits {
            per_person: self.per_person.unwrap_or(defaults.per_person),
            total: self.total.unwrap_or(defaults.total),
            max_file_size_mb: self.max_file_size_mb.unwrap_or(defaults.max_file_size_mb),
            max_files_per_request: self
                .max_files_per_request
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_files_per_request),
        }
    }
}

impl RawConfig {
    fn resolve(self) -> AppConfig {
        let data_dir = self
            .storage
            .data_dir
            .unwrap_or_else(|| PathBuf::from("./data"));
        let upload_dir = self
            .storage
            .upload_dir
            .unwrap_or_else(|| data_dir.join("uploads"));
        let database_url = non_empty(self.database.url).unwrap_or_else(|| {
            format!("sqlite://{}?mode=rwc", data_dir.join("gallery.db").display())
        });

        let port = self
            .server
            .port
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(DEFAULT_PORT);

        let session_secret = non_empty(self.auth.session_secret).unwrap_or_else(|| {
            tracing::warn!(
                "No session secret configured; generated a random one. Admin sessions will not survive a restart"
            );
            random_secret()
        });

        let defaults = LimitsConfig::default();

        AppConfig {
            server: ServerConfig {
                host: non_empty(self.server.host).unwrap_or_else(|| "0.0.0.0".into()),
                port,
                base_url: non_empty(self.server.base_url)
                    .map(|url| url.trim_end_matches('/').to_string()),
                static_dir: self
                    .server
                    .static_dir
                    .unwrap_or_else(|| PathBuf::from("./static")),
            },
            auth: AuthConfig {
                admin_username: non_empty(self.auth.admin_username)
                    .unwrap_or_else(|| "admin".into()),
                admin_password: non_empty(self.auth.admin_password)
                    .unwrap_or_else(|| "admin".into()),
                session_secret,
            },
            storage: StorageConfig {
                data_dir,
                upload_dir,
            },
            database: DatabaseConfig { url: database_url },
            limits: LimitsConfig {
                photos: self.limits.photos.resolve(defaults.photos),
                videos: self.limits.videos.resolve(defaults.videos),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Accepts numbers and numeric strings. Anything else is treated as unset so
/// the caller falls back to its default instead of refusing to start.
fn soft_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(u64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Some(n),
        NumberOrText::Text(text) => match text.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::warn!(value = %text, "Ignoring non-numeric setting, using default");
                None
            }
        },
        NumberOrText::Other(_) => {
            tracing::warn!("Ignoring non-numeric setting, using default");
            None
        }
    })
}
