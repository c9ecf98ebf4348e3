use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde_json::Value;
use tempfile::TempDir;

use common::MediaKind;
use common::storage::FilesystemMediaStore;
use gallery::config::{
    AppConfig, AuthConfig, DatabaseConfig, KindLimits, LimitsConfig, ServerConfig, StorageConfig,
};
use gallery::entity::{media, uploader};
use gallery::services::export::{Compressor, ZipCompressor};
use gallery::state::AppState;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-password";

pub mod routes {
    pub const INDEX: &str = "/";
    pub const QR: &str = "/qr.svg";
    pub const HEALTH: &str = "/health";
    pub const LOGIN: &str = "/admin/login";
    pub const LOGOUT: &str = "/admin/logout";
    pub const ADMIN: &str = "/admin";

    pub fn upload(kind: &str) -> String {
        format!("/upload/{kind}")
    }

    pub fn item(kind: &str, id: impl std::fmt::Display) -> String {
        format!("/admin/{kind}/{id}")
    }

    pub fn delete_item(kind: &str, id: impl std::fmt::Display) -> String {
        format!("/admin/{kind}/{id}/delete")
    }

    pub fn delete_all(kind: &str) -> String {
        format!("/admin/{kind}/delete-all")
    }

    pub fn download(kind: &str) -> String {
        format!("/admin/{kind}/download")
    }
}

/// One file part of an upload form.
pub struct TestFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl TestFile {
    pub fn new(name: &str, mime: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn photo(name: &str) -> Self {
        Self::new(name, "image/jpeg", format!("jpeg bytes of {name}"))
    }

    pub fn video(name: &str) -> Self {
        Self::new(name, "video/mp4", format!("mp4 bytes of {name}"))
    }
}

/// A compressor that always fails, for exercising export cleanup.
pub struct FailingCompressor;

impl Compressor for FailingCompressor {
    fn compress_dir(
        &self,
        _src: &Path,
        dest: &Path,
    ) -> Result<(), gallery::services::export::ArchiveError> {
        // Leave a partial file behind to prove it gets cleaned up.
        std::fs::write(dest, b"partial")?;
        Err(gallery::services::export::ArchiveError::Other(
            "simulated failure".into(),
        ))
    }
}

/// A running test server backed by its own SQLite file and upload directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub config: AppConfig,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

pub fn test_limits(photos: KindLimits, videos: KindLimits) -> LimitsConfig {
    LimitsConfig { photos, videos }
}

pub fn kind_limits(
    per_person: u64,
    total: u64,
    max_file_size_mb: u64,
    max_files_per_request: u64,
) -> KindLimits {
    KindLimits {
        per_person,
        total,
        max_file_size_mb,
        max_files_per_request,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(LimitsConfig::default(), Arc::new(ZipCompressor)).await
    }

    pub async fn spawn_with_limits(limits: LimitsConfig) -> Self {
        Self::spawn_with(limits, Arc::new(ZipCompressor)).await
    }

    pub async fn spawn_with(limits: LimitsConfig, compressor: Arc<dyn Compressor>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: None,
                static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
            },
            auth: AuthConfig {
                admin_username: ADMIN_USERNAME.to_string(),
                admin_password: ADMIN_PASSWORD.to_string(),
                session_secret: "test-secret-for-integration-tests".to_string(),
            },
            storage: StorageConfig {
                upload_dir: data_dir.join("uploads"),
                data_dir: data_dir.clone(),
            },
            database: DatabaseConfig {
                url: format!(
                    "sqlite://{}?mode=rwc",
                    data_dir.join("gallery.db").display()
                ),
            },
            limits,
        };

        let db = gallery::database::init_db(&config.database.url)
            .await
            .expect("Failed to initialize test database");
        let store = FilesystemMediaStore::new(config.storage.upload_dir.clone())
            .await
            .expect("Failed to create upload directories");

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            store: Arc::new(store),
            compressor,
        };

        let app = gallery::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            client,
            db,
            config,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// GET returning the raw body, for binary downloads.
    pub async fn get_bytes(&self, path: &str) -> (u16, HeaderMap, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, headers, bytes)
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("Failed to send form POST request");

        TestResponse::from_response(res).await
    }

    /// Submit the upload form for `kind` (`photos` or `videos`).
    pub async fn upload(&self, kind: &str, name: &str, files: Vec<TestFile>) -> TestResponse {
        let mut form = Form::new().text("name", name.to_string());
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.mime)
                .expect("Failed to set MIME type");
            form = form.part("files", part);
        }

        let res = self
            .client
            .post(self.url(&routes::upload(kind)))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Log in as the admin; the session cookie stays in the client.
    pub async fn login(&self) {
        let res = self
            .post_form(
                routes::LOGIN,
                &[("username", ADMIN_USERNAME), ("password", ADMIN_PASSWORD)],
            )
            .await;
        assert_eq!(res.status, 303, "Login failed: {}", res.text);
        assert_eq!(res.location().as_deref(), Some(routes::ADMIN));
    }

    pub fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        self.config.storage.upload_dir.join(kind.plural())
    }

    /// Number of files currently stored for `kind`.
    pub fn files_on_disk(&self, kind: MediaKind) -> usize {
        std::fs::read_dir(self.kind_dir(kind))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Number of entries in the export scratch root.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.config.storage.tmp_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Poll until the export scratch root is empty.
    ///
    /// The archive directory is removed when the server drops the response
    /// body, which can trail the client seeing the last byte.
    pub async fn wait_for_empty_scratch(&self) -> bool {
        for _ in 0..50 {
            if self.scratch_entries() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    pub async fn media(&self, kind: MediaKind) -> Vec<media::Model> {
        media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .order_by_asc(media::Column::Id)
            .all(&self.db)
            .await
            .expect("Failed to query media")
    }

    pub async fn uploader_count(&self) -> u64 {
        uploader::Entity::find()
            .count(&self.db)
            .await
            .expect("Failed to count uploaders")
    }

    pub async fn uploaders(&self) -> Vec<uploader::Model> {
        uploader::Entity::find()
            .order_by_asc(uploader::Column::Id)
            .all(&self.db)
            .await
            .expect("Failed to query uploaders")
    }

    /// Remove a stored file behind the application's back.
    pub fn remove_stored_file(&self, kind: MediaKind, record: &media::Model) {
        std::fs::remove_file(self.kind_dir(kind).join(&record.stored_name))
            .expect("Failed to remove stored file");
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Redirect target without the query string.
    pub fn location(&self) -> Option<String> {
        self.header("location")
            .map(|loc| loc.split('?').next().unwrap_or_default().to_string())
    }

    fn flash(&self, key: &str) -> Option<String> {
        let location = self.header("location")?;
        let url = reqwest::Url::parse(&format!("http://localhost{location}")).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Success flash carried by a redirect.
    pub fn message(&self) -> Option<String> {
        self.flash("message")
    }

    /// Error flash carried by a redirect.
    pub fn error(&self) -> Option<String> {
        self.flash("error")
    }
}
