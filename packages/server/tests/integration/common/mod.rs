use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use serde_json::Value;
use tempfile::TempDir;

use videoclub::config::{
    AppConfig, CatalogConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use videoclub::entity::movie_genre;
use videoclub::state::AppState;
use videoclub::views::HtmlShellRenderer;

pub mod routes {
    pub const MOVIES: &str = "/api/v1/movies";
    pub const GENRES: &str = "/api/v1/genres";
    pub const LEGACY_MOVIES: &str = "/api/peliculas";
    pub const PAGES: &str = "/peliculas";
    pub const PAGE_CREATE: &str = "/peliculas/create";

    pub fn movie(id: i32) -> String {
        format!("/api/v1/movies/{id}")
    }

    pub fn movie_edit(id: i32) -> String {
        format!("/api/v1/movies/{id}/edit")
    }

    pub fn movie_genres(id: i32) -> String {
        format!("/api/v1/movies/{id}/genres")
    }

    pub fn movie_genres_remove(id: i32) -> String {
        format!("/api/v1/movies/{id}/genres/remove")
    }

    pub fn asset(stored_path: &str) -> String {
        format!("/storage/{stored_path}")
    }

    pub fn page(id: i32) -> String {
        format!("/peliculas/{id}")
    }

    pub fn page_edit(id: i32) -> String {
        format!("/peliculas/{id}/edit")
    }

    pub fn page_delete(id: i32) -> String {
        format!("/peliculas/{id}/delete")
    }

    pub fn page_add_genre(id: i32) -> String {
        format!("/peliculas/{id}/add-genre")
    }

    pub fn page_delete_genre(id: i32) -> String {
        format!("/peliculas/{id}/delete-genre")
    }
}

/// Minimal payloads that pass content-type detection.
pub mod samples {
    pub const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF";
    pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    pub const MP4: &[u8] = b"\0\0\0\x18ftypisom\0\0\x02\0";
    pub const WAV: &[u8] = b"RIFF\x24\0\0\0WAVEfmt ";
    pub const MP3: &[u8] = b"ID3\x04\0\0\0\0\0\0";

    /// `header` followed by `tag`, so each movie gets distinct content.
    pub fn tagged(header: &[u8], tag: &str) -> Vec<u8> {
        let mut bytes = header.to_vec();
        bytes.extend_from_slice(tag.as_bytes());
        bytes
    }
}

pub fn file_part(bytes: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(bytes).file_name(file_name.to_string())
}

/// Text fields of a valid movie form.
pub fn text_fields(title: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("year", "1999")
        .text("runtime", "120")
        .text("plot", format!("The plot of {title}."))
        .text("director", "Jane Doe")
}

/// A complete create form whose assets are unique to `title`.
pub fn movie_form(title: &str) -> Form {
    text_fields(title)
        .part("poster", file_part(samples::tagged(samples::JPEG, title), "poster.jpg"))
        .part("banner", file_part(samples::tagged(samples::PNG, title), "banner.png"))
        .part("file", file_part(samples::tagged(samples::MP4, title), "movie.mp4"))
        .part("trailer", file_part(samples::tagged(samples::WAV, title), "trailer.wav"))
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub storage_root: PathBuf,
    _storage_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// `Location` header, if any.
    pub location: Option<String>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}, None).await
    }

    /// Spawn with a tweaked configuration and, optionally, a replacement blob
    /// store.
    pub async fn spawn_with(
        configure: impl FnOnce(&mut AppConfig),
        blob_store: Option<Arc<dyn BlobStore>>,
    ) -> Self {
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
        let storage_root = storage_dir.path().to_path_buf();

        // A single connection keeps every query on the same in-memory database.
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .expect("Failed to open in-memory database");
        videoclub::database::sync_schema(&db)
            .await
            .expect("Failed to sync schema");
        videoclub::seed::seed_genres(&db)
            .await
            .expect("Failed to seed genres");

        let mut config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            storage: StorageConfig {
                root: storage_root.clone(),
                max_blob_size: 16 * 1024 * 1024,
                max_upload_size: 64 * 1024 * 1024,
            },
            catalog: CatalogConfig {
                reclaim_orphaned_assets: true,
                seed_genres: true,
            },
        };
        configure(&mut config);

        let blob_store = match blob_store {
            Some(store) => store,
            None => Arc::new(
                FilesystemBlobStore::new(storage_root.clone(), config.storage.max_blob_size)
                    .await
                    .expect("Failed to create blob store"),
            ),
        };

        let state = AppState {
            db: db.clone(),
            blob_store,
            views: Arc::new(HtmlShellRenderer::default()),
            config,
            asset_lock: Arc::default(),
        };

        let app = videoclub::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            client,
            db,
            storage_root,
            _storage_dir: storage_dir,
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

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(name, value)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, String)]) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("Failed to send form POST request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Create a movie via the API and return the response body.
    pub async fn create_movie(&self, title: &str) -> Value {
        let res = self.post_multipart(routes::MOVIES, movie_form(title)).await;
        assert_eq!(res.status, 201, "create_movie failed: {}", res.text);
        res.body
    }

    /// Ids of the seeded genres, ascending.
    pub async fn genre_ids(&self) -> Vec<i32> {
        let res = self.get(routes::GENRES).await;
        assert_eq!(res.status, 200, "list genres failed: {}", res.text);
        res.body
            .as_array()
            .expect("genre list should be an array")
            .iter()
            .map(|g| g["id"].as_i64().expect("genre should have an id") as i32)
            .collect()
    }

    /// Whether the blob for `stored_path` exists on disk.
    pub fn blob_exists(&self, stored_path: &str) -> bool {
        self.storage_root.join(stored_path).is_file()
    }

    pub async fn link_count(&self, movie_id: i32) -> u64 {
        movie_genre::Entity::find()
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .count(&self.db)
            .await
            .expect("DB query failed")
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            location,
            text,
            body,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    /// The JSON context embedded in a rendered page.
    pub fn view_context(&self) -> Value {
        const OPEN: &str = r#"<script id="view-context" type="application/json">"#;
        let start = self
            .text
            .find(OPEN)
            .expect("page should embed a view context")
            + OPEN.len();
        let end = start
            + self.text[start..]
                .find("</script>")
                .expect("view context should be closed");
        serde_json::from_str(&self.text[start..end]).expect("view context should be JSON")
    }
}
