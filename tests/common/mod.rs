// tests/common/mod.rs

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use dropverse::{config::Config, routes, state::AppState, utils::jwt::sign_jwt};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::time::Duration;

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
    // Keeps the database file alive for file-backed apps.
    _db_dir: Option<tempfile::TempDir>,
}

/// Spawns the app on a random port, backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // A single connection that never recycles, so every query sees the same
    // in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    serve(pool, None).await
}

/// Spawns the app on a temporary database file shared by several
/// connections, so concurrent requests really run side by side.
pub async fn spawn_app_on_file() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("dropverse.db"))
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open database file");

    serve(pool, Some(dir)).await
}

async fn serve(pool: SqlitePool, db_dir: Option<tempfile::TempDir>) -> TestApp {
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        server_port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        log_dir: "logs".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
        _db_dir: db_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn token_for(&self, user_id: i64) -> String {
        sign_jwt(user_id, TEST_SECRET, 600).unwrap()
    }

    pub async fn insert_user(&self, username: &str) -> i64 {
        self.insert_user_with_points(username, 0).await
    }

    pub async fn insert_user_with_points(&self, username: &str, points: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (nome, username, email, password, points, created_at)
            VALUES (?, ?, ?, 'not-a-hash', ?, ?)
            RETURNING id
            "#,
        )
        .bind(format!("Name {}", username))
        .bind(username)
        .bind(format!("{}@example.com", username))
        .bind(points)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn insert_product(&self, author_id: i64, title: &str, price: f64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO posts (author_id, kind, title, price, file_path, created_at)
            VALUES (?, 'product', ?, ?, '/files/item.zip', ?)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(title)
        .bind(price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn insert_social(&self, author_id: i64, content: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO posts (author_id, kind, content, created_at)
            VALUES (?, 'social', ?, ?)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn insert_purchase_at(
        &self,
        buyer_id: i64,
        post_id: i64,
        price_paid: f64,
        at: DateTime<Utc>,
    ) {
        sqlx::query(
            "INSERT INTO purchases (buyer_id, post_id, price_paid, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(buyer_id)
        .bind(post_id)
        .bind(price_paid)
        .bind(at)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> (u16, serde_json::Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.expect("Failed to execute request");
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(serde_json::Value::Null))
    }

    pub async fn post_authed(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn insert_like_at(&self, user_id: i64, post_id: i64, at: DateTime<Utc>) {
        sqlx::query("INSERT INTO post_likes (user_id, post_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(post_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    /// Sends the same authenticated POST `times` times at once and returns
    /// the status codes.
    pub async fn post_concurrently(&self, path: &str, token: &str, times: usize) -> Vec<u16> {
        let url = self.url(path);
        let mut handles = Vec::new();
        for _ in 0..times {
            let client = self.client.clone();
            let url = url.clone();
            let token = token.to_string();
            handles.push(tokio::spawn(async move {
                client
                    .post(url)
                    .bearer_auth(token)
                    .send()
                    .await
                    .unwrap()
                    .status()
                    .as_u16()
            }));
        }

        let mut statuses = Vec::new();
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }
        statuses
    }
}
