#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use donation_server::{config::Config, db::Database, AppState};

pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

impl TestApp {
    pub async fn new() -> Self {
        // A single connection keeps every query on the same in-memory database
        let db = Database::connect("sqlite::memory:", 1)
            .await
            .expect("connect in-memory database");
        db.run_migrations().await.expect("run migrations");

        let config = Config {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
        };

        let router = donation_server::app(AppState {
            db: db.clone(),
            config,
        });

        Self { router, db }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, None).await
    }

    /// Registers a user and returns the new id.
    pub async fn register(&self, name: &str, email: &str, role: &str) -> i64 {
        self.register_with(name, email, role, None).await
    }

    /// Registers a user, optionally on behalf of the bearer of `token`.
    pub async fn register_with(
        &self,
        name: &str,
        email: &str,
        role: &str,
        token: Option<&str>,
    ) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/register",
                Some(json!({ "name": name, "email": email, "password": "secret123", "role": role })),
                token,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["user_id"].as_i64().expect("user_id")
    }

    /// Logs in with the password `register` uses and returns the bearer token.
    pub async fn token_for(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/login",
                json!({ "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.db.pool)
            .await
            .expect("count query")
    }
}
